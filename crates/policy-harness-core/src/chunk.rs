//! Sliding-window text chunker with sentence/word boundary alignment.
//!
//! Splits extracted document text into overlapping [`ChunkDraft`]s. The
//! chunker is a pure function: it holds no state between calls and
//! numbers its output from a caller-supplied `starting_index`, so a
//! multi-page document can be chunked page by page while keeping one
//! dense, document-wide index sequence.
//!
//! # Algorithm
//!
//! 1. Take a window of `chunk_size` bytes starting at the cursor.
//! 2. If the window does not reach the end of the text, pull its end back
//!    to just past the last `.` (when that period lies within
//!    `boundary_window` bytes of the end), otherwise to just past the last
//!    space, otherwise cut hard.
//! 3. Trim the window; keep it if it has at least `min_chunk_chars`
//!    characters.
//! 4. Move the cursor to `end - chunk_overlap`, or to `end` when the
//!    overlap would not move it forward.
//!
//! Every cut is snapped to a UTF-8 character boundary.
//!
//! # Example
//!
//! ```rust
//! use policy_harness_core::chunk::{chunk_text, ChunkingParams};
//!
//! let drafts = chunk_text("Remote work is allowed two days a week.", Some(3), 10, &ChunkingParams::default());
//! assert_eq!(drafts.len(), 1);
//! assert_eq!(drafts[0].chunk_index, 10);
//! assert_eq!(drafts[0].page_number, Some(3));
//! ```

use tracing::{debug, error, trace};

use crate::error::{Error, Result};
use crate::models::ChunkDraft;

/// Chunker tuning parameters.
#[derive(Debug, Clone)]
pub struct ChunkingParams {
    /// Window size in bytes.
    pub chunk_size: usize,
    /// Bytes shared between consecutive windows. Must be `< chunk_size`.
    pub chunk_overlap: usize,
    /// Trimmed windows shorter than this (in characters) are discarded.
    pub min_chunk_chars: usize,
    /// How far back from the window end a period may sit and still be used
    /// as the cut point.
    pub boundary_window: usize,
}

impl Default for ChunkingParams {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
            min_chunk_chars: 5,
            boundary_window: 100,
        }
    }
}

impl ChunkingParams {
    /// Check the forward-progress invariant.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be > 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Split `text` into overlapping drafts numbered from `starting_index`.
///
/// Empty or whitespace-only input yields an empty vector. A stalled cursor
/// or an exhausted iteration budget is logged and ends the loop early,
/// returning the drafts produced so far.
pub fn chunk_text(
    text: &str,
    page_number: Option<i64>,
    starting_index: i64,
    params: &ChunkingParams,
) -> Vec<ChunkDraft> {
    chunk_text_counted(text, page_number, starting_index, params).0
}

/// [`chunk_text`] plus the number of window iterations it took.
pub(crate) fn chunk_text_counted(
    text: &str,
    page_number: Option<i64>,
    starting_index: i64,
    params: &ChunkingParams,
) -> (Vec<ChunkDraft>, usize) {
    let mut drafts = Vec::new();

    if text.trim().is_empty() {
        debug!(?page_number, "empty text, nothing to chunk");
        return (drafts, 0);
    }

    let len = text.len();
    // The cursor advances at least one byte per iteration.
    let max_iterations = len + 2;
    let mut pos = 0usize;
    let mut previous_pos: Option<usize> = None;
    let mut iterations = 0usize;

    while pos < len {
        iterations += 1;

        if previous_pos == Some(pos) {
            error!(
                pos,
                ?page_number,
                iterations,
                "chunk cursor stalled, aborting page"
            );
            break;
        }
        if iterations > max_iterations {
            error!(max_iterations, ?page_number, "chunk iteration limit exceeded");
            break;
        }
        previous_pos = Some(pos);

        let mut end = snap_to_char_boundary(text, pos.saturating_add(params.chunk_size).min(len));
        if end <= pos {
            end = next_char_boundary(text, pos);
        }
        if end < len {
            end = align_to_boundary(text, pos, end, params.boundary_window);
        }

        let piece = text[pos..end].trim();
        if piece.chars().count() >= params.min_chunk_chars {
            trace!(?page_number, start = pos, end, len = piece.len(), "chunk");
            drafts.push(ChunkDraft {
                chunk_index: starting_index + drafts.len() as i64,
                content: piece.to_string(),
                page_number,
            });
        } else {
            debug!(
                ?page_number,
                start = pos,
                end,
                "skipping short chunk ({} chars)",
                piece.chars().count()
            );
        }

        let next = snap_to_char_boundary(text, end.saturating_sub(params.chunk_overlap));
        pos = if next <= pos { end } else { next };
    }

    debug!(
        ?page_number,
        chunks = drafts.len(),
        iterations,
        "chunking finished"
    );
    (drafts, iterations)
}

/// Pull a window end back to a sentence or word boundary.
///
/// The byte at `end` itself takes part in the search. Both delimiters are
/// ASCII, so one past them is always a char boundary.
fn align_to_boundary(text: &str, pos: usize, end: usize, boundary_window: usize) -> usize {
    let search = &text.as_bytes()[pos..(end + 1).min(text.len())];

    if let Some(period) = search.iter().rposition(|&b| b == b'.').map(|i| pos + i) {
        if period > pos && end.saturating_sub(period) < boundary_window {
            return period + 1;
        }
    }
    if let Some(space) = search.iter().rposition(|&b| b == b' ').map(|i| pos + i) {
        if space > pos {
            return space + 1;
        }
    }
    end
}

/// Snap a byte index back to the nearest valid UTF-8 char boundary.
fn snap_to_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// The first char boundary strictly after `index`.
fn next_char_boundary(s: &str, index: usize) -> usize {
    s[index..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| index + i)
        .unwrap_or(s.len())
}
