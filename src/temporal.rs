//! Temporal intent analysis for natural-language questions.
//!
//! Decides which document versions a question is about before retrieval:
//!
//! 1. An explicit year (`2022`) or fiscal year (`FY 2022-23`) earlier than
//!    the current year selects that year's versions; the current or a
//!    future year means the latest versions.
//! 2. Otherwise, a historical keyword ("previous", "old", "last year", ...)
//!    without a year cannot be resolved and asks the user to clarify.
//! 3. Everything else uses the latest versions.

use chrono::Datelike;
use regex::Regex;
use tracing::debug;

use policy_harness_core::models::TemporalIntent;

/// Question shown to the user when a historical question has no year.
pub const CLARIFICATION_QUESTION: &str =
    "Your question refers to a previous policy. Which year or version are you asking about?";

/// Compiled question patterns. Build once and reuse.
pub struct TemporalAnalyzer {
    year: Regex,
    historical: Regex,
}

impl TemporalAnalyzer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            year: Regex::new(r"(?i)\b(20\d{2})\b|\b(FY\s*20\d{2}[-–]?\d{0,2})\b")?,
            historical: Regex::new(
                r"(?i)\b(previous|old|older|earlier|before|past|last year|historic|historical|former|prior|in 20\d{2})\b",
            )?,
        })
    }

    /// Classify `question` relative to `current_year`.
    pub fn analyze_question(&self, question: &str, current_year: i32) -> TemporalIntent {
        let question = question.trim();
        if question.is_empty() {
            return TemporalIntent::Latest;
        }

        if let Some(caps) = self.year.captures(question) {
            let year = caps
                .get(1)
                .or_else(|| caps.get(2))
                .and_then(|m| leading_year(m.as_str()));
            if let Some(year) = year {
                debug!(year, current_year, "explicit year in question");
                return if year < current_year {
                    TemporalIntent::SpecificYear(year)
                } else {
                    TemporalIntent::Latest
                };
            }
        }

        if let Some(m) = self.historical.find(question) {
            debug!(keyword = m.as_str(), "historical keyword without a year");
            return TemporalIntent::NeedsClarification {
                reason: CLARIFICATION_QUESTION.to_string(),
            };
        }

        TemporalIntent::Latest
    }

    /// [`analyze_question`](Self::analyze_question) against today's UTC year.
    pub fn analyze_question_now(&self, question: &str) -> TemporalIntent {
        self.analyze_question(question, chrono::Utc::now().year())
    }
}

/// First four digits of a year or fiscal-year match (`"FY 2023-24"` → 2023).
fn leading_year(s: &str) -> Option<i32> {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).take(4).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i32 = 2025;

    fn analyze_question(question: &str, current_year: i32) -> TemporalIntent {
        TemporalAnalyzer::new().unwrap().analyze_question(question, current_year)
    }

    #[test]
    fn test_blank_is_latest() {
        assert_eq!(analyze_question("", NOW), TemporalIntent::Latest);
        assert_eq!(analyze_question("   ", NOW), TemporalIntent::Latest);
    }

    #[test]
    fn test_explicit_past_year() {
        assert_eq!(
            analyze_question("What was the travel policy in 2022?", NOW),
            TemporalIntent::SpecificYear(2022)
        );
    }

    #[test]
    fn test_fiscal_year() {
        assert_eq!(
            analyze_question("What is the bonus policy for FY 2023-24?", NOW),
            TemporalIntent::SpecificYear(2023)
        );
        assert_eq!(
            analyze_question("fy2021 leave rules", NOW),
            TemporalIntent::SpecificYear(2021)
        );
    }

    #[test]
    fn test_current_or_future_year_is_latest() {
        assert_eq!(analyze_question("Leave policy in 2025", NOW), TemporalIntent::Latest);
        assert_eq!(analyze_question("Leave policy for 2030", NOW), TemporalIntent::Latest);
    }

    #[test]
    fn test_historical_keyword_needs_clarification() {
        for q in [
            "What was the previous policy?",
            "Show me the old policy",
            "What was the historical policy?",
            "What was the policy last year?",
        ] {
            let intent = analyze_question(q, NOW);
            assert_eq!(
                intent,
                TemporalIntent::NeedsClarification {
                    reason: CLARIFICATION_QUESTION.to_string()
                },
                "question: {}",
                q
            );
        }
    }

    #[test]
    fn test_keyword_inside_word_ignored() {
        // "bold" and "golden" contain "old" but are not historical keywords.
        assert_eq!(analyze_question("golden rules in bold", NOW), TemporalIntent::Latest);
    }

    #[test]
    fn test_default_latest() {
        assert_eq!(analyze_question("What is the WFH policy?", NOW), TemporalIntent::Latest);
        assert_eq!(analyze_question("Show me the latest policy", NOW), TemporalIntent::Latest);
    }
}
