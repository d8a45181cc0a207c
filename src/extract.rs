//! Text extraction for uploaded policy files.
//!
//! PDFs yield one segment per page so chunks keep their page number;
//! DOCX, Markdown and plain text yield a single unpaged segment.

use std::io::Read;

use policy_harness_core::models::PageText;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extraction error; the upload is rejected and nothing is indexed.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
}

/// Supported upload formats, identified by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
    Markdown,
    Text,
}

impl FileKind {
    /// Classify a file by its extension (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Result<Self, ExtractError> {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(FileKind::Pdf),
            "docx" => Ok(FileKind::Docx),
            "md" | "markdown" => Ok(FileKind::Markdown),
            "txt" => Ok(FileKind::Text),
            "" => Err(ExtractError::UnsupportedType(file_name.to_string())),
            other => Err(ExtractError::UnsupportedType(other.to_string())),
        }
    }

    /// Short name stored as the document's `file_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Markdown => "md",
            FileKind::Text => "txt",
        }
    }
}

/// Extract text segments from file bytes.
pub fn extract_pages(bytes: &[u8], kind: FileKind) -> Result<Vec<PageText>, ExtractError> {
    match kind {
        FileKind::Pdf => extract_pdf_pages(bytes),
        FileKind::Docx => Ok(vec![PageText {
            page_number: None,
            text: extract_docx(bytes)?,
        }]),
        FileKind::Markdown | FileKind::Text => Ok(vec![PageText {
            page_number: None,
            text: String::from_utf8_lossy(bytes).into_owned(),
        }]),
    }
}

fn extract_pdf_pages(bytes: &[u8]) -> Result<Vec<PageText>, ExtractError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| PageText {
            page_number: Some(i as i64 + 1),
            text,
        })
        .collect())
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| ExtractError::Docx("word/document.xml not found".to_string()))?;

    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Docx(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }
    extract_paragraphs(&doc_xml)
}

/// Collect `<w:t>` runs, one line per `<w:p>` paragraph.
fn extract_paragraphs(xml: &[u8]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(te)) if in_text => {
                out.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
            body
        );
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn test_file_kind_from_name() {
        assert_eq!(FileKind::from_file_name("Leave.PDF").unwrap(), FileKind::Pdf);
        assert_eq!(FileKind::from_file_name("handbook.docx").unwrap(), FileKind::Docx);
        assert_eq!(FileKind::from_file_name("notes.md").unwrap(), FileKind::Markdown);
        assert_eq!(FileKind::from_file_name("notes.txt").unwrap(), FileKind::Text);
        assert!(matches!(
            FileKind::from_file_name("sheet.xlsx"),
            Err(ExtractError::UnsupportedType(_))
        ));
        assert!(FileKind::from_file_name("README").is_err());
    }

    #[test]
    fn test_plain_text_single_segment() {
        let pages = extract_pages(b"Remote work policy.", FileKind::Text).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_number, None);
        assert_eq!(pages[0].text, "Remote work policy.");
    }

    #[test]
    fn test_docx_paragraphs() {
        let bytes = docx_with_paragraphs(&["Annual leave policy", "Staff receive 20 days &amp; more."]);
        let pages = extract_pages(&bytes, FileKind::Docx).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].text, "Annual leave policy\nStaff receive 20 days & more.\n");
    }

    #[test]
    fn test_invalid_pdf_returns_error() {
        let err = extract_pages(b"not a pdf", FileKind::Pdf).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn test_invalid_zip_returns_error_for_docx() {
        let err = extract_pages(b"not a zip", FileKind::Docx).unwrap_err();
        assert!(matches!(err, ExtractError::Docx(_)));
    }
}
