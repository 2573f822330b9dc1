//! Extraction collaborator: raw text out of an uploaded PDF or DOCX.
//!
//! Both formats are read from memory. The work is CPU-bound and runs on the
//! blocking pool.

use std::io::{Cursor, Read};

use async_trait::async_trait;
use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file format. Please upload PDF or DOCX.")]
    UnsupportedFormat,

    #[error("Error extracting text from PDF: {0}")]
    Pdf(String),

    #[error("Error extracting text from DOCX: {0}")]
    Docx(String),

    #[error("Failed to extract text from resume.")]
    NoText,

    #[error("Extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Chosen by file extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".pdf") {
            Some(Self::Pdf)
        } else if lower.ends_with(".docx") {
            Some(Self::Docx)
        } else {
            None
        }
    }
}

/// An uploaded file held in memory for the life of a session.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub filename: String,
    pub bytes: Bytes,
}

impl SourceDocument {
    pub fn new(filename: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// `name:size`. A change in signature means a different upload.
    pub fn signature(&self) -> String {
        format!("{}:{}", self.filename, self.bytes.len())
    }

    pub fn format(&self) -> Option<DocumentFormat> {
        DocumentFormat::from_filename(&self.filename)
    }
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, document: &SourceDocument) -> Result<String, ExtractionError>;
}

/// Default extractor: `pdf-extract` for PDF, the DOCX body XML for Word files.
pub struct LocalExtractor;

#[async_trait]
impl TextExtractor for LocalExtractor {
    async fn extract(&self, document: &SourceDocument) -> Result<String, ExtractionError> {
        let format = document.format().ok_or(ExtractionError::UnsupportedFormat)?;
        let bytes = document.bytes.clone();

        let text = tokio::task::spawn_blocking(move || match format {
            DocumentFormat::Pdf => pdf_extract::extract_text_from_mem(&bytes)
                .map_err(|e| ExtractionError::Pdf(e.to_string())),
            DocumentFormat::Docx => docx_text(&bytes),
        })
        .await??;

        if text.trim().is_empty() {
            return Err(ExtractionError::NoText);
        }
        info!(
            filename = %document.filename,
            chars = text.chars().count(),
            "Text extracted"
        );
        Ok(text)
    }
}

const DOCX_BODY: &str = "word/document.xml";

/// Paragraph text of a DOCX file, one paragraph per line.
pub fn docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Docx(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(|e| ExtractionError::Docx(e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Docx(e.to_string()))?;
    paragraphs_from_xml(&xml)
}

fn paragraphs_from_xml(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false); // spaces inside runs are significant
    let mut buf = Vec::new();

    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if e.name().as_ref() == b"w:t" {
                    in_text = true;
                }
            }
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                let text = e
                    .decode()
                    .map_err(|err| ExtractionError::Docx(err.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::GeneralRef(ref e)) if in_text => {
                match e
                    .resolve_char_ref()
                    .map_err(|err| ExtractionError::Docx(err.to_string()))?
                {
                    Some(c) => out.push(c),
                    None => {
                        let name = e
                            .decode()
                            .map_err(|err| ExtractionError::Docx(err.to_string()))?;
                        out.push_str(predefined_entity(&name));
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractionError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

fn predefined_entity(name: &str) -> &'static str {
    match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx(body: &str) -> Bytes {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut cursor);
            zip.start_file(DOCX_BODY, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(body.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        Bytes::from(cursor.into_inner())
    }

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t>Ada Lovelace</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">Analyst </w:t></w:r><w:r><w:t>&amp; Writer</w:t></w:r></w:p>
<w:p><w:r><w:t>1842</w:t><w:tab/><w:t>London</w:t></w:r></w:p>
</w:body></w:document>"#;

    #[test]
    fn test_format_from_filename() {
        assert_eq!(DocumentFormat::from_filename("CV.PDF"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_filename("cv.docx"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_filename("cv.doc"), None);
        assert_eq!(DocumentFormat::from_filename("notes.txt"), None);
    }

    #[test]
    fn test_signature_is_name_and_size() {
        let doc = SourceDocument::new("cv.pdf", Bytes::from_static(b"12345"));
        assert_eq!(doc.signature(), "cv.pdf:5");
    }

    #[test]
    fn test_docx_paragraphs_become_lines() {
        let text = docx_text(&docx(BODY)).unwrap();
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        assert_eq!(lines, vec!["Ada Lovelace", "Analyst & Writer", "1842\tLondon"]);
    }

    #[test]
    fn test_docx_without_body_is_error() {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut cursor);
            zip.start_file("other.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.finish().unwrap();
        }
        assert!(matches!(
            docx_text(cursor.get_ref()),
            Err(ExtractionError::Docx(_))
        ));
    }

    #[test]
    fn test_not_a_zip_is_error() {
        assert!(docx_text(b"plain text").is_err());
    }

    #[tokio::test]
    async fn test_unsupported_extension_rejected() {
        let doc = SourceDocument::new("resume.txt", Bytes::from_static(b"hello"));
        let err = LocalExtractor.extract(&doc).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported file format. Please upload PDF or DOCX."
        );
    }

    #[tokio::test]
    async fn test_extracts_docx_through_trait() {
        let doc = SourceDocument::new("resume.docx", docx(BODY));
        let text = LocalExtractor.extract(&doc).await.unwrap();
        assert!(text.contains("Ada Lovelace"));
    }

    #[tokio::test]
    async fn test_empty_docx_is_no_text() {
        let body = r#"<w:document xmlns:w="x"><w:body><w:p/></w:body></w:document>"#;
        let doc = SourceDocument::new("empty.docx", docx(body));
        assert!(matches!(
            LocalExtractor.extract(&doc).await,
            Err(ExtractionError::NoText)
        ));
    }
}
