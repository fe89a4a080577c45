//! services/api/src/adapters/extract.rs
//!
//! This module contains the text extraction adapter. It implements the
//! `TextExtractionService` port from the `core` crate: PDF text layers via
//! `pdf-extract`, DOCX paragraph text via `zip` + `quick-xml`, plain text
//! via strict UTF-8 decoding, and images via the injected OCR port.

use std::io::Read;
use std::sync::Arc;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;
use veridoc_core::domain::MimeType;
use veridoc_core::ports::{OcrService, PortError, PortResult, TextExtractionService};

/// Resolves a declared MIME string to a supported format, or fails with
/// `UnsupportedFormat` carrying the offending string.
pub fn resolve_mime(mime: &str) -> PortResult<MimeType> {
    MimeType::parse(mime).ok_or_else(|| PortError::UnsupportedFormat(mime.to_string()))
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `TextExtractionService` port. Pure over
/// its inputs apart from the OCR provider call needed for image formats.
#[derive(Clone)]
pub struct DocumentExtractor {
    ocr: Arc<dyn OcrService>,
}

impl DocumentExtractor {
    /// Creates a new `DocumentExtractor`.
    pub fn new(ocr: Arc<dyn OcrService>) -> Self {
        Self { ocr }
    }
}

/// Decodes each page's text layer and joins pages with a newline. No
/// separator guarantee beyond that.
fn extract_pdf(bytes: &[u8]) -> PortResult<String> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| PortError::ExtractionFailed(format!("PDF decode failed: {e}")))?;
    Ok(pages.join("\n"))
}

/// Concatenates paragraph text in document order, one paragraph per line.
/// A DOCX file is a zip archive; the body lives in `word/document.xml`
/// with runs of text inside `w:t` elements grouped by `w:p` paragraphs.
fn extract_docx(bytes: &[u8]) -> PortResult<String> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|e| PortError::ExtractionFailed(format!("DOCX is not a valid archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| PortError::ExtractionFailed(format!("DOCX has no document body: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| PortError::ExtractionFailed(format!("DOCX body read failed: {e}")))?;

    let mut reader = Reader::from_str(&xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"w:t" {
                    in_text_run = true;
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                let run = t.unescape().map_err(|e| {
                    PortError::ExtractionFailed(format!("DOCX text decode failed: {e}"))
                })?;
                current.push_str(&run);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PortError::ExtractionFailed(format!(
                    "DOCX XML parse failed: {e}"
                )))
            }
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

fn extract_plain_text(bytes: &[u8]) -> PortResult<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| PortError::ExtractionFailed(format!("file is not valid UTF-8 text: {e}")))
}

//=========================================================================================
// `TextExtractionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextExtractionService for DocumentExtractor {
    /// Converts a raw file buffer plus its declared MIME type into plain
    /// text. May return an empty string; the caller decides whether that
    /// is fatal.
    async fn extract(
        &self,
        bytes: &[u8],
        mime_type: MimeType,
        filename: &str,
    ) -> PortResult<String> {
        debug!(filename, mime = mime_type.as_str(), bytes = bytes.len(), "extracting text");
        match mime_type {
            MimeType::Pdf => extract_pdf(bytes),
            MimeType::Docx => extract_docx(bytes),
            MimeType::PlainText => extract_plain_text(bytes),
            MimeType::Jpeg | MimeType::Png | MimeType::Tiff => {
                self.ocr.recognize(bytes, mime_type).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct StubOcr(String);

    #[async_trait]
    impl OcrService for StubOcr {
        async fn recognize(&self, _bytes: &[u8], _mime: MimeType) -> PortResult<String> {
            Ok(self.0.clone())
        }
    }

    fn extractor() -> DocumentExtractor {
        DocumentExtractor::new(Arc::new(StubOcr("ocr text".to_string())))
    }

    fn docx_archive(body_xml: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("word/document.xml", options).unwrap();
            writer.write_all(body_xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn unsupported_mime_carries_the_offending_string() {
        let err = resolve_mime("application/zip").unwrap_err();
        assert!(matches!(err, PortError::UnsupportedFormat(m) if m == "application/zip"));
    }

    #[tokio::test]
    async fn plain_text_passes_through() {
        let text = extractor()
            .extract(b"hello world", MimeType::PlainText, "a.txt")
            .await
            .unwrap();
        assert_eq!(text, "hello world");
    }

    #[tokio::test]
    async fn invalid_utf8_is_an_extraction_failure() {
        let err = extractor()
            .extract(&[0xff, 0xfe, 0x00], MimeType::PlainText, "a.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn docx_paragraphs_become_lines() {
        let xml = r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>First paragraph</w:t></w:r></w:p>
    <w:p><w:r><w:t>Second </w:t></w:r><w:r><w:t>paragraph</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let bytes = docx_archive(xml);
        let text = extractor().extract(&bytes, MimeType::Docx, "a.docx").await.unwrap();
        assert_eq!(text, "First paragraph\nSecond paragraph");
    }

    #[tokio::test]
    async fn docx_entities_are_unescaped() {
        let xml = r#"<w:document xmlns:w="x"><w:body><w:p><w:r><w:t>Smith &amp; Co</w:t></w:r></w:p></w:body></w:document>"#;
        let bytes = docx_archive(xml);
        let text = extractor().extract(&bytes, MimeType::Docx, "a.docx").await.unwrap();
        assert_eq!(text, "Smith & Co");
    }

    #[tokio::test]
    async fn garbage_docx_is_an_extraction_failure() {
        let err = extractor()
            .extract(b"not a zip at all", MimeType::Docx, "a.docx")
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn garbage_pdf_is_an_extraction_failure() {
        let err = extractor()
            .extract(b"definitely not a pdf", MimeType::Pdf, "a.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn images_delegate_to_ocr() {
        let text = extractor()
            .extract(&[0x89, 0x50, 0x4e, 0x47], MimeType::Png, "scan.png")
            .await
            .unwrap();
        assert_eq!(text, "ocr text");
    }
}
