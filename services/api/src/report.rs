//! services/api/src/report.rs
//!
//! Renders a `VerificationReport` to a paginated PDF via `printpdf`.
//! The layout is fixed: title, a label/value block, then summary,
//! details, and redacted-text sections with embedded newlines mapped to
//! line breaks.
//!
//! Body text uses an embedded Noto Sans subset (Latin plus the Indic
//! scripts the report languages cover) so summaries in Hindi, Tamil,
//! etc. survive rendering; the builtin Helvetica fonts only encode
//! WinAnsi and are kept for the ASCII section headers.

use std::io::BufWriter;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use crate::error::ApiError;
use veridoc_core::domain::VerificationReport;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const LEFT_MARGIN: f32 = 20.0;
const TOP_Y: f32 = 280.0;
const BOTTOM_Y: f32 = 20.0;
const WRAP_COLUMNS: usize = 95;

/// Noto Sans subset covering Latin, Devanagari, Bengali, Gurmukhi,
/// Gujarati, Tamil, Telugu, Kannada, and Malayalam (SIL OFL 1.1, see
/// fonts/OFL.txt).
const BODY_FONT: &[u8] = include_bytes!("../fonts/NotoSansReport-Regular.ttf");

/// Builds the download filename for a rendered report. Sanitization
/// keeps only alphanumerics, `.`, and `_` from the original name.
pub fn report_filename(language_code: &str, original: &str) -> String {
    let sanitized: String = original
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '.' || *c == '_')
        .collect();
    format!("verification_report_{language_code}_{sanitized}.pdf")
}

/// Wraps a single line at a fixed column count, breaking on whitespace.
/// A word longer than the width gets its own line rather than being
/// split mid-word.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Tracks the cursor across pages, starting a fresh page whenever the
/// cursor passes the bottom margin.
struct ReportWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    y: Mm,
}

impl ReportWriter {
    fn line(&mut self, text: &str, size: f32, font: &IndirectFontRef, step: f32) {
        if self.y < Mm(BOTTOM_Y) {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = Mm(TOP_Y);
        }
        self.layer.use_text(text, size, Mm(LEFT_MARGIN), self.y, font);
        self.y -= Mm(step);
    }

    fn gap(&mut self, step: f32) {
        self.y -= Mm(step);
    }

    /// Writes a block of text, mapping pre-existing newlines to line
    /// breaks and wrapping each resulting line.
    fn block(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        for raw_line in text.lines() {
            for line in wrap_text(raw_line, WRAP_COLUMNS) {
                self.line(&line, size, font, 4.5);
            }
        }
    }
}

/// Serializes a report to PDF bytes.
pub fn render_report(report: &VerificationReport) -> Result<Vec<u8>, ApiError> {
    let (doc, page, layer) = PdfDocument::new(
        "Document Verification Report",
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let font = doc
        .add_external_font(BODY_FONT)
        .map_err(|e| ApiError::Render(format!("PDF font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ApiError::Render(format!("PDF font error: {e}")))?;

    let layer = doc.get_page(page).get_layer(layer);
    let mut writer = ReportWriter {
        doc,
        layer,
        y: Mm(TOP_Y),
    };

    // Title
    writer.line("DOCUMENT VERIFICATION REPORT", 16.0, &bold, 10.0);

    // Label/value block
    writer.line(&format!("Report ID: {}", report.report_id), 10.0, &font, 5.0);
    writer.line(&format!("Filename: {}", report.filename), 10.0, &font, 5.0);
    writer.line(
        &format!("Status: {}", report.verification_status.label()),
        10.0,
        &font,
        5.0,
    );
    writer.line(
        &format!("Confidence: {} / 100", report.confidence_score),
        10.0,
        &font,
        5.0,
    );
    writer.line(
        &format!("Verified at: {}", report.verified_at.to_rfc3339()),
        10.0,
        &font,
        5.0,
    );
    writer.gap(4.0);

    // Summary
    writer.line("SUMMARY:", 11.0, &bold, 6.0);
    writer.block(&report.summary, 9.0, &font);
    writer.gap(4.0);

    // Analysis details
    writer.line("ANALYSIS DETAILS:", 11.0, &bold, 6.0);
    writer.block(&report.analysis_details, 9.0, &font);
    writer.gap(4.0);

    // Redacted extracted text
    writer.line("EXTRACTED TEXT (REDACTED):", 11.0, &bold, 6.0);
    writer.block(&report.extracted_text, 9.0, &font);

    let mut buf = BufWriter::new(Vec::new());
    writer
        .doc
        .save(&mut buf)
        .map_err(|e| ApiError::Render(format!("PDF save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ApiError::Render(format!("PDF buffer error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use veridoc_core::domain::VerificationStatus;

    fn sample_report() -> VerificationReport {
        VerificationReport::new(
            "invoice_123.pdf".to_string(),
            VerificationStatus::Suspicious,
            85,
            "The document appears suspicious due to an inconsistent date format.".to_string(),
            "- The issue date does not follow a standard format.\n- The total amount seems high."
                .to_string(),
            "Invoice To: [HIDDEN]\nDate: 15-2024-05\nTotal: $5000.00".to_string(),
        )
    }

    #[test]
    fn filename_is_sanitized() {
        // The original extension survives sanitization, so the report
        // filename carries it in front of the appended `.pdf`.
        assert_eq!(
            report_filename("en", "my invoice (final).pdf"),
            "verification_report_en_myinvoicefinal.pdf.pdf"
        );
        assert_eq!(
            report_filename("hi", "lease_v2.pdf"),
            "verification_report_hi_lease_v2.pdf.pdf"
        );
    }

    #[test]
    fn wrap_respects_column_width() {
        let lines = wrap_text("one two three four five six", 10);
        assert!(lines.iter().all(|l| l.len() <= 10));
        assert_eq!(lines.join(" "), "one two three four five six");
    }

    #[test]
    fn rendered_report_round_trips_key_fields() {
        let report = sample_report();
        let bytes = render_report(&report).unwrap();

        let text = pdf_extract::extract_text_from_mem(&bytes).unwrap();
        assert!(text.contains("invoice_123.pdf"));
        assert!(text.contains("SUSPICIOUS"));
        assert!(text.contains("85 / 100"));
    }

    #[test]
    fn non_latin_summaries_survive_rendering() {
        let mut report = sample_report();
        report.summary = "दस्तावेज़ सत्यापित है और कोई विसंगति नहीं मिली।".to_string();
        report.extracted_text = "चालान प्राप्तकर्ता: [HIDDEN]\nTotal: $5000.00".to_string();

        let bytes = render_report(&report).unwrap();
        let text = pdf_extract::extract_text_from_mem(&bytes).unwrap();
        assert!(text.contains("सत्यापित"));
        assert!(text.contains("[HIDDEN]"));
    }

    #[test]
    fn long_reports_paginate_instead_of_overflowing() {
        let mut report = sample_report();
        report.extracted_text = (0..400)
            .map(|i| format!("line number {i} of the extracted document text"))
            .collect::<Vec<_>>()
            .join("\n");

        let bytes = render_report(&report).unwrap();
        let text = pdf_extract::extract_text_from_mem(&bytes).unwrap();
        assert!(text.contains("line number 0"));
        assert!(text.contains("line number 399"));
    }
}
