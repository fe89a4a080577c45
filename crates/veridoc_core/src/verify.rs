//! crates/veridoc_core/src/verify.rs
//!
//! The verification orchestrator: sequences extraction, analysis, and
//! redaction for one request and assembles the terminal report. Holds no
//! state across requests.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{
    AnalysisOutcome, Document, ReportLanguage, VerificationReport, VerificationStatus,
};
use crate::ports::{
    PortError, PortResult, SemanticRedactionService, TextExtractionService,
    VerificationAnalysisService,
};
use crate::redact::Redactor;

/// Placeholder for reports whose document yielded no text.
const NO_TEXT_PLACEHOLDER: &str = "No text could be extracted.";

/// Sequences one verification request through
/// extraction -> analysis -> redaction -> assembly.
///
/// Stage failures are absorbed into a terminal ERROR report wherever a
/// well-formed report can still be returned. Only two error classes leave
/// `verify` as errors: `UnsupportedFormat` (a client input problem the
/// transport layer must answer with 400) and `Infrastructure` (network or
/// auth failure talking to an external service).
pub struct VerificationPipeline {
    extractor: Arc<dyn TextExtractionService>,
    analyzer: Arc<dyn VerificationAnalysisService>,
    semantic_redactor: Option<Arc<dyn SemanticRedactionService>>,
    redactor: Redactor,
}

impl VerificationPipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractionService>,
        analyzer: Arc<dyn VerificationAnalysisService>,
        semantic_redactor: Option<Arc<dyn SemanticRedactionService>>,
    ) -> Self {
        Self {
            extractor,
            analyzer,
            semantic_redactor,
            redactor: Redactor::new(),
        }
    }

    /// Runs the full pipeline and always returns a report value, except
    /// for the two propagating error classes documented on the type.
    pub async fn verify(
        &self,
        document: &Document,
        description: &str,
        language: ReportLanguage,
    ) -> PortResult<VerificationReport> {
        // RECEIVED -> EXTRACTED
        let extracted = match self
            .extractor
            .extract(&document.raw_bytes, document.mime_type, &document.filename)
            .await
        {
            Ok(text) => text,
            Err(err @ PortError::UnsupportedFormat(_)) => return Err(err),
            Err(err) => {
                warn!(filename = %document.filename, error = %err, "extraction failed");
                return Ok(self.error_report(
                    document,
                    "Text extraction failed.",
                    &err.to_string(),
                    String::new(),
                ));
            }
        };
        info!(
            filename = %document.filename,
            chars = extracted.len(),
            "stage extracted"
        );

        // EXTRACTED -> ANALYZED. The analysis port is called even for empty
        // text; it answers the no-text condition with a fixed ERROR outcome.
        let outcome = match self.analyzer.analyze(&extracted, description, language).await {
            Ok(outcome) => outcome,
            Err(err @ PortError::Infrastructure(_)) => return Err(err),
            Err(err) => {
                warn!(filename = %document.filename, error = %err, "analysis failed");
                AnalysisOutcome::analysis_failed(&err.to_string())
            }
        };
        info!(
            filename = %document.filename,
            status = outcome.status.label(),
            "stage analyzed"
        );

        // ANALYZED -> REDACTED. The pattern profile is authoritative; the
        // semantic profile runs as a best-effort second pass and fails open
        // to the pattern output. That decision lives here and nowhere else.
        // Text with nothing but whitespace has nothing to redact, so both
        // passes are skipped and the placeholder ships instead.
        let extracted_text = if extracted.trim().is_empty() {
            NO_TEXT_PLACEHOLDER.to_string()
        } else {
            let mut redacted = self.redactor.redact(&extracted);
            if let Some(semantic) = &self.semantic_redactor {
                match semantic.redact(&redacted).await {
                    Ok(text) => redacted = text,
                    Err(err) => {
                        warn!(
                            filename = %document.filename,
                            error = %err,
                            "semantic redaction failed, keeping pattern output"
                        );
                    }
                }
            }
            redacted
        };
        let summary = self.redactor.redact(&outcome.summary);

        // REDACTED -> ASSEMBLED (terminal)
        Ok(VerificationReport::new(
            document.filename.clone(),
            outcome.status,
            i64::from(outcome.confidence_score),
            summary,
            outcome.details,
            extracted_text,
        ))
    }

    fn error_report(
        &self,
        document: &Document,
        summary: &str,
        details: &str,
        extracted_text: String,
    ) -> VerificationReport {
        VerificationReport::new(
            document.filename.clone(),
            VerificationStatus::Error,
            0,
            summary.to_string(),
            details.to_string(),
            extracted_text,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MimeType;
    use async_trait::async_trait;

    struct FixedExtractor(PortResult<String>);

    #[async_trait]
    impl TextExtractionService for FixedExtractor {
        async fn extract(
            &self,
            _bytes: &[u8],
            _mime_type: MimeType,
            _filename: &str,
        ) -> PortResult<String> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(PortError::UnsupportedFormat(m)) => {
                    Err(PortError::UnsupportedFormat(m.clone()))
                }
                Err(e) => Err(PortError::ExtractionFailed(e.to_string())),
            }
        }
    }

    struct FixedAnalyzer(PortResult<AnalysisOutcome>);

    #[async_trait]
    impl VerificationAnalysisService for FixedAnalyzer {
        async fn analyze(
            &self,
            text: &str,
            _description: &str,
            _language: ReportLanguage,
        ) -> PortResult<AnalysisOutcome> {
            if text.trim().is_empty() {
                return Ok(AnalysisOutcome::no_text());
            }
            match &self.0 {
                Ok(outcome) => Ok(outcome.clone()),
                Err(PortError::AnalysisParse(m)) => Err(PortError::AnalysisParse(m.clone())),
                Err(PortError::Infrastructure(m)) => Err(PortError::Infrastructure(m.clone())),
                Err(e) => Err(PortError::AnalysisParse(e.to_string())),
            }
        }
    }

    struct FailingSemanticRedactor;

    #[async_trait]
    impl SemanticRedactionService for FailingSemanticRedactor {
        async fn redact(&self, _text: &str) -> PortResult<String> {
            Err(PortError::Redaction("backend unavailable".to_string()))
        }
    }

    struct CountingSemanticRedactor(std::sync::atomic::AtomicUsize);

    #[async_trait]
    impl SemanticRedactionService for CountingSemanticRedactor {
        async fn redact(&self, text: &str) -> PortResult<String> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(format!("{text} [REDACTED]"))
        }
    }

    fn doc() -> Document {
        Document {
            filename: "invoice.pdf".to_string(),
            mime_type: MimeType::Pdf,
            raw_bytes: b"%PDF-1.4".to_vec(),
        }
    }

    fn suspicious_outcome() -> AnalysisOutcome {
        AnalysisOutcome {
            status: VerificationStatus::Suspicious,
            summary: "Inconsistent dates for john@example.com.".to_string(),
            details: "- Date format is unusual.\n- Amount looks inflated.".to_string(),
            confidence_score: 85,
        }
    }

    fn pipeline(
        extract: PortResult<String>,
        analyze: PortResult<AnalysisOutcome>,
    ) -> VerificationPipeline {
        VerificationPipeline::new(
            Arc::new(FixedExtractor(extract)),
            Arc::new(FixedAnalyzer(analyze)),
            None,
        )
    }

    #[tokio::test]
    async fn happy_path_assembles_redacted_report() {
        let p = pipeline(
            Ok("Invoice to: john@example.com, phone 9876543210".to_string()),
            Ok(suspicious_outcome()),
        );
        let report = p.verify(&doc(), "an invoice", ReportLanguage::English).await.unwrap();

        assert_eq!(report.verification_status, VerificationStatus::Suspicious);
        assert_eq!(report.confidence_score, 85);
        assert_eq!(
            report.extracted_text,
            "Invoice to: [HIDDEN], phone [HIDDEN]"
        );
        // The summary is pattern-redacted too.
        assert!(!report.summary.contains("john@example.com"));
        assert!(report.summary.contains("[HIDDEN]"));
        assert_eq!(report.filename, "invoice.pdf");
    }

    #[tokio::test]
    async fn analysis_parse_failure_becomes_error_report() {
        let p = pipeline(
            Ok("some document text".to_string()),
            Err(PortError::AnalysisParse("expected value at line 1".to_string())),
        );
        let report = p.verify(&doc(), "a lease", ReportLanguage::English).await.unwrap();

        assert_eq!(report.verification_status, VerificationStatus::Error);
        assert_eq!(report.confidence_score, 0);
        assert_eq!(report.summary, "AI analysis failed.");
    }

    #[tokio::test]
    async fn extraction_failure_becomes_error_report() {
        let p = pipeline(
            Err(PortError::ExtractionFailed("corrupt xref table".to_string())),
            Ok(suspicious_outcome()),
        );
        let report = p.verify(&doc(), "an invoice", ReportLanguage::English).await.unwrap();

        assert_eq!(report.verification_status, VerificationStatus::Error);
        assert_eq!(report.confidence_score, 0);
        assert_eq!(report.summary, "Text extraction failed.");
    }

    #[tokio::test]
    async fn unsupported_format_propagates() {
        let p = pipeline(
            Err(PortError::UnsupportedFormat("application/zip".to_string())),
            Ok(suspicious_outcome()),
        );
        let err = p
            .verify(&doc(), "an archive", ReportLanguage::English)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::UnsupportedFormat(m) if m == "application/zip"));
    }

    #[tokio::test]
    async fn infrastructure_failure_propagates() {
        let p = pipeline(
            Ok("some text".to_string()),
            Err(PortError::Infrastructure("connection reset".to_string())),
        );
        let err = p.verify(&doc(), "a deed", ReportLanguage::English).await.unwrap_err();
        assert!(matches!(err, PortError::Infrastructure(_)));
    }

    #[tokio::test]
    async fn empty_extraction_still_runs_analysis_and_reports_error() {
        let p = pipeline(Ok(String::new()), Ok(suspicious_outcome()));
        let report = p.verify(&doc(), "an invoice", ReportLanguage::English).await.unwrap();

        assert_eq!(report.verification_status, VerificationStatus::Error);
        assert_eq!(report.confidence_score, 0);
        assert_eq!(report.extracted_text, "No text could be extracted.");
    }

    #[tokio::test]
    async fn whitespace_only_extraction_skips_redaction() {
        let redactor = Arc::new(CountingSemanticRedactor(
            std::sync::atomic::AtomicUsize::new(0),
        ));
        let p = VerificationPipeline::new(
            Arc::new(FixedExtractor(Ok("  \n\t ".to_string()))),
            Arc::new(FixedAnalyzer(Ok(suspicious_outcome()))),
            Some(redactor.clone()),
        );
        let report = p.verify(&doc(), "an invoice", ReportLanguage::English).await.unwrap();

        assert_eq!(report.verification_status, VerificationStatus::Error);
        assert_eq!(report.extracted_text, "No text could be extracted.");
        // No text means no redaction pass, semantic included.
        assert_eq!(redactor.0.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn semantic_failure_falls_back_to_pattern_output() {
        let p = VerificationPipeline::new(
            Arc::new(FixedExtractor(Ok(
                "Invoice to: john@example.com".to_string()
            ))),
            Arc::new(FixedAnalyzer(Ok(suspicious_outcome()))),
            Some(Arc::new(FailingSemanticRedactor)),
        );
        let report = p.verify(&doc(), "an invoice", ReportLanguage::English).await.unwrap();

        // Fail-open: pattern-redacted text ships, never the raw text.
        assert_eq!(report.extracted_text, "Invoice to: [HIDDEN]");
    }
}
