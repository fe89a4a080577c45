//! crates/veridoc_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or transport format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Documents and MIME Types
//=========================================================================================

/// The document formats the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MimeType {
    Pdf,
    Docx,
    Jpeg,
    Png,
    Tiff,
    PlainText,
}

impl MimeType {
    /// Maps a declared MIME string onto a supported format. Any `text/*`
    /// subtype is treated as plain text, matching how uploads arrive in
    /// practice (`text/plain`, `text/markdown`, ...).
    pub fn parse(mime: &str) -> Option<Self> {
        match mime {
            "application/pdf" => Some(Self::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Docx)
            }
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/tiff" => Some(Self::Tiff),
            _ if mime.starts_with("text/") => Some(Self::PlainText),
            _ => None,
        }
    }

    /// The canonical MIME string for this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Tiff => "image/tiff",
            Self::PlainText => "text/plain",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Png | Self::Tiff)
    }
}

/// An uploaded artifact. Immutable once received; owned by the request
/// that created it until it is handed to storage.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub mime_type: MimeType,
    pub raw_bytes: Vec<u8>,
}

//=========================================================================================
// Verification
//=========================================================================================

/// The verdict of a document verification analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Verified,
    Suspicious,
    Indeterminate,
    Error,
}

impl VerificationStatus {
    /// Maps a classification label from the analysis service onto a status.
    /// Anything unrecognized becomes `Error` so a free-form string can
    /// never leak into a report.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "VERIFIED" => Self::Verified,
            "SUSPICIOUS" => Self::Suspicious,
            "INDETERMINATE" => Self::Indeterminate,
            _ => Self::Error,
        }
    }

    /// The uppercase wire/label form.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Verified => "VERIFIED",
            Self::Suspicious => "SUSPICIOUS",
            Self::Indeterminate => "INDETERMINATE",
            Self::Error => "ERROR",
        }
    }
}

/// The terminal artifact of a verification request. Created once, never
/// mutated after construction, and not persisted unless storage is
/// explicitly invoked.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub report_id: Uuid,
    pub filename: String,
    pub verification_status: VerificationStatus,
    pub confidence_score: u8,
    pub summary: String,
    pub analysis_details: String,
    pub extracted_text: String,
    pub verified_at: DateTime<Utc>,
}

impl VerificationReport {
    /// Builds a report with a fresh id and timestamp. The confidence score
    /// is clamped into [0, 100] here so the invariant holds no matter what
    /// the analysis service produced.
    pub fn new(
        filename: String,
        verification_status: VerificationStatus,
        confidence_score: i64,
        summary: String,
        analysis_details: String,
        extracted_text: String,
    ) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            filename,
            verification_status,
            confidence_score: confidence_score.clamp(0, 100) as u8,
            summary,
            analysis_details,
            extracted_text,
            verified_at: Utc::now(),
        }
    }
}

/// The normalized result of one verification analysis call, before it is
/// assembled into a report.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub status: VerificationStatus,
    pub summary: String,
    pub details: String,
    pub confidence_score: u8,
}

impl AnalysisOutcome {
    /// The fixed outcome for documents that yielded no text at all.
    pub fn no_text() -> Self {
        Self {
            status: VerificationStatus::Error,
            summary: "No text could be extracted from the document.".to_string(),
            details: "Could not extract any text from the document. The file might be \
                      blank, corrupted, or not a valid document image."
                .to_string(),
            confidence_score: 0,
        }
    }

    /// The fixed outcome substituted when the analysis backend failed.
    pub fn analysis_failed(reason: &str) -> Self {
        Self {
            status: VerificationStatus::Error,
            summary: "AI analysis failed.".to_string(),
            details: format!(
                "The analysis could not be completed due to an internal error: {reason}"
            ),
            confidence_score: 0,
        }
    }
}

/// Payload for a multimodal analysis call. Callers pass exactly the shape
/// they have; adapters match on the variant instead of probing for
/// optional fields.
#[derive(Debug, Clone)]
pub enum AnalysisInput {
    Text(String),
    Image { bytes: Vec<u8>, mime: MimeType },
    PdfBytes(Vec<u8>),
    TextAndImage { text: String, bytes: Vec<u8>, mime: MimeType },
}

//=========================================================================================
// Risk Analysis and Stored Metadata
//=========================================================================================

/// Structured risk assessment of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAnalysis {
    pub risk_score: f32,
    pub issues_found: Vec<String>,
    pub recommendations: Vec<String>,
}

/// The persisted metadata record for an uploaded document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentMetadata {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub document_type: String,
    pub mime_type: String,
    pub storage_url: String,
    pub uploaded_at: DateTime<Utc>,
    pub ai_summary: Option<String>,
    pub risk_analysis: Option<RiskAnalysis>,
}

//=========================================================================================
// Chat
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One turn of the chat conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

//=========================================================================================
// Report Languages
//=========================================================================================

/// Languages a verification report can be produced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportLanguage {
    #[default]
    English,
    Hindi,
    Bengali,
    Marathi,
    Telugu,
    Tamil,
    Gujarati,
    Kannada,
    Malayalam,
    Punjabi,
}

impl ReportLanguage {
    /// Parses the full language name as submitted by clients.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "English" => Some(Self::English),
            "Hindi" => Some(Self::Hindi),
            "Bengali" => Some(Self::Bengali),
            "Marathi" => Some(Self::Marathi),
            "Telugu" => Some(Self::Telugu),
            "Tamil" => Some(Self::Tamil),
            "Gujarati" => Some(Self::Gujarati),
            "Kannada" => Some(Self::Kannada),
            "Malayalam" => Some(Self::Malayalam),
            "Punjabi" => Some(Self::Punjabi),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Bengali => "Bengali",
            Self::Marathi => "Marathi",
            Self::Telugu => "Telugu",
            Self::Tamil => "Tamil",
            Self::Gujarati => "Gujarati",
            Self::Kannada => "Kannada",
            Self::Malayalam => "Malayalam",
            Self::Punjabi => "Punjabi",
        }
    }

    /// The ISO code used in the generated report filename.
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Bengali => "bn",
            Self::Marathi => "mr",
            Self::Telugu => "te",
            Self::Tamil => "ta",
            Self::Gujarati => "gu",
            Self::Kannada => "kn",
            Self::Malayalam => "ml",
            Self::Punjabi => "pa",
        }
    }
}

//=========================================================================================
// Users
//=========================================================================================

// Represents a user - used throughout the app.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>,
}

// Only used internally for login/signup - contains sensitive data.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_parse_covers_supported_formats() {
        assert_eq!(MimeType::parse("application/pdf"), Some(MimeType::Pdf));
        assert_eq!(
            MimeType::parse(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            ),
            Some(MimeType::Docx)
        );
        assert_eq!(MimeType::parse("image/jpeg"), Some(MimeType::Jpeg));
        assert_eq!(MimeType::parse("image/png"), Some(MimeType::Png));
        assert_eq!(MimeType::parse("text/markdown"), Some(MimeType::PlainText));
        assert_eq!(MimeType::parse("application/zip"), None);
    }

    #[test]
    fn unknown_status_label_maps_to_error() {
        assert_eq!(
            VerificationStatus::from_label("verified"),
            VerificationStatus::Verified
        );
        assert_eq!(
            VerificationStatus::from_label(" SUSPICIOUS "),
            VerificationStatus::Suspicious
        );
        assert_eq!(
            VerificationStatus::from_label("LOOKS FINE TO ME"),
            VerificationStatus::Error
        );
        assert_eq!(VerificationStatus::from_label(""), VerificationStatus::Error);
    }

    #[test]
    fn report_clamps_confidence_into_range() {
        let high = VerificationReport::new(
            "a.pdf".into(),
            VerificationStatus::Verified,
            140,
            String::new(),
            String::new(),
            String::new(),
        );
        assert_eq!(high.confidence_score, 100);

        let low = VerificationReport::new(
            "a.pdf".into(),
            VerificationStatus::Error,
            -5,
            String::new(),
            String::new(),
            String::new(),
        );
        assert_eq!(low.confidence_score, 0);
    }

    #[test]
    fn report_language_round_trip() {
        for name in ["English", "Hindi", "Tamil", "Punjabi"] {
            let lang = ReportLanguage::from_name(name).unwrap();
            assert_eq!(lang.name(), name);
        }
        assert_eq!(ReportLanguage::from_name("Klingon"), None);
        assert_eq!(ReportLanguage::default().code(), "en");
    }
}
