//! crates/veridoc_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like the OCR provider,
//! the language-model API, the object store, or the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AnalysisInput, AnalysisOutcome, ChatMessage, DocumentMetadata, MimeType, ReportLanguage,
    RiskAnalysis, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy shared by all port operations.
///
/// The split matters to callers: `UnsupportedFormat` is a client input
/// error (400), `AnalysisParse` and `Redaction` are absorbed into degraded
/// results by the orchestrator, and `Infrastructure` is the only class
/// that propagates out of the pipeline as a server error.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("Could not parse analysis response: {0}")]
    AnalysisParse(String),
    #[error("Redaction failed: {0}")]
    Redaction(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait TextExtractionService: Send + Sync {
    /// Converts a raw file buffer plus its declared MIME type into plain
    /// text. May return an empty string; the caller decides whether that
    /// is fatal. Pure over its inputs apart from the OCR provider call
    /// needed for image formats.
    async fn extract(&self, bytes: &[u8], mime_type: MimeType, filename: &str)
        -> PortResult<String>;
}

#[async_trait]
pub trait VerificationAnalysisService: Send + Sync {
    /// Analyzes extracted document text against the uploader's description
    /// and returns a normalized verdict. Empty text must yield the fixed
    /// no-text ERROR outcome rather than a provider call.
    async fn analyze(
        &self,
        text: &str,
        description: &str,
        language: ReportLanguage,
    ) -> PortResult<AnalysisOutcome>;
}

#[async_trait]
pub trait SummarizationService: Send + Sync {
    /// Produces a plain-language summary of a document.
    async fn summarize(&self, text: &str, document_type: &str) -> PortResult<String>;
}

#[async_trait]
pub trait RiskAnalysisService: Send + Sync {
    /// Scores legal/compliance/financial risk in a document.
    async fn assess(&self, text: &str, document_type: &str) -> PortResult<RiskAnalysis>;
}

#[async_trait]
pub trait SemanticRedactionService: Send + Sync {
    /// The "intelligent" redaction profile: delegates the decision of what
    /// to strip to the analysis provider. Best-effort and
    /// non-deterministic; failures surface as `PortError::Redaction` so
    /// the caller decides fail-open versus fail-closed.
    async fn redact(&self, text: &str) -> PortResult<String>;
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Answers a user message given prior history and an optional
    /// document attachment.
    async fn reply(
        &self,
        message: &str,
        history: &[ChatMessage],
        attachment: Option<AnalysisInput>,
    ) -> PortResult<String>;
}

#[async_trait]
pub trait OcrService: Send + Sync {
    /// Runs optical character recognition over a full image and returns
    /// best-effort plain text with no layout structure preserved.
    async fn recognize(&self, bytes: &[u8], mime: MimeType) -> PortResult<String>;
}

#[async_trait]
pub trait ObjectStorageService: Send + Sync {
    /// Stores an object under the given key and returns its URL.
    async fn put_object(&self, key: &str, bytes: &[u8], content_type: &str)
        -> PortResult<String>;

    /// Fetches an object's bytes by key.
    async fn get_object(&self, key: &str) -> PortResult<Vec<u8>>;
}

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Auth Methods ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Document Metadata ---
    async fn insert_document_metadata(&self, metadata: &DocumentMetadata) -> PortResult<()>;

    async fn update_document_analysis(
        &self,
        document_id: Uuid,
        ai_summary: &str,
        risk_analysis: &RiskAnalysis,
    ) -> PortResult<()>;

    async fn get_document_metadata(&self, document_id: Uuid) -> PortResult<DocumentMetadata>;

    async fn list_documents_for_user(&self, user_id: Uuid) -> PortResult<Vec<DocumentMetadata>>;
}
