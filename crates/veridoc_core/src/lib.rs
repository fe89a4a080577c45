pub mod domain;
pub mod ports;
pub mod redact;
pub mod verify;

pub use domain::{
    AnalysisInput, AnalysisOutcome, ChatMessage, ChatRole, Document, DocumentMetadata, MimeType,
    ReportLanguage, RiskAnalysis, User, UserCredentials, VerificationReport, VerificationStatus,
};
pub use ports::{
    ChatService, DatabaseService, ObjectStorageService, OcrService, PortError, PortResult,
    RiskAnalysisService, SemanticRedactionService, SummarizationService, TextExtractionService,
    VerificationAnalysisService,
};
pub use redact::{Redactor, PATTERN_TOKEN, SEMANTIC_TOKEN};
pub use verify::VerificationPipeline;
