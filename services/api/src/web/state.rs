//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use crate::config::Config;
use veridoc_core::ports::{
    ChatService, DatabaseService, ObjectStorageService, RiskAnalysisService,
    SemanticRedactionService, SummarizationService, TextExtractionService,
};
use veridoc_core::redact::Redactor;
use veridoc_core::verify::VerificationPipeline;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<dyn DatabaseService>,
    pub storage: Arc<dyn ObjectStorageService>,
    pub extractor: Arc<dyn TextExtractionService>,
    pub summarizer: Arc<dyn SummarizationService>,
    pub risk: Arc<dyn RiskAnalysisService>,
    pub chat: Arc<dyn ChatService>,
    pub semantic_redactor: Arc<dyn SemanticRedactionService>,
    /// The verification orchestrator, wired over the same adapters.
    pub pipeline: Arc<VerificationPipeline>,
    /// The pattern redaction profile, compiled once at startup.
    pub redactor: Arc<Redactor>,
}
