pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;

// Re-export the handlers the binary wires into the router.
pub use middleware::require_auth;
pub use rest::{
    analyze_document_handler, chat_handler, health_handler, list_documents_handler,
    redact_document_handler, upload_document_handler, verify_document_handler,
};
