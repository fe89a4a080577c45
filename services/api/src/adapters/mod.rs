pub mod chat_llm;
pub mod db;
pub mod extract;
pub mod object_store;
pub mod ocr_llm;
pub mod redact_llm;
pub mod risk_llm;
pub mod summary_llm;
pub mod util;
pub mod verify_llm;

pub use chat_llm::OpenAiChatAdapter;
pub use db::DbAdapter;
pub use extract::DocumentExtractor;
pub use object_store::HttpObjectStore;
pub use ocr_llm::OpenAiOcrAdapter;
pub use redact_llm::OpenAiRedactAdapter;
pub use risk_llm::OpenAiRiskAdapter;
pub use summary_llm::OpenAiSummaryAdapter;
pub use verify_llm::OpenAiVerifyAdapter;
