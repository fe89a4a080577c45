//! services/api/src/adapters/summary_llm.rs
//!
//! This module contains the adapter for the document summarization LLM.
//! It implements the `SummarizationService` port from the `core` crate.

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use veridoc_core::ports::{PortError, PortResult, SummarizationService};

use crate::adapters::util::with_timeout;

const SUMMARY_PROMPT: &str = r#"Summarize the following {document_type} document focusing only on:

1. Key parties involved
2. Important dates and deadlines
3. Main obligations of each party
4. Risks and liabilities
5. Termination and renewal clauses

Document:
{text}"#;

/// An adapter that implements `SummarizationService` using an
/// OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiSummaryAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiSummaryAdapter {
    /// Creates a new `OpenAiSummaryAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String, timeout: Duration) -> Self {
        Self {
            client,
            model,
            timeout,
        }
    }
}

#[async_trait]
impl SummarizationService for OpenAiSummaryAdapter {
    /// Produces a plain-language summary of a document.
    async fn summarize(&self, text: &str, document_type: &str) -> PortResult<String> {
        let prompt = SUMMARY_PROMPT
            .replace("{document_type}", document_type)
            .replace("{text}", text);

        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| PortError::Infrastructure(e.to_string()))?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Infrastructure(e.to_string()))?;

        let response = with_timeout(self.timeout, "summarization", async {
            self.client
                .chat()
                .create(request)
                .await
                .map_err(|e: OpenAIError| PortError::Infrastructure(e.to_string()))
        })
        .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Infrastructure(
                    "summarization response contained no text content".to_string(),
                )
            })?;

        Ok(content.trim().to_string())
    }
}
