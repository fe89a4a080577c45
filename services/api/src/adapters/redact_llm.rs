//! services/api/src/adapters/redact_llm.rs
//!
//! This module contains the adapter for the semantic ("intelligent")
//! redaction profile. It implements the `SemanticRedactionService` port
//! from the `core` crate.
//!
//! Unlike the pattern profile, this output is non-deterministic and
//! best-effort: the decision of what counts as sensitive is delegated to
//! the model. Failures surface as `PortError::Redaction` so the caller
//! decides fail-open versus fail-closed; no sentinel strings.

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use veridoc_core::ports::{PortError, PortResult, SemanticRedactionService};
use veridoc_core::redact::SEMANTIC_TOKEN;

use crate::adapters::util::with_timeout;

const SYSTEM_INSTRUCTIONS: &str = "You are a precise redaction engine. You rewrite documents \
replacing sensitive personal information with a placeholder token, changing nothing else: \
no rewording, no reordering, no commentary.";

const USER_INPUT_TEMPLATE: &str = r#"Rewrite the text below, replacing every occurrence of the
following categories with the exact token {token}:
- government ID numbers (SSN, Aadhaar, PAN, passport numbers)
- financial account numbers (bank accounts, card numbers)
- birth dates
- personal contact information (personal emails, phone numbers, home addresses)

You MUST preserve unchanged:
- organization and company names
- business contact details (office addresses, support lines)
- monetary amounts, dates that are not birth dates, and all other content

Return only the rewritten text.

Text:
---
{text}
---"#;

/// An adapter that implements `SemanticRedactionService` using an
/// OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiRedactAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiRedactAdapter {
    /// Creates a new `OpenAiRedactAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String, timeout: Duration) -> Self {
        Self {
            client,
            model,
            timeout,
        }
    }
}

#[async_trait]
impl SemanticRedactionService for OpenAiRedactAdapter {
    async fn redact(&self, text: &str) -> PortResult<String> {
        let prompt = USER_INPUT_TEMPLATE
            .replace("{token}", SEMANTIC_TOKEN)
            .replace("{text}", text);

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Redaction(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| PortError::Redaction(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Redaction(e.to_string()))?;

        let response = with_timeout(self.timeout, "semantic redaction", async {
            self.client
                .chat()
                .create(request)
                .await
                .map_err(|e: OpenAIError| PortError::Redaction(e.to_string()))
        })
        .await
        // A timeout is still a redaction failure from the caller's view.
        .map_err(|e| PortError::Redaction(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Redaction("redaction response contained no text content".to_string())
            })?;

        Ok(content.trim().to_string())
    }
}
