//! services/api/src/adapters/ocr_llm.rs
//!
//! This module contains the OCR adapter. It implements the `OcrService`
//! port from the `core` crate by sending the image to a vision-capable
//! model and asking for every piece of visible text verbatim.

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, ImageUrlArgs,
    },
    Client,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use veridoc_core::domain::MimeType;
use veridoc_core::ports::{OcrService, PortError, PortResult};

use crate::adapters::util::with_timeout;

const SYSTEM_INSTRUCTIONS: &str = "You are an OCR engine. You transcribe every piece of \
visible text in the image verbatim, top to bottom, left to right, as plain text. No \
commentary, no layout markup, no corrections to what is written.";

const USER_INSTRUCTION: &str =
    "Transcribe all text visible in this document image. Return only the text.";

/// An adapter that implements the `OcrService` port using a
/// vision-capable OpenAI-compatible model.
#[derive(Clone)]
pub struct OpenAiOcrAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiOcrAdapter {
    /// Creates a new `OpenAiOcrAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String, timeout: Duration) -> Self {
        Self {
            client,
            model,
            timeout,
        }
    }
}

#[async_trait]
impl OcrService for OpenAiOcrAdapter {
    /// Runs OCR over a full image. Best-effort plain text, no layout
    /// structure preserved; an empty transcription is returned as an
    /// empty string, not an error.
    async fn recognize(&self, bytes: &[u8], mime: MimeType) -> PortResult<String> {
        let map_err = |e: OpenAIError| PortError::ExtractionFailed(e.to_string());

        let image_url = format!("data:{};base64,{}", mime.as_str(), BASE64.encode(bytes));
        let parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
            ChatCompletionRequestMessageContentPartTextArgs::default()
                .text(USER_INSTRUCTION)
                .build()
                .map_err(map_err)?
                .into(),
            ChatCompletionRequestMessageContentPartImageArgs::default()
                .image_url(ImageUrlArgs::default().url(image_url).build().map_err(map_err)?)
                .build()
                .map_err(map_err)?
                .into(),
        ];

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(map_err)?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(parts)
                .build()
                .map_err(map_err)?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(map_err)?;

        let response = with_timeout(self.timeout, "OCR", async {
            self.client
                .chat()
                .create(request)
                .await
                .map_err(|e: OpenAIError| PortError::ExtractionFailed(e.to_string()))
        })
        .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }
}
