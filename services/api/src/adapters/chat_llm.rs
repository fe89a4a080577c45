//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the document assistant chatbot.
//! It implements the `ChatService` port from the `core` crate.

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
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
use veridoc_core::domain::{AnalysisInput, ChatMessage, ChatRole, MimeType};
use veridoc_core::ports::{ChatService, PortError, PortResult};

use crate::adapters::util::with_timeout;

const SYSTEM_PROMPT: &str = r#"You are the VeriDoc assistant, an AI that simplifies and verifies documents.

Your role is to:
- Provide short, clear, and concise answers to user questions.
- Explain complex terms in simple, everyday language.
- Guide users step-by-step through the document verification process.
- Stay professional, polite, and neutral at all times.

Key rules:
- Do not provide legal, medical, or financial advice. If asked, politely decline and recommend consulting a qualified professional.
- Focus only on explaining terms, the verification process, and platform features.
- Keep responses brief and to the point, unless the user requests a detailed explanation.
- If unsure about something, say you don't have information on that topic.
- End substantive answers with: "This is general information, not legal advice. Please consult a lawyer for personal guidance.""#;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChatService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiChatAdapter {
    /// Creates a new `OpenAiChatAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String, timeout: Duration) -> Self {
        Self {
            client,
            model,
            timeout,
        }
    }
}

fn data_url(bytes: &[u8], mime: MimeType) -> String {
    format!("data:{};base64,{}", mime.as_str(), BASE64.encode(bytes))
}

/// Builds the final user turn from the message plus an optional
/// attachment, matching on the input variant instead of probing optional
/// fields. PDF bytes must be extracted to text upstream; they are not a
/// form this adapter can send.
fn build_user_message(
    message: &str,
    attachment: Option<AnalysisInput>,
) -> PortResult<ChatCompletionRequestMessage> {
    let map_err = |e: OpenAIError| PortError::Infrastructure(e.to_string());

    let mut builder = ChatCompletionRequestUserMessageArgs::default();
    let message_args = match attachment {
        None => builder.content(message.to_string()).build().map_err(map_err)?,
        Some(AnalysisInput::Text(text)) => builder
            .content(format!("{message}\n\nAttached document text:\n---\n{text}\n---"))
            .build()
            .map_err(map_err)?,
        Some(AnalysisInput::Image { bytes, mime }) => {
            let parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
                ChatCompletionRequestMessageContentPartTextArgs::default()
                    .text(message.to_string())
                    .build()
                    .map_err(map_err)?
                    .into(),
                ChatCompletionRequestMessageContentPartImageArgs::default()
                    .image_url(
                        ImageUrlArgs::default()
                            .url(data_url(&bytes, mime))
                            .build()
                            .map_err(map_err)?,
                    )
                    .build()
                    .map_err(map_err)?
                    .into(),
            ];
            builder.content(parts).build().map_err(map_err)?
        }
        Some(AnalysisInput::TextAndImage { text, bytes, mime }) => {
            let parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
                ChatCompletionRequestMessageContentPartTextArgs::default()
                    .text(format!(
                        "{message}\n\nAttached document text:\n---\n{text}\n---"
                    ))
                    .build()
                    .map_err(map_err)?
                    .into(),
                ChatCompletionRequestMessageContentPartImageArgs::default()
                    .image_url(
                        ImageUrlArgs::default()
                            .url(data_url(&bytes, mime))
                            .build()
                            .map_err(map_err)?,
                    )
                    .build()
                    .map_err(map_err)?
                    .into(),
            ];
            builder.content(parts).build().map_err(map_err)?
        }
        Some(AnalysisInput::PdfBytes(_)) => {
            return Err(PortError::UnsupportedFormat(
                "raw PDF attachments must be extracted to text before chat".to_string(),
            ))
        }
    };

    Ok(message_args.into())
}

//=========================================================================================
// `ChatService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatService for OpenAiChatAdapter {
    /// Answers a user message given prior history and an optional
    /// document attachment.
    async fn reply(
        &self,
        message: &str,
        history: &[ChatMessage],
        attachment: Option<AnalysisInput>,
    ) -> PortResult<String> {
        let map_err = |e: OpenAIError| PortError::Infrastructure(e.to_string());

        let mut messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(map_err)?
                .into()];

        for turn in history {
            let msg: ChatCompletionRequestMessage = match turn.role {
                ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.text.clone())
                    .build()
                    .map_err(map_err)?
                    .into(),
                ChatRole::Model => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.text.clone())
                    .build()
                    .map_err(map_err)?
                    .into(),
            };
            messages.push(msg);
        }

        messages.push(build_user_message(message, attachment)?);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(map_err)?;

        let response = with_timeout(self.timeout, "chat completion", async {
            self.client.chat().create(request).await.map_err(map_err)
        })
        .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Infrastructure("chat response contained no text content".to_string())
            })?;

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_attachment_is_rejected() {
        let err = build_user_message("hi", Some(AnalysisInput::PdfBytes(vec![1, 2, 3])))
            .unwrap_err();
        assert!(matches!(err, PortError::UnsupportedFormat(_)));
    }

    #[test]
    fn image_data_url_has_expected_shape() {
        let url = data_url(&[0x89, 0x50], MimeType::Png);
        assert!(url.starts_with("data:image/png;base64,"));
    }
}
