//! services/api/src/adapters/verify_llm.rs
//!
//! This module contains the adapter for the document fraud analysis LLM.
//! It implements the `VerificationAnalysisService` port from the `core` crate.

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
use serde_json::Value;
use veridoc_core::domain::{AnalysisOutcome, ReportLanguage, VerificationStatus};
use veridoc_core::ports::{PortError, PortResult, VerificationAnalysisService};

use crate::adapters::util::{strip_code_fences, with_timeout};

const SYSTEM_INSTRUCTIONS: &str = "You are an expert document fraud analyst. You analyze the \
extracted text of a user's document against their description of it, looking for signs of \
tampering, forgery, inconsistencies, fake content, or suspicious modifications. Pay close \
attention to: inconsistencies between the document text and the description; unusual \
formatting, illogical statements, or grammatical errors that might indicate forgery; and \
conflicting information within the document itself (dates, amounts, names). You always \
answer with a single JSON object and nothing else.";

const USER_INPUT_TEMPLATE: &str = r#"**User's Description:** "{description}"

**Extracted Document Text:**
---
{text}
---

**Instructions for your response:**
Provide your analysis as a single JSON object with exactly four keys: 'status', 'summary',
'details', and 'confidence_score'.
- 'status': one of ["VERIFIED", "SUSPICIOUS", "INDETERMINATE"].
- 'summary': a one-sentence conclusion of your findings.
- 'details': a detailed, bullet-pointed explanation of your reasoning. This can be a single
  string with newlines, or a list of strings.
- 'confidence_score': an integer from 0 to 100 expressing your confidence in the status.
Write the 'summary' and 'details' values in {language}.

Your JSON response:"#;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `VerificationAnalysisService` using an
/// OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiVerifyAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiVerifyAdapter {
    /// Creates a new `OpenAiVerifyAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String, timeout: Duration) -> Self {
        Self {
            client,
            model,
            timeout,
        }
    }
}

/// Normalizes a raw model response into an `AnalysisOutcome`.
///
/// Strips any Markdown code fence, parses the JSON object, maps an
/// unrecognized status label to ERROR, accepts `details` as either a
/// single string or a list of strings (newline-joined), and clamps the
/// confidence score. Malformed JSON is an `AnalysisParse` error; the
/// orchestrator substitutes a fixed ERROR-status result for it.
fn parse_outcome(raw: &str) -> PortResult<AnalysisOutcome> {
    let cleaned = strip_code_fences(raw);
    let value: Value = serde_json::from_str(cleaned)
        .map_err(|e| PortError::AnalysisParse(e.to_string()))?;

    let status = VerificationStatus::from_label(
        value.get("status").and_then(Value::as_str).unwrap_or(""),
    );
    let summary = value
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or("Analysis could not be completed.")
        .to_string();
    let details = match value.get("details") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => other.to_string(),
        None => "No details available.".to_string(),
    };
    let confidence_score = value
        .get("confidence_score")
        .and_then(Value::as_i64)
        .unwrap_or(0)
        .clamp(0, 100) as u8;

    Ok(AnalysisOutcome {
        status,
        summary,
        details,
        confidence_score,
    })
}

//=========================================================================================
// `VerificationAnalysisService` Trait Implementation
//=========================================================================================

#[async_trait]
impl VerificationAnalysisService for OpenAiVerifyAdapter {
    /// Analyzes extracted document text for tampering and fake content.
    /// One request per call; no retry, no streaming, no caching.
    async fn analyze(
        &self,
        text: &str,
        description: &str,
        language: ReportLanguage,
    ) -> PortResult<AnalysisOutcome> {
        // The no-text condition is answered here with the fixed ERROR
        // outcome instead of a provider round trip.
        if text.trim().is_empty() {
            return Ok(AnalysisOutcome::no_text());
        }

        let user_input = USER_INPUT_TEMPLATE
            .replace("{description}", description)
            .replace("{text}", text)
            .replace("{language}", language.name());

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Infrastructure(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_input)
                .build()
                .map_err(|e| PortError::Infrastructure(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Infrastructure(e.to_string()))?;

        let response = with_timeout(self.timeout, "verification analysis", async {
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
                PortError::AnalysisParse(
                    "analysis response contained no text content".to_string(),
                )
            })?;

        parse_outcome(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_outcome() {
        let raw = r#"{"status": "SUSPICIOUS", "summary": "Dates look off.",
                      "details": "- bad date\n- odd total", "confidence_score": 85}"#;
        let outcome = parse_outcome(raw).unwrap();
        assert_eq!(outcome.status, VerificationStatus::Suspicious);
        assert_eq!(outcome.summary, "Dates look off.");
        assert_eq!(outcome.details, "- bad date\n- odd total");
        assert_eq!(outcome.confidence_score, 85);
    }

    #[test]
    fn parses_fenced_json_with_list_details() {
        let raw = "```json\n{\"status\": \"VERIFIED\", \"summary\": \"ok\", \
                   \"details\": [\"first\", \"second\"], \"confidence_score\": 90}\n```";
        let outcome = parse_outcome(raw).unwrap();
        assert_eq!(outcome.status, VerificationStatus::Verified);
        assert_eq!(outcome.details, "first\nsecond");
    }

    #[test]
    fn unknown_status_maps_to_error() {
        let raw = r#"{"status": "FINE", "summary": "s", "details": "d", "confidence_score": 50}"#;
        let outcome = parse_outcome(raw).unwrap();
        assert_eq!(outcome.status, VerificationStatus::Error);
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let raw = r#"{"status": "VERIFIED", "summary": "s", "details": "d", "confidence_score": 400}"#;
        assert_eq!(parse_outcome(raw).unwrap().confidence_score, 100);

        let raw = r#"{"status": "VERIFIED", "summary": "s", "details": "d", "confidence_score": -3}"#;
        assert_eq!(parse_outcome(raw).unwrap().confidence_score, 0);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = parse_outcome("the document looks fine to me").unwrap_err();
        assert!(matches!(err, PortError::AnalysisParse(_)));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let outcome = parse_outcome("{}").unwrap();
        assert_eq!(outcome.status, VerificationStatus::Error);
        assert_eq!(outcome.summary, "Analysis could not be completed.");
        assert_eq!(outcome.details, "No details available.");
        assert_eq!(outcome.confidence_score, 0);
    }
}
