//! services/api/src/adapters/risk_llm.rs
//!
//! This module contains the adapter for the legal/compliance risk LLM.
//! It implements the `RiskAnalysisService` port from the `core` crate.

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
use veridoc_core::domain::RiskAnalysis;
use veridoc_core::ports::{PortError, PortResult, RiskAnalysisService};

use crate::adapters::util::{strip_code_fences, with_timeout};

const SYSTEM_INSTRUCTIONS: &str = "You are a document risk analyst. You identify potential \
legal, compliance, or financial risks in documents. Be specific and concise. You always \
answer with a single JSON object and nothing else.";

const USER_INPUT_TEMPLATE: &str = r#"Identify potential legal, compliance, or financial risks in the following {document_type} document.

Document:
---
{text}
---

Respond with a single JSON object with exactly three keys:
- 'risk_score': a number from 0.0 (no risk) to 1.0 (severe risk).
- 'issues_found': a list of strings, one per concrete issue.
- 'recommendations': a list of strings, one per suggested action.

Your JSON response:"#;

/// An adapter that implements `RiskAnalysisService` using an
/// OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiRiskAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiRiskAdapter {
    /// Creates a new `OpenAiRiskAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String, timeout: Duration) -> Self {
        Self {
            client,
            model,
            timeout,
        }
    }
}

/// Parses the model response into a `RiskAnalysis`, clamping the score
/// into [0, 1]. Malformed JSON is an `AnalysisParse` error.
fn parse_risk(raw: &str) -> PortResult<RiskAnalysis> {
    let cleaned = strip_code_fences(raw);
    let mut analysis: RiskAnalysis =
        serde_json::from_str(cleaned).map_err(|e| PortError::AnalysisParse(e.to_string()))?;
    analysis.risk_score = analysis.risk_score.clamp(0.0, 1.0);
    Ok(analysis)
}

#[async_trait]
impl RiskAnalysisService for OpenAiRiskAdapter {
    /// Scores legal/compliance/financial risk in a document.
    async fn assess(&self, text: &str, document_type: &str) -> PortResult<RiskAnalysis> {
        let prompt = USER_INPUT_TEMPLATE
            .replace("{document_type}", document_type)
            .replace("{text}", text);

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Infrastructure(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
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

        let response = with_timeout(self.timeout, "risk analysis", async {
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
                PortError::AnalysisParse("risk response contained no text content".to_string())
            })?;

        parse_risk(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_risk_json() {
        let raw = "```json\n{\"risk_score\": 0.7, \"issues_found\": [\"unlimited liability\"], \
                   \"recommendations\": [\"cap liability\"]}\n```";
        let risk = parse_risk(raw).unwrap();
        assert!((risk.risk_score - 0.7).abs() < f32::EPSILON);
        assert_eq!(risk.issues_found, vec!["unlimited liability"]);
        assert_eq!(risk.recommendations, vec!["cap liability"]);
    }

    #[test]
    fn clamps_out_of_range_score() {
        let raw = r#"{"risk_score": 7.5, "issues_found": [], "recommendations": []}"#;
        assert!((parse_risk(raw).unwrap().risk_score - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn prose_response_is_a_parse_error() {
        let err = parse_risk("This contract is risky.").unwrap_err();
        assert!(matches!(err, PortError::AnalysisParse(_)));
    }
}
