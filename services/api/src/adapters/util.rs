//! services/api/src/adapters/util.rs
//!
//! Small helpers shared by the LLM adapters.

use std::future::Future;
use std::time::Duration;

use veridoc_core::ports::{PortError, PortResult};

/// Bounds an external call with a deadline. The source design assumed
/// network calls always eventually return; here every provider call gets
/// an explicit timeout that surfaces as an infrastructure error.
pub async fn with_timeout<T, F>(duration: Duration, label: &str, fut: F) -> PortResult<T>
where
    F: Future<Output = PortResult<T>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(PortError::Infrastructure(format!(
            "{label} timed out after {}s",
            duration.as_secs()
        ))),
    }
}

/// Strips a Markdown code fence (```json ... ```) wrapped around a model
/// response so the payload can be parsed as JSON.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"status\": \"VERIFIED\"}\n```";
        assert_eq!(strip_code_fences(raw), "{\"status\": \"VERIFIED\"}");
    }

    #[test]
    fn strips_bare_fence() {
        let raw = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[tokio::test]
    async fn timeout_becomes_infrastructure_error() {
        let result: PortResult<()> = with_timeout(Duration::from_millis(5), "test call", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(PortError::Infrastructure(_))));
    }
}
