//! Generation collaborator client (chat-completions style).

use async_trait::async_trait;
use serde_json::json;

use manual_core::{Generator, ManualError, ProviderConfig, Result};

use crate::post_json;

/// Remote text generator used for contextual summaries and answer
/// synthesis.
pub struct HttpGenerator {
    config: ProviderConfig,
}

impl HttpGenerator {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

fn parse_generation_response(response: &serde_json::Value) -> Result<String> {
    response
        .get("choices")
        .and_then(|v| v.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            ManualError::collaborator("generation", "response is missing message content")
        })
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "messages": [ { "role": "user", "content": prompt } ],
        });
        let response = post_json(&self.config, "generation", "/chat/completions", &body).await?;
        parse_generation_response(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_message_content() {
        let response = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "Flaps 5." } }
            ]
        });
        assert_eq!(parse_generation_response(&response).unwrap(), "Flaps 5.");
    }

    #[test]
    fn test_empty_choices_is_an_error() {
        let response = serde_json::json!({ "choices": [] });
        assert!(parse_generation_response(&response).is_err());
    }
}
