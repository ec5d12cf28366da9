use super::{CompletionProvider, CompletionRequest, LLMError};
use crate::settings::LlmSettings;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Provider for any endpoint speaking the OpenAI chat-completions protocol
pub struct OpenAICompatibleProvider {
    client: reqwest::Client,
}

impl OpenAICompatibleProvider {
    pub fn new(timeout: Duration) -> Result<Self, LLMError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LLMError::NetworkError(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CompletionProvider for OpenAICompatibleProvider {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn complete(
        &self,
        settings: &LlmSettings,
        request: &CompletionRequest,
    ) -> super::Result<String> {
        let payload = json!({
            "model": settings.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        tracing::debug!(
            "Completion request: model={}, messages={}, total_chars={}",
            settings.model,
            request.messages.len(),
            request.messages.iter().map(|m| m.content.len()).sum::<usize>()
        );

        let mut builder = self
            .client
            .post(&settings.completions_url)
            .header("Content-Type", "application/json")
            .json(&payload);
        if !settings.api_key.is_empty() {
            builder = builder.bearer_auth(&settings.api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| LLMError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(LLMError::AuthenticationFailed(text));
            } else if status.as_u16() == 429 {
                return Err(LLMError::RateLimitExceeded);
            } else {
                return Err(LLMError::InvalidRequest(format!("{}: {}", status, text)));
            }
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let choice = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| LLMError::EmptyResponse("No choices in response".to_string()))?;

        choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| LLMError::ParseError("No message content in choice".to_string()))
    }
}
