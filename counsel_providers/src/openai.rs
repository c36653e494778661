//! Gateway for OpenAI-compatible chat-completion endpoints.
//!
//! Issues exactly one request per `generate` call; retry policy, if any,
//! belongs to the caller. Whatever shape the provider returns for the
//! message content is normalized into one plain string here, so nothing
//! upstream ever inspects provider-specific response layouts.

use std::time::Duration;

use async_trait::async_trait;
use counsel_core::{ChatMessage, GenerationError, ModelGateway, Role};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct OpenAiGateway {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiGateway {
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        info!("Creating OpenAiGateway for model: {model}");
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
            temperature: 0.5,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn try_send(&self, request: &Value) -> anyhow::Result<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        extract_content(&response)
    }
}

/// Normalize the completion payload into plain text.
///
/// Providers return `message.content` either as a plain string or as a list
/// of typed parts carrying `text` fields; both collapse to one string.
/// Anything else is a malformed response.
fn extract_content(response: &Value) -> anyhow::Result<String> {
    let content = &response["choices"][0]["message"]["content"];

    match content {
        Value::String(text) => Ok(text.clone()),
        Value::Array(parts) => {
            let text: String = parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect();
            if text.is_empty() {
                anyhow::bail!("invalid response format: no text parts in content");
            }
            Ok(text)
        }
        _ => anyhow::bail!("invalid response format: missing content"),
    }
}

#[async_trait]
impl ModelGateway for OpenAiGateway {
    async fn generate(
        &self,
        system_prompt: &str,
        context: &[ChatMessage],
        user_text: &str,
    ) -> Result<String, GenerationError> {
        let mut messages = Vec::with_capacity(context.len() + 2);
        messages.push(ChatMessage::new(Role::System, system_prompt));
        messages.extend_from_slice(context);
        messages.push(ChatMessage::new(Role::User, user_text));

        let request = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": messages,
        });

        info!(
            "Sending completion request: model={}, messages={}",
            self.model,
            messages.len()
        );

        let answer = self.try_send(&request).await.map_err(GenerationError::new)?;

        info!("Received completion response: {} chars", answer.len());
        Ok(answer)
    }
}
