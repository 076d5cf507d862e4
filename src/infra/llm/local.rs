use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::domain::GenerationError;

use super::hosted::ChatMessage;

/// Local inference server backend (Ollama-style chat endpoint).
///
/// Single-shot: local failures are not transient, so there is no retry loop
/// and any transport error is fatal immediately.
pub struct LocalInferenceBackend {
    client: Client,
    endpoint_url: String,
    model_name: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct LocalChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    options: LocalChatOptions,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct LocalChatOptions {
    temperature: f32,
}

/// Local servers answer with the generated text either nested under
/// `message.content` or as a top-level `content` field, depending on server
/// version. Both shapes are accepted.
#[derive(Debug, Default, Deserialize)]
struct LocalChatResponse {
    #[serde(default)]
    message: Option<LocalChatMessage>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocalChatMessage {
    #[serde(default)]
    content: String,
}

impl LocalChatResponse {
    fn extract_text(self) -> Option<String> {
        if let Some(message) = self.message {
            return Some(message.content);
        }
        self.content
    }
}

impl LocalInferenceBackend {
    pub fn new(config: &ProviderConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| {
                GenerationError::transport(format!("failed to build HTTP client: {error}"))
            })?;

        Ok(Self {
            client,
            endpoint_url: config.endpoint_url.clone(),
            model_name: config.model_name.clone(),
            temperature: config.temperature,
        })
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let payload = LocalChatRequest {
            model: &self.model_name,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            options: LocalChatOptions {
                temperature: self.temperature,
            },
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint_url)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                GenerationError::transport(format!("local inference request failed: {error}"))
            })?;

        if !response.status().is_success() {
            return Err(GenerationError::transport(format!(
                "local inference server returned HTTP {}",
                response.status()
            )));
        }

        let decoded: LocalChatResponse = response.json().await.map_err(|error| {
            GenerationError::invalid_response(format!(
                "local inference response decode failed: {error}"
            ))
        })?;

        let text = decoded
            .extract_text()
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        Ok(text)
    }
}
