use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::config::ProviderConfig;
use crate::domain::{GenerationError, Notifier};

/// Remote chat-completions backend with bounded retry.
///
/// HTTP 429 and other transport failures run on separate retry counters: rate
/// limiting waits `retry_wait` per attempt, everything else waits the short
/// fixed `transport_backoff`. Both counters are bounded by `max_retries`.
pub struct HostedApiBackend {
    client: Client,
    endpoint_url: String,
    api_key: String,
    model_name: String,
    temperature: f32,
    max_retries: u32,
    retry_wait: Duration,
    transport_backoff: Duration,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: [ChatMessage<'a>; 1],
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

impl HostedApiBackend {
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
            api_key: config.api_key.clone(),
            model_name: config.model_name.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
            retry_wait: config.retry_wait,
            transport_backoff: config.transport_backoff,
        })
    }

    /// Issues the chat-completions request, retrying the identical payload on
    /// throttling and transient transport failures.
    ///
    /// Retry waits are tokio suspension points, so the caller's event loop
    /// keeps running while the backend is throttled. `is_cancelled` is polled
    /// after every wait.
    pub async fn generate(
        &self,
        prompt: &str,
        notifier: &dyn Notifier,
        is_cancelled: &dyn Fn() -> bool,
    ) -> Result<String, GenerationError> {
        let payload = ChatRequest {
            model: &self.model_name,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let mut rate_limit_retries = 0u32;
        let mut transport_failures = 0u32;

        loop {
            if is_cancelled() {
                return Err(GenerationError::Cancelled);
            }

            let sent = self
                .client
                .post(&self.endpoint_url)
                .bearer_auth(&self.api_key)
                .json(&payload)
                .send()
                .await;

            let response = match sent {
                Ok(response) => response,
                Err(error) => {
                    transport_failures += 1;
                    if transport_failures > self.max_retries {
                        return Err(GenerationError::transport(format!(
                            "hosted API request failed: {error}"
                        )));
                    }
                    sleep(self.transport_backoff).await;
                    continue;
                }
            };

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                rate_limit_retries += 1;
                if rate_limit_retries > self.max_retries {
                    return Err(GenerationError::RetriesExhausted {
                        attempts: rate_limit_retries,
                    });
                }
                notifier.info(&format!(
                    "Rate limit reached. Retrying in {} seconds...",
                    self.retry_wait.as_secs()
                ));
                sleep(self.retry_wait).await;
                continue;
            }

            if !response.status().is_success() {
                transport_failures += 1;
                if transport_failures > self.max_retries {
                    return Err(GenerationError::transport(format!(
                        "hosted API returned HTTP {}",
                        response.status()
                    )));
                }
                sleep(self.transport_backoff).await;
                continue;
            }

            let decoded: ChatResponse = response.json().await.map_err(|error| {
                GenerationError::invalid_response(format!(
                    "hosted API response decode failed: {error}"
                ))
            })?;

            let content = decoded
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message.content)
                .ok_or_else(|| {
                    GenerationError::invalid_response(
                        "hosted API response did not include any completion choice",
                    )
                })?;

            // Empty trimmed content still counts as success here; the local
            // backend rejects the same condition with EmptyResponse.
            return Ok(content.trim().to_string());
        }
    }
}
