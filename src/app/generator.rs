use std::sync::Arc;

use crate::config::{ProviderConfig, ProviderKind};
use crate::domain::{DifficultyLevel, GenerationError, GenerationRequest, Notifier};
use crate::infra::llm::{HostedApiBackend, LocalInferenceBackend};

use super::cancel::CancelToken;

/// Anything that can turn a word into one fill-in-the-blank sentence. The
/// batch runner is generic over this so tests can substitute a stub.
#[allow(async_fn_in_trait)]
pub trait SentenceSource {
    async fn generate(&self, word: &str, cancel: &CancelToken) -> Result<String, GenerationError>;
}

/// Backend variant picked once at configuration-resolution time, so the per
/// item hot path dispatches without inspecting configuration strings.
enum SentenceBackend {
    Hosted(HostedApiBackend),
    Local(LocalInferenceBackend),
}

pub struct SentenceGenerator {
    backend: SentenceBackend,
    prompt_template: String,
    notifier: Arc<dyn Notifier>,
}

impl SentenceGenerator {
    /// Validates the configuration up front: a missing credential or model
    /// name fails here, before any network call is attempted.
    pub fn new(config: &ProviderConfig, notifier: Arc<dyn Notifier>) -> Result<Self, GenerationError> {
        config.validate()?;

        let backend = match config.provider {
            ProviderKind::HostedApi => SentenceBackend::Hosted(HostedApiBackend::new(config)?),
            ProviderKind::LocalInference => {
                SentenceBackend::Local(LocalInferenceBackend::new(config)?)
            }
        };

        Ok(Self {
            backend,
            prompt_template: config.prompt_template.clone(),
            notifier,
        })
    }

    /// One logical generation: draw a difficulty level, render the prompt,
    /// dispatch to the active backend. Retries under the hosted backend
    /// re-send the identical rendered prompt.
    pub async fn generate(
        &self,
        word: &str,
        cancel: &CancelToken,
    ) -> Result<String, GenerationError> {
        let level = DifficultyLevel::random(&mut rand::rng());
        let request = GenerationRequest::render(&self.prompt_template, word, level)?;

        match &self.backend {
            SentenceBackend::Hosted(backend) => {
                backend
                    .generate(&request.rendered_prompt, self.notifier.as_ref(), &|| {
                        cancel.is_cancelled()
                    })
                    .await
            }
            SentenceBackend::Local(backend) => backend.generate(&request.rendered_prompt).await,
        }
    }
}

impl SentenceSource for SentenceGenerator {
    async fn generate(&self, word: &str, cancel: &CancelToken) -> Result<String, GenerationError> {
        SentenceGenerator::generate(self, word, cancel).await
    }
}
