use thiserror::Error;

/// How far a failure reaches: a single vocabulary item, or the whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureScope {
    Item,
    Batch,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("prompt template is invalid: {message}")]
    InvalidTemplate { message: String },
    #[error("provider configuration is incomplete: {message}")]
    ConfigurationMissing { message: String },
    #[error("rate limit retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
    #[error("provider transport failed: {message}")]
    Transport { message: String },
    #[error("provider returned an undecodable response: {message}")]
    InvalidResponse { message: String },
    #[error("provider returned an empty response")]
    EmptyResponse,
    #[error("generation was cancelled")]
    Cancelled,
}

impl GenerationError {
    pub fn invalid_template(message: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            message: message.into(),
        }
    }

    pub fn configuration_missing(message: impl Into<String>) -> Self {
        Self::ConfigurationMissing {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn scope(&self) -> FailureScope {
        match self {
            Self::InvalidTemplate { .. } | Self::EmptyResponse => FailureScope::Item,
            Self::ConfigurationMissing { .. }
            | Self::RetriesExhausted { .. }
            | Self::Transport { .. }
            | Self::InvalidResponse { .. }
            | Self::Cancelled => FailureScope::Batch,
        }
    }

    pub fn is_batch_fatal(&self) -> bool {
        self.scope() == FailureScope::Batch
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidTemplate { message } => {
                format!("Prompt template is invalid: {message}")
            }
            Self::ConfigurationMissing { message } => {
                format!("Provider is not configured: {message}")
            }
            Self::RetriesExhausted { attempts } => format!(
                "Maximum retries exceeded after {attempts} attempts. Please try again later."
            ),
            Self::Transport { message } => {
                format!("Could not reach the generation backend: {message}")
            }
            Self::InvalidResponse { message } => {
                format!("The generation backend returned an unusable response: {message}")
            }
            Self::EmptyResponse => "The generation backend returned an empty response.".to_string(),
            Self::Cancelled => "Generation was cancelled.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("vocabulary pool has {available} distractor candidate(s), need at least {needed}")]
    InsufficientPool { available: usize, needed: usize },
}
