use std::path::PathBuf;
use std::time::Duration;
use std::{env, fs};

use serde::{Deserialize, Serialize};

use crate::domain::GenerationError;

pub const DEFAULT_PROMPT_TEMPLATE: &str = "Generate a normal length English sentence using the \
     word or phrase '{word}', replacing the target word or phrase with a blank (_____). \
     Difficulty should be {level} based on CEFR. Return only the sentence.";

pub const DEFAULT_HOSTED_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_LOCAL_ENDPOINT: &str = "http://localhost:11434/api/chat";
pub const DEFAULT_LOCAL_MODEL: &str = "gemma3:1b";

const DEFAULT_TEMPERATURE: f32 = 1.5;
const DEFAULT_MAX_RETRIES: u32 = 5;
const DEFAULT_RETRY_WAIT: Duration = Duration::from_secs(30);
const DEFAULT_TRANSPORT_BACKOFF: Duration = Duration::from_secs(3);
// Local inference gets a longer timeout to absorb model warm-up.
const DEFAULT_HOSTED_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_LOCAL_TIMEOUT: Duration = Duration::from_secs(120);

const ENV_PROVIDER: &str = "LLM_PROVIDER";
const ENV_HOSTED_API_KEY: &str = "OPENAI_API_KEY";
const ENV_HOSTED_ENDPOINT: &str = "OPENAI_API_URL";
const ENV_HOSTED_MODEL: &str = "OPENAI_MODEL";
const ENV_HOSTED_TEMPLATE: &str = "OPENAI_PROMPT_TEMPLATE";
const ENV_TEMPERATURE: &str = "OPENAI_TEMPERATURE";
const ENV_MAX_RETRIES: &str = "OPENAI_MAX_RETRIES";
const ENV_RETRY_WAIT_SECS: &str = "OPENAI_RETRY_WAIT_SECS";
const ENV_HOSTED_TIMEOUT_SECS: &str = "OPENAI_TIMEOUT_SECS";
const ENV_LOCAL_ENDPOINT: &str = "OLLAMA_URL";
const ENV_LOCAL_MODEL: &str = "OLLAMA_MODEL";
const ENV_LOCAL_TEMPLATE: &str = "OLLAMA_PROMPT_TEMPLATE";
const ENV_LOCAL_TIMEOUT_SECS: &str = "OLLAMA_TIMEOUT_SECS";

const SETTINGS_DIR: &str = "quizforge";
const SETTINGS_FILE: &str = "settings.json";

/// Which generation backend is active for this run. Exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    HostedApi,
    LocalInference,
}

/// Resolved, validated generation settings. Built once per session and
/// immutable afterwards; constructors of the generation client take it by
/// reference instead of reading globals.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    pub endpoint_url: String,
    pub model_name: String,
    pub api_key: String,
    pub prompt_template: String,
    pub temperature: f32,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_wait: Duration,
    pub transport_backoff: Duration,
}

impl ProviderConfig {
    pub fn hosted(
        endpoint_url: impl Into<String>,
        model_name: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            provider: ProviderKind::HostedApi,
            endpoint_url: endpoint_url.into(),
            model_name: model_name.into(),
            api_key: api_key.into(),
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            request_timeout: DEFAULT_HOSTED_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_wait: DEFAULT_RETRY_WAIT,
            transport_backoff: DEFAULT_TRANSPORT_BACKOFF,
        }
    }

    pub fn local(endpoint_url: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::LocalInference,
            endpoint_url: endpoint_url.into(),
            model_name: model_name.into(),
            api_key: String::new(),
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            request_timeout: DEFAULT_LOCAL_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_wait: DEFAULT_RETRY_WAIT,
            transport_backoff: DEFAULT_TRANSPORT_BACKOFF,
        }
    }

    /// Resolves configuration from the process environment, falling back to
    /// the persisted settings file and then to hardcoded defaults.
    pub fn from_env() -> Self {
        Self::resolve_with(|key| env::var(key).ok(), &SettingsFile::load())
    }

    /// Resolution core, parameterized over the environment lookup so it can
    /// be tested without touching process-global state.
    pub fn resolve_with<E>(env: E, file: &SettingsFile) -> Self
    where
        E: Fn(&str) -> Option<String>,
    {
        let env_value = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let setting = |key: &str, file_value: &Option<String>| {
            env_value(key).or_else(|| {
                file_value
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            })
        };

        let provider = match setting(ENV_PROVIDER, &file.llm_provider)
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "ollama" => ProviderKind::LocalInference,
            _ => ProviderKind::HostedApi,
        };

        let prompt_template = setting(ENV_HOSTED_TEMPLATE, &None)
            .or_else(|| setting(ENV_LOCAL_TEMPLATE, &None))
            .or_else(|| file.prompt_template.clone().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE.to_string());

        // Malformed numeric settings fall back to their defaults rather than
        // failing resolution; only missing credentials block generation.
        let temperature = setting(ENV_TEMPERATURE, &None)
            .and_then(|v| v.parse::<f32>().ok())
            .or(file.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE);
        let max_retries = setting(ENV_MAX_RETRIES, &None)
            .and_then(|v| v.parse::<u32>().ok())
            .or(file.max_retries)
            .unwrap_or(DEFAULT_MAX_RETRIES);
        let retry_wait = setting(ENV_RETRY_WAIT_SECS, &None)
            .and_then(|v| v.parse::<u64>().ok())
            .or(file.retry_wait_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RETRY_WAIT);

        match provider {
            ProviderKind::HostedApi => {
                let request_timeout = setting(ENV_HOSTED_TIMEOUT_SECS, &None)
                    .and_then(|v| v.parse::<u64>().ok())
                    .or(file.hosted_timeout_secs)
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_HOSTED_TIMEOUT);

                Self {
                    provider,
                    endpoint_url: setting(ENV_HOSTED_ENDPOINT, &file.hosted_endpoint)
                        .unwrap_or_else(|| DEFAULT_HOSTED_ENDPOINT.to_string()),
                    model_name: setting(ENV_HOSTED_MODEL, &file.hosted_model).unwrap_or_default(),
                    api_key: setting(ENV_HOSTED_API_KEY, &file.hosted_api_key).unwrap_or_default(),
                    prompt_template,
                    temperature,
                    request_timeout,
                    max_retries,
                    retry_wait,
                    transport_backoff: DEFAULT_TRANSPORT_BACKOFF,
                }
            }
            ProviderKind::LocalInference => {
                let request_timeout = setting(ENV_LOCAL_TIMEOUT_SECS, &None)
                    .and_then(|v| v.parse::<u64>().ok())
                    .or(file.local_timeout_secs)
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_LOCAL_TIMEOUT);

                Self {
                    provider,
                    endpoint_url: setting(ENV_LOCAL_ENDPOINT, &file.local_endpoint)
                        .unwrap_or_else(|| DEFAULT_LOCAL_ENDPOINT.to_string()),
                    model_name: setting(ENV_LOCAL_MODEL, &file.local_model)
                        .unwrap_or_else(|| DEFAULT_LOCAL_MODEL.to_string()),
                    api_key: String::new(),
                    prompt_template,
                    temperature,
                    request_timeout,
                    max_retries,
                    retry_wait,
                    transport_backoff: DEFAULT_TRANSPORT_BACKOFF,
                }
            }
        }
    }

    /// Fails fast, before any network call, when a required credential or
    /// model identifier is absent.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.endpoint_url.trim().is_empty() {
            return Err(GenerationError::configuration_missing(
                "endpoint URL is not configured",
            ));
        }
        if self.model_name.trim().is_empty() {
            return Err(GenerationError::configuration_missing(match self.provider {
                ProviderKind::HostedApi => {
                    "model is not configured. Set OPENAI_MODEL in your environment or settings file"
                }
                ProviderKind::LocalInference => {
                    "model is not configured. Set OLLAMA_MODEL in your environment or settings file"
                }
            }));
        }
        if self.provider == ProviderKind::HostedApi && self.api_key.trim().is_empty() {
            return Err(GenerationError::configuration_missing(
                "API key is not configured. Set OPENAI_API_KEY in your environment or settings file",
            ));
        }
        Ok(())
    }
}

/// Persisted fallback settings. Every field is optional; anything absent here
/// falls back to the hardcoded defaults, and the environment overrides both.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsFile {
    pub llm_provider: Option<String>,
    pub hosted_api_key: Option<String>,
    pub hosted_endpoint: Option<String>,
    pub hosted_model: Option<String>,
    pub hosted_timeout_secs: Option<u64>,
    pub local_endpoint: Option<String>,
    pub local_model: Option<String>,
    pub local_timeout_secs: Option<u64>,
    pub prompt_template: Option<String>,
    pub temperature: Option<f32>,
    pub max_retries: Option<u32>,
    pub retry_wait_secs: Option<u64>,
}

impl SettingsFile {
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(SETTINGS_DIR)
            .join(SETTINGS_FILE)
    }

    /// Loads the settings file, treating a missing or unreadable file as
    /// empty settings so resolution can proceed on defaults.
    pub fn load() -> Self {
        let path = Self::path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(error) => {
                eprintln!("Failed to load {}: {error}. Using defaults.", path.display());
                Self::default()
            }
        }
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
