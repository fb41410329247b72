/*!
 * Application configuration.
 *
 * Handles the JSON configuration file: defaults for every setting,
 * API keys filled from the environment, and validation.
 */

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Audience label used when a request does not name one
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Pipeline budget settings
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Admission control for the generative provider
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Generative rewrite config
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Speech synthesis config
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Generative provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerativeProvider {
    // @provider: Google Gemini
    #[default]
    Gemini,
    // @provider: OpenAI (or any compatible chat completions server)
    OpenAI,
    // @provider: Ollama
    Ollama,
    // @provider: No generator, every narration uses the offline rewrite
    None,
}

impl GenerativeProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Gemini => "Gemini",
            Self::OpenAI => "OpenAI",
            Self::Ollama => "Ollama",
            Self::None => "None",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Gemini => "gemini".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Ollama => "ollama".to_string(),
            Self::None => "none".to_string(),
        }
    }

    // @returns: Whether the provider needs an API key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::Gemini | Self::OpenAI)
    }
}

impl std::fmt::Display for GenerativeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for GenerativeProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            "none" => Ok(Self::None),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Speech provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpeechProvider {
    // @provider: Deepgram Aura
    #[default]
    Deepgram,
    // @provider: Local silent WAV, for offline runs
    Silent,
}

impl std::fmt::Display for SpeechProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deepgram => write!(f, "deepgram"),
            Self::Silent => write!(f, "silent"),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: GenerativeProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: default_model(provider_type),
            api_key: String::new(),
            endpoint: default_endpoint(provider_type),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Pipeline budget settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineSettings {
    /// Maximum number of segments narrated per document
    #[serde(default = "default_max_segments")]
    pub max_segments: usize,

    /// Segments processed at the same time (1 = strictly sequential)
    #[serde(default = "default_concurrent_segments")]
    pub concurrent_segments: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_segments: default_max_segments(),
            concurrent_segments: default_concurrent_segments(),
        }
    }
}

/// Fixed-window rate limit applied to generative calls
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RateLimitConfig {
    /// Calls allowed per window
    #[serde(default = "default_rate_limit_capacity")]
    pub capacity: u32,

    /// Window length in seconds
    #[serde(default = "default_rate_limit_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: default_rate_limit_capacity(),
            window_secs: default_rate_limit_window_secs(),
        }
    }
}

/// Generative rewrite configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Generative provider to use
    #[serde(default)]
    pub provider: GenerativeProvider,

    /// Available generative providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common generation settings
    #[serde(default)]
    pub common: GenerationCommonConfig,
}

/// Common generation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationCommonConfig {
    /// System prompt for chat style providers
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for GenerationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpeechConfig {
    /// Speech provider to use
    #[serde(default)]
    pub provider: SpeechProvider,

    /// Voice model identifier
    #[serde(default = "default_voice_model")]
    pub model: String,

    /// API key for the service
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL
    #[serde(default = "default_speech_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            provider: SpeechProvider::default(),
            model: default_voice_model(),
            api_key: String::new(),
            endpoint: default_speech_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_audience() -> String {
    "Students".to_string()
}

fn default_max_segments() -> usize {
    5 // Bounds latency and provider cost per document
}

fn default_concurrent_segments() -> usize {
    1
}

fn default_rate_limit_capacity() -> u32 {
    10
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    150
}

fn default_system_prompt() -> String {
    "You are a helpful assistant that rewrites presentation content for specific audiences.".to_string()
}

fn default_voice_model() -> String {
    "aura-asteria-en".to_string()
}

fn default_speech_endpoint() -> String {
    "https://api.deepgram.com".to_string()
}

fn default_model(provider: GenerativeProvider) -> String {
    match provider {
        GenerativeProvider::Gemini => "gemini-1.5-flash".to_string(),
        GenerativeProvider::OpenAI => "gpt-4o-mini".to_string(),
        GenerativeProvider::Ollama => "llama3.2".to_string(),
        GenerativeProvider::None => String::new(),
    }
}

fn default_endpoint(provider: GenerativeProvider) -> String {
    match provider {
        GenerativeProvider::Gemini => "https://generativelanguage.googleapis.com".to_string(),
        GenerativeProvider::OpenAI => "https://api.openai.com/v1".to_string(),
        GenerativeProvider::Ollama => "http://localhost:11434".to_string(),
        GenerativeProvider::None => String::new(),
    }
}

/// Environment variables consulted for empty API keys
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const DEEPGRAM_API_KEY_VAR: &str = "DEEPGRAM_API_KEY";

impl Config {
    /// Configuration that runs without any network provider
    pub fn offline() -> Self {
        let mut config = Self::default();
        config.generation.provider = GenerativeProvider::None;
        config.speech.provider = SpeechProvider::Silent;
        config
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.max_segments == 0 {
            return Err(anyhow!("pipeline.max_segments must be at least 1"));
        }
        if self.pipeline.concurrent_segments == 0 {
            return Err(anyhow!("pipeline.concurrent_segments must be at least 1"));
        }
        if self.rate_limit.capacity == 0 {
            return Err(anyhow!("rate_limit.capacity must be at least 1"));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(anyhow!("rate_limit.window_secs must be at least 1"));
        }

        let provider = self.generation.provider;
        if provider.requires_api_key() && self.generation.get_api_key().is_empty() {
            return Err(anyhow!(
                "API key is required for {} provider",
                provider.display_name()
            ));
        }

        if self.speech.provider == SpeechProvider::Deepgram && self.speech.api_key.is_empty() {
            return Err(anyhow!("API key is required for Deepgram speech provider"));
        }

        Ok(())
    }

    /// Fill empty API keys from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Fill empty API keys from an arbitrary lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for provider_config in self.generation.available_providers.iter_mut() {
            if !provider_config.api_key.is_empty() {
                continue;
            }
            let var = match provider_config.provider_type.as_str() {
                "gemini" => GEMINI_API_KEY_VAR,
                "openai" => OPENAI_API_KEY_VAR,
                _ => continue,
            };
            if let Some(key) = lookup(var).filter(|k| !k.is_empty()) {
                provider_config.api_key = key;
            }
        }

        if self.speech.api_key.is_empty() {
            if let Some(key) = lookup(DEEPGRAM_API_KEY_VAR).filter(|k| !k.is_empty()) {
                self.speech.api_key = key;
            }
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            audience: default_audience(),
            pipeline: PipelineSettings::default(),
            rate_limit: RateLimitConfig::default(),
            generation: GenerationConfig::default(),
            speech: SpeechConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl GenerationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &GenerativeProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        default_model(self.provider)
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        default_endpoint(self.provider)
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or_else(default_timeout_secs)
    }

    /// Set the model of the active provider, adding its entry if missing
    pub fn set_model(&mut self, model: &str) {
        let provider_str = self.provider.to_lowercase_string();
        match self
            .available_providers
            .iter_mut()
            .find(|p| p.provider_type == provider_str)
        {
            Some(provider_config) => provider_config.model = model.to_string(),
            None => {
                let mut provider_config = ProviderConfig::new(self.provider);
                provider_config.model = model.to_string();
                self.available_providers.push(provider_config);
            }
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: GenerativeProvider::default(),
            available_providers: vec![
                ProviderConfig::new(GenerativeProvider::Gemini),
                ProviderConfig::new(GenerativeProvider::OpenAI),
                ProviderConfig::new(GenerativeProvider::Ollama),
            ],
            common: GenerationCommonConfig::default(),
        }
    }
}
