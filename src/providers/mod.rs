/*!
 * Provider implementations for the external capabilities.
 *
 * The narration core only sees two capabilities:
 * - `TextGenerator`: generative rewrite of a prompt into narration text
 * - `SpeechEngine`: text to encoded audio
 *
 * Client implementations:
 * - Gemini: Google Generative Language API
 * - OpenAI: Chat completions API (and compatible servers)
 * - Ollama: Local LLM server
 * - Deepgram: Aura text-to-speech
 * - Offline: no generator and a silent speech engine for credential-free runs
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the wire-level interface every generative client
/// follows, allowing them to be used interchangeably behind `TextGenerator`.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<Self::Response, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Generative rewrite capability
#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    /// Generate text for a complete prompt
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Verify the provider is reachable; clients without a probe succeed
    async fn check(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Fixed voice settings sent with every speech request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceConfig {
    /// Voice/model identifier
    pub model: String,
    /// Sample encoding
    pub encoding: String,
    /// Audio container
    pub container: String,
}

impl VoiceConfig {
    /// Linear PCM in a WAV container for the given voice
    pub fn linear16_wav(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            encoding: "linear16".to_string(),
            container: "wav".to_string(),
        }
    }
}

/// Encoded audio returned by a speech engine
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechAudio {
    pub data: Bytes,
    /// MIME type reported by the engine, when any
    pub mime_type: Option<String>,
}

/// Speech synthesis capability
#[async_trait]
pub trait SpeechEngine: Send + Sync + Debug {
    async fn speak(&self, text: &str, voice: &VoiceConfig) -> Result<SpeechAudio, ProviderError>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Read an error body for logging, capped to keep log lines readable
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error response text".to_string());
    if text.chars().count() > 500 {
        text.chars().take(500).collect()
    } else {
        text
    }
}

pub mod deepgram;
pub mod gemini;
pub mod mock;
pub mod offline;
pub mod ollama;
pub mod openai;
