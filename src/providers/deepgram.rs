use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, header};
use serde::Serialize;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{SpeechAudio, SpeechEngine, VoiceConfig, error_body};

/// Deepgram client for the Aura text-to-speech API
#[derive(Debug)]
pub struct Deepgram {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL
    endpoint: String,
}

/// Speak request body
#[derive(Debug, Serialize)]
struct SpeakRequest<'a> {
    text: &'a str,
}

impl Deepgram {
    /// Create a new Deepgram client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    fn api_url(&self) -> String {
        let base = if self.endpoint.is_empty() {
            "https://api.deepgram.com"
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/v1/speak", base)
    }

    /// Query parameters selecting voice, encoding and container
    fn query(voice: &VoiceConfig) -> [(&'static str, &str); 3] {
        [
            ("model", voice.model.as_str()),
            ("encoding", voice.encoding.as_str()),
            ("container", voice.container.as_str()),
        ]
    }
}

#[async_trait]
impl SpeechEngine for Deepgram {
    async fn speak(&self, text: &str, voice: &VoiceConfig) -> Result<SpeechAudio, ProviderError> {
        let response = self
            .client
            .post(self.api_url())
            .query(&Self::query(voice))
            .header(header::AUTHORIZATION, format!("Token {}", self.api_key))
            .json(&SpeakRequest { text })
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = error_body(response).await;
            error!("Deepgram TTS error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        let mime_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let data = response
            .bytes()
            .await
            .map_err(ProviderError::from_transport)?;
        debug!("Deepgram returned {} bytes ({:?})", data.len(), mime_type);

        Ok(SpeechAudio { data, mime_type })
    }

    fn name(&self) -> &str {
        "deepgram"
    }
}
