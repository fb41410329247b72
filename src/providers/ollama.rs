use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::providers::{Provider, TextGenerator, error_body};

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model name to use for generation
    model: String,
    /// System message sent with every prompt
    system_prompt: Option<String>,
    /// Options applied to every request
    options: Option<GenerationOptions>,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct GenerationOptions {
    /// Temperature for generation (default: 0.8)
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    #[serde(default)]
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: String,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: Some(false),
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the model options
    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// Normalize an endpoint into a base URL with scheme and port
fn normalize_base_url(endpoint: &str) -> Result<String, ProviderError> {
    let with_scheme = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    };
    let url = Url::parse(&with_scheme)
        .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint {}: {}", endpoint, e)))?;
    let host = url
        .host_str()
        .ok_or_else(|| ProviderError::RequestFailed(format!("Invalid host in endpoint: {}", endpoint)))?;
    let port = url.port().unwrap_or(11434);
    Ok(format!("{}://{}:{}", url.scheme(), host, port))
}

impl Ollama {
    /// Create a new Ollama client
    ///
    /// Ollama speaks HTTP/1.1; connections are kept alive between slides.
    pub fn new(endpoint: &str, model: impl Into<String>, timeout_secs: u64) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: normalize_base_url(endpoint)?,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            model: model.into(),
            system_prompt: None,
            options: None,
        })
    }

    /// Set the system message
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        self.system_prompt = (!system_prompt.is_empty()).then_some(system_prompt);
        self
    }

    /// Set temperature and token limit for every request
    pub fn with_generation(mut self, temperature: f32, num_predict: u32) -> Self {
        self.options = Some(GenerationOptions {
            temperature: Some(temperature),
            num_predict: Some(num_predict),
        });
        self
    }

    /// Get the server version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(ProviderError::from_status(status, error_body(response).await));
        }

        response
            .json::<VersionResponse>()
            .await
            .map(|v| v.version)
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl Provider for Ollama {
    type Request = GenerationRequest;
    type Response = GenerationResponse;

    async fn complete(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = error_body(response).await;
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        parse_generation_response(&response_text)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.version().await.map(|_| ())
    }

    fn extract_text(response: &GenerationResponse) -> String {
        response.response.clone()
    }
}

/// Parse a generate response, accepting the JSONL form some servers stream
/// even when `stream` is false
fn parse_generation_response(response_text: &str) -> Result<GenerationResponse, ProviderError> {
    if let Ok(parsed) = serde_json::from_str::<GenerationResponse>(response_text) {
        return Ok(parsed);
    }

    let mut merged: Option<GenerationResponse> = None;
    for line in response_text.lines().filter(|l| !l.trim().is_empty()) {
        let chunk: GenerationResponse =
            serde_json::from_str(line).map_err(|e| ProviderError::ParseError(e.to_string()))?;
        match merged.as_mut() {
            Some(acc) => {
                acc.response.push_str(&chunk.response);
                acc.done = chunk.done;
                acc.eval_count = chunk.eval_count.or(acc.eval_count);
                acc.prompt_eval_count = chunk.prompt_eval_count.or(acc.prompt_eval_count);
            }
            None => merged = Some(chunk),
        }
    }
    merged.ok_or_else(|| ProviderError::ParseError("Empty response body".to_string()))
}

#[async_trait]
impl TextGenerator for Ollama {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let mut request = GenerationRequest::new(&self.model, prompt);
        if let Some(system) = &self.system_prompt {
            request = request.system(system);
        }
        if let Some(options) = self.options {
            request = request.options(options);
        }
        let response = self.complete(request).await?;
        Ok(Self::extract_text(&response))
    }

    async fn check(&self) -> Result<(), ProviderError> {
        self.test_connection().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
