/*!
 * Mock capability implementations for testing.
 *
 * - `MockGenerator` simulates the generative rewrite capability
 *   (`working`, `failing`, `empty`, `intermittent`, `slow`)
 * - `MockSpeech` simulates the speech capability and can fail on chosen
 *   narrations to exercise slide dropping
 *
 * Clones share their call counters so a test can hand one copy to the
 * pipeline and inspect another.
 */

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::{SpeechAudio, SpeechEngine, TextGenerator, VoiceConfig};

/// Marker placed before the slide text in narration prompts
const SLIDE_CONTENT_MARKER: &str = "Slide content:";

/// Behavior mode for the mock generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns an empty response
    Empty,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Mock generative provider
#[derive(Debug, Clone)]
pub struct MockGenerator {
    behavior: MockBehavior,
    request_count: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
    custom_response: Option<fn(&str) -> String>,
}

impl MockGenerator {
    /// Create a new mock generator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Set a custom response generator for successful calls
    pub fn with_custom_response(mut self, generator: fn(&str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of prompts received so far
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in arrival order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Slide text embedded in a narration prompt, or the whole prompt
    pub fn slide_content(prompt: &str) -> &str {
        prompt
            .split_once(SLIDE_CONTENT_MARKER)
            .map(|(_, rest)| rest.split("\n\n").next().unwrap_or(rest).trim())
            .unwrap_or(prompt)
    }

    fn respond(&self, prompt: &str) -> String {
        match self.custom_response {
            Some(generator) => generator(prompt),
            None => format!("[NARRATED] {}", Self::slide_content(prompt)),
        }
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());

        match self.behavior {
            MockBehavior::Working => Ok(self.respond(prompt)),

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(self.respond(prompt))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Empty => Ok(String::new()),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(self.respond(prompt))
            }
        }
    }

    async fn check(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError(
                "Simulated unreachable provider".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// When the mock speech engine should fail
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechBehavior {
    /// Always returns a small WAV payload
    Working,
    /// Always fails
    Failing,
    /// Fails when the narration contains the given text
    FailingOn(String),
    /// Succeeds with zero bytes
    Empty,
}

/// Mock speech engine
#[derive(Debug, Clone)]
pub struct MockSpeech {
    behavior: SpeechBehavior,
    request_count: Arc<AtomicUsize>,
    texts: Arc<Mutex<Vec<String>>>,
}

impl MockSpeech {
    pub fn new(behavior: SpeechBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            texts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(SpeechBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(SpeechBehavior::Failing)
    }

    pub fn failing_on(pattern: impl Into<String>) -> Self {
        Self::new(SpeechBehavior::FailingOn(pattern.into()))
    }

    pub fn empty() -> Self {
        Self::new(SpeechBehavior::Empty)
    }

    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Narrations received so far, in arrival order
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }

    /// Deterministic fake payload for a narration
    pub fn audio_for(text: &str) -> Bytes {
        let mut payload = b"RIFF".to_vec();
        payload.extend_from_slice(text.as_bytes());
        Bytes::from(payload)
    }
}

#[async_trait]
impl SpeechEngine for MockSpeech {
    async fn speak(&self, text: &str, _voice: &VoiceConfig) -> Result<SpeechAudio, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().push(text.to_string());

        let failure = || ProviderError::ApiError {
            message: "Simulated speech failure".to_string(),
            status_code: 502,
        };

        match &self.behavior {
            SpeechBehavior::Failing => Err(failure()),
            SpeechBehavior::FailingOn(pattern) if text.contains(pattern.as_str()) => Err(failure()),
            SpeechBehavior::Empty => Ok(SpeechAudio {
                data: Bytes::new(),
                mime_type: Some("audio/wav".to_string()),
            }),
            _ => Ok(SpeechAudio {
                data: Self::audio_for(text),
                mime_type: Some("audio/wav".to_string()),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
