/*!
 * Audience-specific narration of segments.
 *
 * The `Narrator` tries the generative provider through the shared rate
 * limiter and falls back to a deterministic rewrite on any failure. It never
 * returns an error: a degraded narration is reported through `used_fallback`.
 */

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use crate::document::Segment;
use crate::errors::ProviderError;
use crate::providers::TextGenerator;
use crate::rate_limiter::FixedWindowRateLimiter;

pub mod fallback;
pub mod prompts;

pub use fallback::{audience_prefix, fallback_rewrite};
pub use prompts::PromptTemplate;

/// Audience label a narration is tailored to.
///
/// Any label is accepted; the recognized ones also get a lead-in phrase in the
/// offline rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Audience(String);

impl Audience {
    /// Labels with a dedicated offline lead-in
    pub const RECOGNIZED: [&'static str; 4] = ["Students", "Executives", "Technical", "Layperson"];

    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_recognized(&self) -> bool {
        Self::RECOGNIZED.contains(&self.0.as_str())
    }

    /// Offline lead-in for this audience, empty when unrecognized
    pub fn prefix(&self) -> &'static str {
        audience_prefix(&self.0)
    }
}

impl Default for Audience {
    fn default() -> Self {
        Self::new("Students")
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Audience {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for Audience {
    fn from(label: String) -> Self {
        Self(label)
    }
}

/// Why a narration took the offline path
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// The rate limiter refused admission
    RateLimited { retry_after_secs: u64 },
    /// The generative provider failed
    Provider(ProviderError),
    /// The provider answered with blank text
    EmptyResponse,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited { retry_after_secs } => {
                write!(f, "rate limited, window resets in {}s", retry_after_secs)
            }
            Self::Provider(error) => write!(f, "{}", error),
            Self::EmptyResponse => f.write_str("empty response"),
        }
    }
}

/// Which branch produced a narration
#[derive(Debug, Clone, PartialEq)]
pub enum NarrationOutcome {
    /// The generative provider produced the text
    Attempted(String),
    /// The offline rewrite produced the text
    FellBack { text: String, reason: FallbackReason },
}

impl NarrationOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Attempted(text) | Self::FellBack { text, .. } => text,
        }
    }

    pub fn used_fallback(&self) -> bool {
        matches!(self, Self::FellBack { .. })
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Attempted(text) | Self::FellBack { text, .. } => text,
        }
    }
}

/// Narration of one segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationResult {
    pub segment_index: usize,
    pub original_text: String,
    pub rewritten_text: String,
    pub used_fallback: bool,
}

/// Rewrites segments for an audience
#[derive(Debug, Clone)]
pub struct Narrator {
    generator: Arc<dyn TextGenerator>,
    limiter: Arc<FixedWindowRateLimiter>,
    template: PromptTemplate,
}

impl Narrator {
    /// Create a narrator sharing the given process-wide limiter
    pub fn new(generator: Arc<dyn TextGenerator>, limiter: Arc<FixedWindowRateLimiter>) -> Self {
        Self {
            generator,
            limiter,
            template: PromptTemplate::default(),
        }
    }

    /// Replace the prompt template
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Narrate text and report which branch produced it.
    ///
    /// Exactly one limiter admission is consumed per call, whether or not it
    /// is granted.
    pub async fn attempt(&self, text: &str, audience: &Audience) -> NarrationOutcome {
        let fell_back = |reason: FallbackReason| {
            warn!("Using fallback narration ({})", reason);
            NarrationOutcome::FellBack {
                text: fallback_rewrite(text, audience.as_str()),
                reason,
            }
        };

        if let Err(limited) = self.limiter.try_acquire() {
            return fell_back(FallbackReason::RateLimited {
                retry_after_secs: limited.retry_after_secs,
            });
        }

        let prompt = self.template.render(audience.as_str(), text);
        debug!("Requesting narration from {} for {} audience", self.generator.name(), audience);

        match self.generator.generate(&prompt).await {
            Ok(generated) => {
                let generated = generated.trim();
                if generated.is_empty() {
                    fell_back(FallbackReason::EmptyResponse)
                } else {
                    NarrationOutcome::Attempted(generated.to_string())
                }
            }
            Err(error) => fell_back(FallbackReason::Provider(error)),
        }
    }

    /// Narrate one segment; never fails
    pub async fn rewrite(&self, segment: &Segment, audience: &Audience) -> NarrationResult {
        let outcome = self.attempt(segment.text(), audience).await;
        NarrationResult {
            segment_index: segment.index(),
            original_text: segment.text().to_string(),
            used_fallback: outcome.used_fallback(),
            rewritten_text: outcome.into_text(),
        }
    }
}
