/*!
 * Speech synthesis of narration text.
 *
 * Voice, encoding and container are fixed at construction so every artifact
 * carries the same `audio/wav` MIME type. Failures are never masked here.
 */

use std::sync::Arc;

use bytes::Bytes;
use log::{debug, warn};

use crate::app_config::SpeechConfig;
use crate::errors::SynthesisError;
use crate::providers::{SpeechEngine, VoiceConfig};

/// MIME type of every artifact
pub const WAV_MIME_TYPE: &str = "audio/wav";

/// Encoded audio for one narration
#[derive(Debug, Clone, PartialEq)]
pub struct AudioArtifact {
    pub bytes: Bytes,
    pub mime_type: String,
}

impl AudioArtifact {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Turns narration text into audio through a speech engine
#[derive(Debug, Clone)]
pub struct Synthesizer {
    engine: Arc<dyn SpeechEngine>,
    voice: VoiceConfig,
}

impl Synthesizer {
    /// Create a synthesizer speaking with `voice`
    pub fn new(engine: Arc<dyn SpeechEngine>, voice: VoiceConfig) -> Self {
        Self { engine, voice }
    }

    /// Create a synthesizer using the configured voice model
    pub fn from_config(engine: Arc<dyn SpeechEngine>, config: &SpeechConfig) -> Self {
        Self::new(engine, VoiceConfig::linear16_wav(&config.model))
    }

    pub fn voice(&self) -> &VoiceConfig {
        &self.voice
    }

    /// Synthesize one narration.
    ///
    /// An engine error or an empty payload is a `SynthesisError`.
    pub async fn synthesize(&self, text: &str) -> Result<AudioArtifact, SynthesisError> {
        let audio = self.engine.speak(text, &self.voice).await?;

        if audio.data.is_empty() {
            return Err(SynthesisError::new(format!(
                "{} returned no audio",
                self.engine.name()
            )));
        }

        if let Some(reported) = audio.mime_type.as_deref() {
            if reported != WAV_MIME_TYPE {
                warn!(
                    "{} reported {} for a wav request, labelling as {}",
                    self.engine.name(),
                    reported,
                    WAV_MIME_TYPE
                );
            }
        }

        debug!("Synthesized {} bytes with {}", audio.data.len(), self.engine.name());
        Ok(AudioArtifact {
            bytes: audio.data,
            mime_type: WAV_MIME_TYPE.to_string(),
        })
    }
}
