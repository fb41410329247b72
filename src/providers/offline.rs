/*!
 * Credential-free capabilities.
 *
 * - `DisabledGenerator` refuses every prompt, so narration always takes the
 *   offline rewrite path
 * - `SilentSpeech` renders a silent 16-bit mono PCM WAV whose length follows
 *   the word count of the narration
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::io::Cursor;

use crate::errors::ProviderError;
use crate::providers::{SpeechAudio, SpeechEngine, TextGenerator, VoiceConfig};

/// Generator used when no generative provider is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::Unavailable(
            "no generative provider configured".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Speech engine producing silence
#[derive(Debug, Clone, Copy)]
pub struct SilentSpeech {
    sample_rate: u32,
    millis_per_word: u32,
}

impl Default for SilentSpeech {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            millis_per_word: 350,
        }
    }
}

impl SilentSpeech {
    pub fn new(sample_rate: u32, millis_per_word: u32) -> Self {
        Self {
            sample_rate,
            millis_per_word,
        }
    }

    /// Number of samples for a narration; never shorter than half a second
    pub fn sample_count(&self, text: &str) -> u32 {
        let words = text.split_whitespace().count() as u64;
        let millis = (words * self.millis_per_word as u64).max(500);
        (self.sample_rate as u64 * millis / 1000).min(u32::MAX as u64) as u32
    }

    fn render(&self, samples: u32) -> Result<Vec<u8>, hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for _ in 0..samples {
            writer.write_sample(0i16)?;
        }
        writer.finalize()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait]
impl SpeechEngine for SilentSpeech {
    async fn speak(&self, text: &str, voice: &VoiceConfig) -> Result<SpeechAudio, ProviderError> {
        if voice.container != "wav" {
            return Err(ProviderError::Unavailable(format!(
                "silent speech only renders wav, not {}",
                voice.container
            )));
        }

        let wav = self
            .render(self.sample_count(text))
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        Ok(SpeechAudio {
            data: Bytes::from(wav),
            mime_type: Some("audio/wav".to_string()),
        })
    }

    fn name(&self) -> &str {
        "silent"
    }
}
