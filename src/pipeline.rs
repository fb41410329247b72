/*!
 * Pipeline orchestrator for narrating a document.
 *
 * One run goes through these phases:
 * 1. Segmenting: split the document into segments
 * 2. Processing: narrate then synthesize each segment inside the budget
 * 3. Assembling: restore document order, number the surviving slides
 *
 * A segment whose synthesis fails is dropped from the report. The run only
 * fails when no segment survives.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::app_config::PipelineSettings;
use crate::document::{Document, Segment, Segmenter};
use crate::errors::{PipelineError, SynthesisError};
use crate::narration::{Audience, NarrationResult, Narrator};
use crate::synthesis::{AudioArtifact, Synthesizer};

/// Called with `(completed, total)` after each processed segment
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

type SegmentResult = Result<(NarrationResult, AudioArtifact), SynthesisError>;

/// Configuration for the narration pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Default number of segments narrated per document
    pub max_segments: usize,

    /// Segments in flight at once (1 = strictly sequential)
    pub concurrent_segments: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_segments: 5,
            concurrent_segments: 1,
        }
    }
}

impl PipelineConfig {
    /// Create a pipeline configuration from the application settings.
    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self {
            max_segments: settings.max_segments,
            concurrent_segments: settings.concurrent_segments,
        }
    }

    /// Set the default segment budget.
    pub fn with_max_segments(mut self, max_segments: usize) -> Self {
        self.max_segments = max_segments;
        self
    }

    /// Set how many segments may be processed at once.
    pub fn with_concurrency(mut self, concurrent_segments: usize) -> Self {
        self.concurrent_segments = concurrent_segments;
        self
    }
}

/// Phases of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Segmenting,
    Processing,
    Assembling,
    Done,
}

/// One fully processed slide
#[derive(Debug, Clone, PartialEq)]
pub struct SlideOutcome {
    /// 1-based position among the surviving slides
    pub slide_number: usize,
    /// Index of the source segment
    pub segment_index: usize,
    pub original_text: String,
    pub rewritten_text: String,
    pub audio: AudioArtifact,
    pub used_fallback: bool,
}

/// A segment dropped because its synthesis failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFailure {
    pub segment_index: usize,
    pub message: String,
}

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Surviving slides in document order
    pub outcomes: Vec<SlideOutcome>,

    /// Segments attempted, `min(total_available, max_segments)`
    pub total_processed: usize,

    /// Segments the document produced
    pub total_available: usize,

    /// Present when the budget cut the document short
    pub truncation_note: Option<String>,

    /// Segments dropped during synthesis
    pub failures: Vec<SegmentFailure>,

    /// Wall time of the run
    pub duration: Duration,
}

impl PipelineReport {
    /// Number of slides narrated with the offline rewrite
    pub fn fallback_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.used_fallback).count()
    }

    /// Get a summary of the run.
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("Duration: {:.2}s", self.duration.as_secs_f32()),
            format!("Slides: {} of {} processed", self.outcomes.len(), self.total_processed),
        ];

        if self.fallback_count() > 0 {
            parts.push(format!("Fallback narrations: {}", self.fallback_count()));
        }
        if !self.failures.is_empty() {
            parts.push(format!("Dropped: {}", self.failures.len()));
        }
        if let Some(ref note) = self.truncation_note {
            parts.push(note.clone());
        }

        parts.join(" | ")
    }
}

/// Note shown when fewer segments were processed than available
pub fn truncation_note(total_processed: usize, total_available: usize) -> Option<String> {
    (total_processed < total_available).then(|| {
        format!(
            "Showing first {} of {} slides due to rate limits.",
            total_processed, total_available
        )
    })
}

/// The narration pipeline orchestrator.
#[derive(Clone)]
pub struct NarrationPipeline {
    segmenter: Segmenter,
    narrator: Narrator,
    synthesizer: Synthesizer,
    config: PipelineConfig,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for NarrationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationPipeline")
            .field("narrator", &self.narrator)
            .field("synthesizer", &self.synthesizer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NarrationPipeline {
    pub fn new(
        segmenter: Segmenter,
        narrator: Narrator,
        synthesizer: Synthesizer,
        config: PipelineConfig,
    ) -> Self {
        Self {
            segmenter,
            narrator,
            synthesizer,
            config,
            progress: None,
        }
    }

    /// Report `(completed, total)` after each processed segment
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Narrate a document.
    ///
    /// `max_segments` overrides the configured budget for this run.
    pub async fn run(
        &self,
        document: &Document,
        audience: &Audience,
        max_segments: Option<usize>,
    ) -> Result<PipelineReport, PipelineError> {
        self.run_with_cancellation(document, audience, max_segments, &CancellationToken::new())
            .await
    }

    /// Narrate a document, stopping when `cancel` fires.
    ///
    /// Once cancellation is observed no new segment starts; segments already
    /// in flight finish but their results are discarded.
    pub async fn run_with_cancellation(
        &self,
        document: &Document,
        audience: &Audience,
        max_segments: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<PipelineReport, PipelineError> {
        let start_time = Instant::now();
        let max_segments = max_segments.unwrap_or(self.config.max_segments);

        if max_segments == 0 {
            return Err(PipelineError::Processing(
                "the segment budget must be at least 1".to_string(),
            ));
        }

        // Phase 1: Segmenting
        self.enter(PipelinePhase::Segmenting);
        let segments = self.segmenter.segment(document)?;
        let total_available = segments.len();
        let total_processed = total_available.min(max_segments);
        let truncation_note = truncation_note(total_processed, total_available);
        if let Some(ref note) = truncation_note {
            warn!("{}", note);
        }

        // Phase 2: Processing
        self.enter(PipelinePhase::Processing);
        let selected = &segments[..total_processed];
        let results = if self.config.concurrent_segments <= 1 {
            self.process_sequentially(selected, audience, cancel).await
        } else {
            self.process_concurrently(selected, audience, cancel).await
        };

        if cancel.is_cancelled() {
            info!("Narration cancelled after {} segment(s)", results.len());
            return Err(PipelineError::Cancelled);
        }

        // Phase 3: Assembling
        self.enter(PipelinePhase::Assembling);
        let (outcomes, failures) = assemble(results);

        if outcomes.is_empty() {
            let causes: Vec<String> = failures
                .iter()
                .map(|f| format!("segment {}: {}", f.segment_index + 1, f.message))
                .collect();
            return Err(PipelineError::Processing(format!(
                "no segment could be synthesized ({})",
                causes.join("; ")
            )));
        }

        let report = PipelineReport {
            outcomes,
            total_processed,
            total_available,
            truncation_note,
            failures,
            duration: start_time.elapsed(),
        };

        self.enter(PipelinePhase::Done);
        info!("Narration complete: {}", report.summary());
        Ok(report)
    }

    async fn process_segment(&self, segment: &Segment, audience: &Audience) -> SegmentResult {
        let narration = self.narrator.rewrite(segment, audience).await;
        let audio = self.synthesizer.synthesize(&narration.rewritten_text).await?;
        Ok((narration, audio))
    }

    async fn process_sequentially(
        &self,
        segments: &[Segment],
        audience: &Audience,
        cancel: &CancellationToken,
    ) -> Vec<(usize, SegmentResult)> {
        let mut results = Vec::with_capacity(segments.len());

        for (done, segment) in segments.iter().enumerate() {
            if cancel.is_cancelled() {
                break;
            }
            let result = self.process_segment(segment, audience).await;
            results.push((segment.index(), result));
            self.report_progress(done + 1, segments.len());
        }

        results
    }

    async fn process_concurrently(
        &self,
        segments: &[Segment],
        audience: &Audience,
        cancel: &CancellationToken,
    ) -> Vec<(usize, SegmentResult)> {
        let total = segments.len();
        let completed = AtomicUsize::new(0);

        let results: Vec<Option<(usize, SegmentResult)>> = stream::iter(segments)
            .map(|segment| {
                let completed = &completed;
                async move {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    let result = self.process_segment(segment, audience).await;
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    self.report_progress(done, total);
                    Some((segment.index(), result))
                }
            })
            .buffer_unordered(self.config.concurrent_segments)
            .collect()
            .await;

        results.into_iter().flatten().collect()
    }

    fn report_progress(&self, completed: usize, total: usize) {
        if let Some(ref callback) = self.progress {
            callback(completed, total);
        }
    }

    fn enter(&self, phase: PipelinePhase) {
        debug!("Pipeline phase: {:?}", phase);
    }
}

/// Sort results into document order and number the survivors 1..=K
fn assemble(mut results: Vec<(usize, SegmentResult)>) -> (Vec<SlideOutcome>, Vec<SegmentFailure>) {
    results.sort_by_key(|(index, _)| *index);

    let mut outcomes = Vec::new();
    let mut failures = Vec::new();

    for (segment_index, result) in results {
        match result {
            Ok((narration, audio)) => outcomes.push(SlideOutcome {
                slide_number: outcomes.len() + 1,
                segment_index,
                original_text: narration.original_text,
                rewritten_text: narration.rewritten_text,
                audio,
                used_fallback: narration.used_fallback,
            }),
            Err(error) => {
                warn!("Dropping segment {}: {}", segment_index + 1, error);
                failures.push(SegmentFailure {
                    segment_index,
                    message: error.message,
                });
            }
        }
    }

    (outcomes, failures)
}
