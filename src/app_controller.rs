use anyhow::{Context, Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::app_config::{Config, GenerativeProvider, SpeechProvider};
use crate::document::{Document, DocumentFormat, Segmenter};
use crate::errors::{AppError, ProviderError};
use crate::file_utils::{FileManager, ScopedUpload};
use crate::narration::{Audience, Narrator};
use crate::pipeline::{NarrationPipeline, PipelineConfig, PipelineReport};
use crate::providers::deepgram::Deepgram;
use crate::providers::gemini::Gemini;
use crate::providers::offline::{DisabledGenerator, SilentSpeech};
use crate::providers::ollama::Ollama;
use crate::providers::openai::OpenAI;
use crate::providers::{SpeechEngine, TextGenerator};
use crate::rate_limiter::FixedWindowRateLimiter;
use crate::report::NarrationResponse;
use crate::synthesis::Synthesizer;

// @module: Application controller for document narration

/// Per-run options chosen by the caller
#[derive(Debug, Clone)]
pub struct RunOptions {
    // @field: Audience the narration is tailored to
    pub audience: Audience,
    // @field: Segment budget for this run
    pub max_segments: usize,
    // @field: Directory receiving one WAV file per slide
    pub audio_dir: Option<PathBuf>,
    // @field: Overwrite existing reports
    pub force_overwrite: bool,
}

/// What happened to one input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Narrated and written
    Completed { output_path: PathBuf, slides: usize },
    /// Report already present and no force flag
    Skipped { output_path: PathBuf },
}

/// Counts for a folder run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Main application controller for document narration
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Generative capability, kept for connection checks
    generator: Arc<dyn TextGenerator>,
    // @field: Shared pipeline, one rate limiter per controller
    pipeline: NarrationPipeline,
    // @field: Where uploads are staged, system temp dir when unset
    upload_dir: Option<PathBuf>,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let generator = Self::build_generator(&config)?;
        let speech = Self::build_speech(&config);
        let limiter = Arc::new(FixedWindowRateLimiter::from_config(&config.rate_limit));

        info!(
            "Narrating with {} ({}) and {} speech",
            config.generation.provider.display_name(),
            generator.name(),
            speech.name()
        );

        Ok(Self::from_parts(config, generator, speech, limiter))
    }

    /// Create a controller from already built capabilities
    pub fn from_parts(
        config: Config,
        generator: Arc<dyn TextGenerator>,
        speech: Arc<dyn SpeechEngine>,
        limiter: Arc<FixedWindowRateLimiter>,
    ) -> Self {
        let common = &config.generation.common;
        debug!(
            "Generation settings: temperature {}, max tokens {}",
            common.temperature, common.max_tokens
        );

        let pipeline = NarrationPipeline::new(
            Segmenter::default(),
            Narrator::new(generator.clone(), limiter),
            Synthesizer::from_config(speech, &config.speech),
            PipelineConfig::from_settings(&config.pipeline),
        );

        Self {
            config,
            generator,
            pipeline,
            upload_dir: None,
        }
    }

    /// Stage uploads in `dir` instead of the system temp directory
    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Default run options from configuration
    pub fn default_options(&self) -> RunOptions {
        RunOptions {
            audience: Audience::new(&self.config.audience),
            max_segments: self.config.pipeline.max_segments,
            audio_dir: None,
            force_overwrite: false,
        }
    }

    /// Check that the generative provider answers
    pub async fn check_connection(&self) -> Result<()> {
        let provider = self.config.generation.provider.display_name();
        info!("Testing connection to {} ({})", provider, self.generator.name());

        self.generator
            .check()
            .await
            .with_context(|| format!("Connection test failed for {}", provider))?;

        info!("{} is reachable", provider);
        Ok(())
    }

    fn build_generator(config: &Config) -> Result<Arc<dyn TextGenerator>> {
        let generation = &config.generation;
        let common = &generation.common;
        let api_key = generation.get_api_key();
        let endpoint = generation.get_endpoint();
        let model = generation.get_model();
        let timeout_secs = generation.get_timeout_secs();

        let generator: Arc<dyn TextGenerator> = match generation.provider {
            GenerativeProvider::Gemini => Arc::new(
                Gemini::new(api_key, endpoint, model, timeout_secs)
                    .with_generation(common.temperature, common.max_tokens),
            ),
            GenerativeProvider::OpenAI => Arc::new(
                OpenAI::new(api_key, endpoint, model, timeout_secs)
                    .with_system_prompt(&common.system_prompt)
                    .with_generation(common.temperature, common.max_tokens),
            ),
            GenerativeProvider::Ollama => Arc::new(
                Ollama::new(&endpoint, model, timeout_secs)
                    .map_err(|e: ProviderError| anyhow!("Invalid Ollama endpoint: {}", e))?
                    .with_system_prompt(&common.system_prompt)
                    .with_generation(common.temperature, common.max_tokens),
            ),
            GenerativeProvider::None => Arc::new(DisabledGenerator),
        };

        Ok(generator)
    }

    fn build_speech(config: &Config) -> Arc<dyn SpeechEngine> {
        let speech = &config.speech;
        match speech.provider {
            SpeechProvider::Deepgram => Arc::new(Deepgram::new(
                &speech.api_key,
                &speech.endpoint,
                speech.timeout_secs,
            )),
            SpeechProvider::Silent => Arc::new(SilentSpeech::default()),
        }
    }

    /// Narrate an uploaded document and build the transport response.
    ///
    /// The format comes from the file name; unsupported uploads are rejected
    /// before anything is written. The staged copy is deleted on every path.
    /// `max_segments` overrides the configured budget.
    pub async fn narrate_upload(
        &self,
        file_name: &str,
        bytes: &[u8],
        audience: &Audience,
        max_segments: Option<usize>,
    ) -> NarrationResponse {
        self.narrate_upload_with_cancellation(file_name, bytes, audience, max_segments, &CancellationToken::new())
            .await
    }

    /// Same as `narrate_upload`, stopping when `cancel` fires
    pub async fn narrate_upload_with_cancellation(
        &self,
        file_name: &str,
        bytes: &[u8],
        audience: &Audience,
        max_segments: Option<usize>,
        cancel: &CancellationToken,
    ) -> NarrationResponse {
        let format = match DocumentFormat::from_file_name(file_name) {
            Ok(format) => format,
            Err(e) => {
                warn!("Rejected upload {}: {}", file_name, e);
                return NarrationResponse::from_error(&e.into());
            }
        };

        let staged = match self.upload_dir {
            Some(ref dir) => FileManager::stage_upload_in(dir, bytes, format),
            None => FileManager::stage_upload(bytes, format),
        };
        let upload = match staged {
            Ok(upload) => upload,
            Err(e) => return NarrationResponse::from_error(&AppError::File(e.to_string())),
        };

        let result = self.narrate_staged(&upload, audience, max_segments, cancel).await;
        upload.release();

        match result {
            Ok(report) => NarrationResponse::from_report(&report),
            Err(e) => {
                error!("Error processing {}: {}", file_name, e);
                NarrationResponse::from_error(&e)
            }
        }
    }

    async fn narrate_staged(
        &self,
        upload: &ScopedUpload,
        audience: &Audience,
        max_segments: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<PipelineReport, AppError> {
        let path = upload
            .path()
            .ok_or_else(|| AppError::File("Temporary upload is gone".to_string()))?;
        let document = Document::from_path(path)?;

        let report = self
            .pipeline
            .run_with_cancellation(&document, audience, max_segments, cancel)
            .await?;
        Self::log_failures(&report);
        Ok(report)
    }

    fn log_failures(report: &PipelineReport) {
        for failure in &report.failures {
            warn!(
                "Slide from segment {} dropped: {}",
                failure.segment_index + 1,
                failure.message
            );
        }
    }

    /// Run the main workflow for one document, writing a JSON report
    pub async fn run(&self, input_file: PathBuf, output_path: Option<PathBuf>, options: &RunOptions) -> Result<RunStatus> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(&input_file, output_path, options, &multi_progress)
            .await
    }

    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_path: Option<PathBuf>,
        options: &RunOptions,
        multi_progress: &MultiProgress,
    ) -> Result<RunStatus> {
        let start_time = Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = output_path.unwrap_or_else(|| Self::default_output_path(input_file));
        if output_path.exists() && !options.force_overwrite {
            warn!("Skipping file, narration already exists (use -f to force overwrite)");
            return Ok(RunStatus::Skipped { output_path });
        }

        let document = Document::from_path(input_file)
            .with_context(|| format!("Failed to load document: {:?}", input_file))?;

        let progress_bar = multi_progress.add(ProgressBar::new(0));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} slides ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message("Narrating");

        let pb = progress_bar.clone();
        let pipeline = self.pipeline.clone().with_progress(Arc::new(move |completed, total| {
            pb.set_length(total as u64);
            pb.set_position(completed as u64);
        }));

        let result = pipeline
            .run(&document, &options.audience, Some(options.max_segments))
            .await;
        progress_bar.finish_and_clear();

        let report = result.map_err(AppError::from)?;
        Self::log_failures(&report);

        let response = NarrationResponse::from_report(&report);
        let json = response
            .to_json_pretty()
            .context("Failed to serialize narration report")?;
        FileManager::write_to_file(&output_path, &json)?;

        if let Some(ref audio_dir) = options.audio_dir {
            for outcome in &report.outcomes {
                let audio_path = FileManager::generate_audio_path(input_file, audio_dir, outcome.slide_number);
                FileManager::write_bytes(&audio_path, &outcome.audio.bytes)?;
            }
            debug!("Wrote {} audio file(s) to {:?}", report.outcomes.len(), audio_dir);
        }

        if let Some(ref note) = report.truncation_note {
            info!("{}", note);
        }
        info!(
            "Narration written to {:?} in {}",
            output_path,
            Self::format_duration(start_time.elapsed())
        );

        Ok(RunStatus::Completed {
            output_path,
            slides: report.outcomes.len(),
        })
    }

    /// Narrate every supported document under a directory
    pub async fn run_folder(&self, input_dir: PathBuf, output_dir: Option<PathBuf>, options: &RunOptions) -> Result<FolderSummary> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let documents = FileManager::find_documents(&input_dir)?;
        if documents.is_empty() {
            return Err(anyhow!("No .docx, .pptx or .txt files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(documents.len() as u64));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(style.progress_chars("█▓▒░"));

        let mut summary = FolderSummary::default();

        for document in &documents {
            let file_name = document
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_path = output_dir
                .as_ref()
                .map(|dir| FileManager::generate_output_path(document, dir, "narration", "json"));

            match self
                .run_with_progress(document, output_path, options, &multi_progress)
                .await
            {
                Ok(RunStatus::Completed { .. }) => summary.processed += 1,
                Ok(RunStatus::Skipped { .. }) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {}: {}", file_name, e);
                    summary.errors += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");
        info!(
            "Folder processing completed: {} processed, {} skipped, {} errors in {}",
            summary.processed,
            summary.skipped,
            summary.errors,
            Self::format_duration(start_time.elapsed())
        );

        Ok(summary)
    }

    /// Report path next to the input document
    pub fn default_output_path(input_file: &Path) -> PathBuf {
        let dir = input_file.parent().unwrap_or_else(|| Path::new("."));
        FileManager::generate_output_path(input_file, dir, "narration", "json")
    }

    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
