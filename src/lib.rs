/*!
 * # narrato
 *
 * A Rust library that turns documents into audience-tailored spoken narration.
 *
 * ## Features
 *
 * - Segment `.pptx` decks by slide and `.docx`/`.txt` documents by paragraph
 * - Rewrite each segment for an audience with a generative provider:
 *   - Google Gemini
 *   - OpenAI (or compatible servers)
 *   - Ollama (local LLM)
 * - Deterministic offline rewrite whenever the provider fails or is rate limited
 * - Speech synthesis with Deepgram Aura, or silent WAV output offline
 * - A bounded per-document budget with partial-failure handling
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `document`: Segmenter and format-specific text extraction
 * - `rate_limiter`: Process-wide fixed-window admission control
 * - `narration`: Narrator, prompt template and offline rewrite
 * - `synthesis`: Synthesizer producing WAV artifacts
 * - `pipeline`: Orchestrator composing the stages into one report
 * - `report`: JSON response body for transports
 * - `providers`: Capability traits and provider clients
 * - `app_config`: Configuration management
 * - `app_controller`: Upload, file and folder workflows
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod narration;
pub mod pipeline;
pub mod providers;
pub mod rate_limiter;
pub mod report;
pub mod synthesis;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use document::{Document, DocumentFormat, Segment, Segmenter};
pub use errors::{AppError, DocumentError, PipelineError, ProviderError, RateLimited, SynthesisError};
pub use narration::{Audience, NarrationOutcome, NarrationResult, Narrator};
pub use pipeline::{NarrationPipeline, PipelineConfig, PipelineReport, SlideOutcome};
pub use rate_limiter::FixedWindowRateLimiter;
pub use report::NarrationResponse;
pub use synthesis::{AudioArtifact, Synthesizer};
