/*!
 * Error types for the narrato application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 *
 * Propagation rules:
 * - `DocumentError` is returned by the segmenter and reaches the caller unchanged
 * - `RateLimited` and `ProviderError` from the generative capability are absorbed
 *   by the narrator, which falls back to the offline rewrite
 * - `SynthesisError` drops a single slide; only when every slide fails does the
 *   pipeline raise `PipelineError::Processing`
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Human readable message
        message: String,
        /// Seconds until the provider accepts requests again, when known
        retry_after_secs: Option<u64>,
    },

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The request did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The provider answered but the payload carried nothing usable
    #[error("Provider returned an empty response")]
    EmptyResponse,

    /// The capability is not configured in this process
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// Classify a reqwest transport error
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }

    /// Classify an unsuccessful HTTP status
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded {
                message,
                retry_after_secs: None,
            },
            _ => Self::ApiError {
                status_code,
                message,
            },
        }
    }
}

/// Errors that can occur while turning a document into segments
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The declared format is not one of docx, pptx or txt
    #[error("Unsupported file type '{0}'. Please upload .docx, .pptx, or .txt files.")]
    UnsupportedFormat(String),

    /// Extraction produced no usable text
    #[error("No text content found in the uploaded file.")]
    EmptyContent,

    /// The container or its XML could not be read
    #[error("Malformed document: {0}")]
    Malformed(String),

    /// Reading the document from disk failed
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for DocumentError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::Malformed(error.to_string())
    }
}

/// Admission was refused by the rate limiter
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Rate limit exceeded. Please wait {retry_after_secs} seconds before trying again.")]
pub struct RateLimited {
    /// Whole seconds until the current window resets
    pub retry_after_secs: u64,
}

/// Speech synthesis failed for one narration
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Speech synthesis failed: {message}")]
pub struct SynthesisError {
    /// Cause reported by the speech capability
    pub message: String,
}

impl SynthesisError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<ProviderError> for SynthesisError {
    fn from(error: ProviderError) -> Self {
        Self::new(error.to_string())
    }
}

/// Errors that end a whole pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Segmentation failed
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// No slide survived processing
    #[error("Error processing file: {0}")]
    Processing(String),

    /// The caller went away before the run completed
    #[error("Narration was cancelled")]
    Cancelled,
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the narration pipeline
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Whether the failure was caused by the uploaded document itself
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Pipeline(PipelineError::Document(
                DocumentError::UnsupportedFormat(_) | DocumentError::EmptyContent
            ))
        )
    }

    /// HTTP status a transport should answer with
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() { 400 } else { 500 }
    }
}

impl From<DocumentError> for AppError {
    fn from(error: DocumentError) -> Self {
        Self::Pipeline(PipelineError::Document(error))
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
