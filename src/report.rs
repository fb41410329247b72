/*!
 * Response body handed to a transport.
 *
 * Success bodies carry every slide with base64 audio; failure bodies carry a
 * human-readable message. The status code travels next to the body and is
 * never serialized.
 */

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::pipeline::{PipelineReport, SlideOutcome};

/// One narrated slide as sent to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlidePayload {
    pub slide_number: usize,
    pub original_text: String,
    pub rewritten_text: String,
    pub audio_base64: String,
    pub audio_mime_type: String,
    pub used_fallback: bool,
}

impl From<&SlideOutcome> for SlidePayload {
    fn from(outcome: &SlideOutcome) -> Self {
        Self {
            slide_number: outcome.slide_number,
            original_text: outcome.original_text.clone(),
            rewritten_text: outcome.rewritten_text.clone(),
            audio_base64: STANDARD.encode(&outcome.audio.bytes),
            audio_mime_type: outcome.audio.mime_type.clone(),
            used_fallback: outcome.used_fallback,
        }
    }
}

/// Body of a successful narration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessBody {
    pub success: bool,
    pub slides: Vec<SlidePayload>,
    /// Slides returned
    pub total_slides: usize,
    /// Segments the document produced
    pub total_original_slides: usize,
    pub note: Option<String>,
}

/// Body of a failed narration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Success(SuccessBody),
    Failure(ErrorBody),
}

/// Response body plus the HTTP status a transport should use
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationResponse {
    pub status_code: u16,
    pub body: ResponseBody,
}

impl NarrationResponse {
    /// Build a 200 response from a finished run
    pub fn from_report(report: &PipelineReport) -> Self {
        let slides: Vec<SlidePayload> = report.outcomes.iter().map(SlidePayload::from).collect();
        Self {
            status_code: 200,
            body: ResponseBody::Success(SuccessBody {
                success: true,
                total_slides: slides.len(),
                slides,
                total_original_slides: report.total_available,
                note: report.truncation_note.clone(),
            }),
        }
    }

    /// Build an error response; document problems are client errors
    pub fn from_error(error: &AppError) -> Self {
        Self {
            status_code: error.status_code(),
            body: ResponseBody::Failure(ErrorBody {
                success: false,
                error: error.to_string(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.body, ResponseBody::Success(_))
    }

    /// Slides of a successful response, empty otherwise
    pub fn slides(&self) -> &[SlidePayload] {
        match &self.body {
            ResponseBody::Success(body) => &body.slides,
            ResponseBody::Failure(_) => &[],
        }
    }

    /// Error message of a failed response
    pub fn error(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Success(_) => None,
            ResponseBody::Failure(body) => Some(&body.error),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.body)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.body)
    }
}
