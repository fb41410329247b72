/*!
 * Upload, file and folder workflows through the controller
 */

use std::sync::Arc;

use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio_util::sync::CancellationToken;

use narrato::app_config::Config;
use narrato::app_controller::{Controller, FolderSummary, RunOptions, RunStatus};
use narrato::narration::Audience;
use narrato::providers::mock::{MockGenerator, MockSpeech};
use narrato::rate_limiter::FixedWindowRateLimiter;
use crate::common;

fn controller(generator: MockGenerator, speech: MockSpeech) -> Controller {
    Controller::from_parts(
        Config::offline(),
        Arc::new(generator),
        Arc::new(speech),
        Arc::new(FixedWindowRateLimiter::default()),
    )
}

fn options(controller: &Controller) -> RunOptions {
    RunOptions {
        audience: Audience::new("Technical"),
        ..controller.default_options()
    }
}

#[test]
fn test_narrateUpload_withDocx_shouldReturnBase64Audio() -> Result<()> {
    common::init_logging();
    let controller = controller(MockGenerator::working(), MockSpeech::working());
    let bytes = common::docx_bytes(&["Agenda.", "Results."])?;

    let response = tokio_test::block_on(controller.narrate_upload("deck.docx", &bytes, &Audience::default(), None));

    assert_eq!(response.status_code, 200);
    let slides = response.slides();
    assert_eq!(slides.len(), 2);
    assert_eq!(slides[0].slide_number, 1);
    assert_eq!(slides[0].audio_mime_type, "audio/wav");
    assert_eq!(STANDARD.decode(&slides[0].audio_base64)?, MockSpeech::audio_for("[NARRATED] Agenda.").to_vec());
    Ok(())
}

#[tokio::test]
async fn test_narrateUpload_withEmptyText_shouldRespondBadRequest() {
    let controller = controller(MockGenerator::working(), MockSpeech::working());

    let response = controller.narrate_upload("blank.txt", b"\n\n  \n", &Audience::default(), None).await;

    assert_eq!(response.status_code, 400);
    assert!(!response.is_success());
    assert_eq!(response.error(), Some("No text content found in the uploaded file."));
}

#[tokio::test]
async fn test_narrateUpload_withUnsupportedExtension_shouldExplainAcceptedFormats() {
    let controller = controller(MockGenerator::working(), MockSpeech::working());

    let response = controller.narrate_upload("slides.key", b"whatever", &Audience::default(), None).await;

    assert_eq!(response.status_code, 400);
    let error = response.error().unwrap_or_default();
    assert!(error.contains(".docx") && error.contains(".pptx") && error.contains(".txt"));
}

#[tokio::test]
async fn test_narrateUpload_whenAllSynthesisFails_shouldRespondServerError() -> Result<()> {
    let controller = controller(MockGenerator::working(), MockSpeech::failing());

    let response = controller.narrate_upload("notes.txt", b"One.\n\nTwo.", &Audience::default(), None).await;

    assert_eq!(response.status_code, 500);
    let json: serde_json::Value = serde_json::from_str(&response.to_json()?)?;
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().starts_with("Error processing file"));
    Ok(())
}

#[tokio::test]
async fn test_narrateUpload_withLongDocument_shouldIncludeTruncationNote() -> Result<()> {
    let controller = controller(MockGenerator::working(), MockSpeech::working());

    let response = controller
        .narrate_upload("long.txt", &common::numbered_paragraphs(9), &Audience::default(), None)
        .await;

    let json: serde_json::Value = serde_json::from_str(&response.to_json()?)?;
    assert_eq!(json["totalSlides"], 5);
    assert_eq!(json["totalOriginalSlides"], 9);
    assert_eq!(json["note"], "Showing first 5 of 9 slides due to rate limits.");
    Ok(())
}

#[tokio::test]
async fn test_narrateUpload_whenCancelled_shouldNotSucceed() {
    let speech = MockSpeech::working();
    let controller = controller(MockGenerator::working(), speech.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let response = controller
        .narrate_upload_with_cancellation("notes.txt", b"One.\n\nTwo.", &Audience::default(), None, &cancel)
        .await;

    assert!(!response.is_success());
    assert_eq!(speech.call_count(), 0);
}

#[tokio::test]
async fn test_narrateUpload_withBudgetOverride_shouldUseIt() -> Result<()> {
    let controller = controller(MockGenerator::working(), MockSpeech::working());

    let response = controller
        .narrate_upload("long.txt", &common::numbered_paragraphs(9), &Audience::default(), Some(2))
        .await;

    let json: serde_json::Value = serde_json::from_str(&response.to_json()?)?;
    assert_eq!(json["totalSlides"], 2);
    assert_eq!(json["note"], "Showing first 2 of 9 slides due to rate limits.");
    Ok(())
}

#[tokio::test]
async fn test_narrateUpload_onEveryExitPath_shouldDeleteStagedFile() -> Result<()> {
    let upload_dir = common::create_temp_dir()?;
    let staged_files = || std::fs::read_dir(upload_dir.path()).map(|entries| entries.count());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let working = controller(MockGenerator::working(), MockSpeech::working()).with_upload_dir(upload_dir.path());
    let failing_speech = controller(MockGenerator::working(), MockSpeech::failing()).with_upload_dir(upload_dir.path());

    let succeeded = working.narrate_upload("ok.txt", b"One.\n\nTwo.", &Audience::default(), None).await;
    assert_eq!(succeeded.status_code, 200);
    assert_eq!(staged_files()?, 0);

    let empty = working.narrate_upload("blank.txt", b"  \n\n ", &Audience::default(), None).await;
    assert_eq!(empty.status_code, 400);
    assert_eq!(staged_files()?, 0);

    let failed = failing_speech.narrate_upload("notes.txt", b"One.\n\nTwo.", &Audience::default(), None).await;
    assert_eq!(failed.status_code, 500);
    assert_eq!(staged_files()?, 0);

    let cancelled = working
        .narrate_upload_with_cancellation("notes.txt", b"One.", &Audience::default(), None, &cancel)
        .await;
    assert!(!cancelled.is_success());
    assert_eq!(staged_files()?, 0);
    Ok(())
}

#[tokio::test]
async fn test_run_shouldWriteReportAndAudioThenSkip() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_test_file(dir.path(), "talk.txt", b"Hello there.\n\nGoodbye now.")?;
    let audio_dir = dir.path().join("audio");
    let controller = controller(MockGenerator::working(), MockSpeech::working());
    let options = RunOptions {
        audio_dir: Some(audio_dir.clone()),
        ..options(&controller)
    };

    let status = controller.run(input.clone(), None, &options).await?;
    let output_path = dir.path().join("talk.narration.json");
    assert_eq!(status, RunStatus::Completed { output_path: output_path.clone(), slides: 2 });

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output_path)?)?;
    assert_eq!(json["success"], true);
    assert_eq!(json["slides"][1]["originalText"], "Goodbye now.");
    assert!(audio_dir.join("talk.slide-01.wav").is_file());
    assert!(audio_dir.join("talk.slide-02.wav").is_file());

    let again = controller.run(input.clone(), None, &options).await?;
    assert_eq!(again, RunStatus::Skipped { output_path: output_path.clone() });

    let forced = RunOptions { force_overwrite: true, ..options };
    assert!(matches!(controller.run(input, None, &forced).await?, RunStatus::Completed { .. }));
    Ok(())
}

#[tokio::test]
async fn test_run_withMissingInput_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let controller = controller(MockGenerator::working(), MockSpeech::working());

    let result = controller
        .run(dir.path().join("missing.txt"), None, &options(&controller))
        .await;

    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_runFolder_shouldCountProcessedSkippedAndErrors() -> Result<()> {
    let input_dir = common::create_temp_dir()?;
    let output_dir = common::create_temp_dir()?;
    common::create_test_file(input_dir.path(), "a.txt", b"Alpha.")?;
    common::create_test_file(input_dir.path(), "b.txt", b"Beta.")?;
    common::create_test_file(input_dir.path(), "broken.pptx", b"not a zip archive")?;
    common::create_test_file(input_dir.path(), "ignored.pdf", b"%PDF")?;
    common::create_test_file(output_dir.path(), "b.narration.json", b"{}")?;

    let controller = controller(MockGenerator::working(), MockSpeech::working());
    let summary = controller
        .run_folder(
            input_dir.path().to_path_buf(),
            Some(output_dir.path().to_path_buf()),
            &options(&controller),
        )
        .await?;

    assert_eq!(summary, FolderSummary { processed: 1, skipped: 1, errors: 1 });
    assert!(output_dir.path().join("a.narration.json").is_file());
    Ok(())
}

#[tokio::test]
async fn test_runFolder_withoutDocuments_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    common::create_test_file(dir.path(), "readme.md", b"# nothing")?;
    let controller = controller(MockGenerator::working(), MockSpeech::working());

    let result = controller
        .run_folder(dir.path().to_path_buf(), None, &options(&controller))
        .await;

    assert!(result.is_err());
    Ok(())
}
