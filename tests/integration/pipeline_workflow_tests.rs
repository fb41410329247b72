/*!
 * End-to-end pipeline scenarios over mock providers
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use narrato::document::{Document, DocumentFormat, Segmenter};
use narrato::errors::{DocumentError, PipelineError};
use narrato::narration::{Audience, Narrator};
use narrato::pipeline::{NarrationPipeline, PipelineConfig};
use narrato::providers::VoiceConfig;
use narrato::providers::mock::{MockGenerator, MockSpeech};
use narrato::rate_limiter::{FixedWindowRateLimiter, ManualClock};
use narrato::synthesis::Synthesizer;
use crate::common;

fn txt(bytes: Vec<u8>) -> Document {
    Document::new(bytes, DocumentFormat::Txt)
}

#[tokio::test]
async fn test_run_withTwoParagraphs_shouldNarrateBothWithoutNote() -> Result<()> {
    common::init_logging();
    let pipeline = common::mock_pipeline(MockGenerator::working(), MockSpeech::working());
    let document = txt(b"Intro paragraph.\n\nSecond paragraph here.\n\n".to_vec());

    let report = pipeline.run(&document, &Audience::default(), None).await?;

    assert_eq!(report.total_processed, 2);
    assert_eq!(report.total_available, 2);
    assert_eq!(report.truncation_note, None);
    let numbers: Vec<usize> = report.outcomes.iter().map(|o| o.slide_number).collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(report.outcomes[0].original_text, "Intro paragraph.");
    assert_eq!(report.outcomes[1].rewritten_text, "[NARRATED] Second paragraph here.");
    assert!(report.outcomes.iter().all(|o| !o.used_fallback && !o.audio.is_empty()));
    Ok(())
}

#[tokio::test]
async fn test_run_withEightParagraphs_shouldTruncateToBudgetWithNote() -> Result<()> {
    let speech = MockSpeech::working();
    let pipeline = common::mock_pipeline(MockGenerator::working(), speech.clone());

    let report = pipeline
        .run(&txt(common::numbered_paragraphs(8)), &Audience::default(), None)
        .await?;

    assert_eq!(report.outcomes.len(), 5);
    assert_eq!(report.total_processed, 5);
    assert_eq!(report.total_available, 8);
    let note = report.truncation_note.unwrap();
    assert!(note.contains('5') && note.contains('8'));
    assert_eq!(speech.call_count(), 5);
    Ok(())
}

#[tokio::test]
async fn test_run_withOneFailedSynthesis_shouldDropAndRenumber() -> Result<()> {
    let pipeline = common::mock_pipeline(MockGenerator::working(), MockSpeech::failing_on("Paragraph 2"));

    let report = pipeline
        .run(&txt(common::numbered_paragraphs(3)), &Audience::default(), None)
        .await?;

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.outcomes[0].slide_number, 1);
    assert_eq!(report.outcomes[0].original_text, "Paragraph 1.");
    assert_eq!(report.outcomes[1].slide_number, 2);
    assert_eq!(report.outcomes[1].original_text, "Paragraph 3.");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].segment_index, 1);
    Ok(())
}

#[tokio::test]
async fn test_run_whenEverySynthesisFails_shouldFailProcessing() {
    let pipeline = common::mock_pipeline(MockGenerator::working(), MockSpeech::failing());

    let result = pipeline
        .run(&txt(common::numbered_paragraphs(3)), &Audience::default(), None)
        .await;

    assert!(matches!(result, Err(PipelineError::Processing(_))));
}

#[tokio::test]
async fn test_run_withEmptyDocument_shouldSurfaceDocumentError() {
    let generator = MockGenerator::working();
    let pipeline = common::mock_pipeline(generator.clone(), MockSpeech::working());

    let result = pipeline.run(&txt(b" \n\n \n".to_vec()), &Audience::default(), None).await;

    assert!(matches!(result, Err(PipelineError::Document(DocumentError::EmptyContent))));
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_run_withFailingGenerator_shouldStillProduceAudio() -> Result<()> {
    let speech = MockSpeech::working();
    let pipeline = common::mock_pipeline(MockGenerator::failing(), speech.clone());

    let report = pipeline
        .run(&txt(common::txt_bytes(&["Revenue rose. Costs fell. Margins widened."])), &"Executives".into(), None)
        .await?;

    assert_eq!(report.fallback_count(), 1);
    assert_eq!(report.outcomes[0].rewritten_text, "For executives, Revenue rose. Costs fell.");
    assert_eq!(speech.texts(), vec!["For executives, Revenue rose. Costs fell.".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_run_withPptx_shouldNarrateSlidesInDeckOrder() -> Result<()> {
    let bytes = common::pptx_bytes(&[(2, &["Second"]), (10, &["Tenth"]), (1, &["First"])])?;
    let pipeline = common::mock_pipeline(MockGenerator::working(), MockSpeech::working());

    let report = pipeline
        .run(&Document::new(bytes, DocumentFormat::Pptx), &Audience::default(), None)
        .await?;

    let originals: Vec<&str> = report.outcomes.iter().map(|o| o.original_text.as_str()).collect();
    assert_eq!(originals, vec!["First", "Second", "Tenth"]);
    Ok(())
}

#[tokio::test]
async fn test_run_withSharedLimiter_shouldFallBackOnceBudgetIsSpent() -> Result<()> {
    let limiter = Arc::new(FixedWindowRateLimiter::new(
        3,
        Duration::from_secs(60),
        Arc::new(ManualClock::new()),
    ));
    let generator = MockGenerator::working();
    let first = common::mock_pipeline_with_limiter(generator.clone(), MockSpeech::working(), limiter.clone());
    let second = common::mock_pipeline_with_limiter(generator.clone(), MockSpeech::working(), limiter.clone());
    let document = txt(common::numbered_paragraphs(2));

    let first_report = first.run(&document, &Audience::default(), None).await?;
    let second_report = second.run(&document, &Audience::default(), None).await?;

    assert_eq!(first_report.fallback_count(), 0);
    assert_eq!(second_report.fallback_count(), 1);
    assert!(second_report.outcomes[1].used_fallback);
    assert_eq!(generator.call_count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_run_concurrently_shouldKeepDocumentOrderAndReportProgress() -> Result<()> {
    let progress = Arc::new(AtomicUsize::new(0));
    let seen = progress.clone();
    let pipeline = NarrationPipeline::new(
        Segmenter::default(),
        Narrator::new(Arc::new(MockGenerator::slow(20)), Arc::new(FixedWindowRateLimiter::default())),
        Synthesizer::new(Arc::new(MockSpeech::working()), VoiceConfig::linear16_wav("aura-asteria-en")),
        PipelineConfig::default().with_concurrency(4),
    )
    .with_progress(Arc::new(move |_, total| {
        assert_eq!(total, 6);
        seen.fetch_add(1, Ordering::SeqCst);
    }));

    let report = pipeline
        .run(&txt(common::numbered_paragraphs(6)), &Audience::default(), Some(6))
        .await?;

    let originals: Vec<String> = report.outcomes.iter().map(|o| o.original_text.clone()).collect();
    let expected: Vec<String> = (1..=6).map(|i| format!("Paragraph {}.", i)).collect();
    assert_eq!(originals, expected);
    let numbers: Vec<usize> = report.outcomes.iter().map(|o| o.slide_number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(progress.load(Ordering::SeqCst), 6);
    Ok(())
}

#[tokio::test]
async fn test_runWithCancellation_whenAlreadyCancelled_shouldNotCallProviders() {
    let generator = MockGenerator::working();
    let speech = MockSpeech::working();
    let pipeline = common::mock_pipeline(generator.clone(), speech.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = pipeline
        .run_with_cancellation(&txt(common::numbered_paragraphs(3)), &Audience::default(), None, &cancel)
        .await;

    assert!(matches!(result, Err(PipelineError::Cancelled)));
    assert_eq!(generator.call_count(), 0);
    assert_eq!(speech.call_count(), 0);
}
