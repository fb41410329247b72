/*!
 * Common test utilities for the narrato test suite
 */

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use narrato::document::Segmenter;
use narrato::narration::Narrator;
use narrato::pipeline::{NarrationPipeline, PipelineConfig};
use narrato::providers::VoiceConfig;
use narrato::providers::mock::{MockGenerator, MockSpeech};
use narrato::rate_limiter::FixedWindowRateLimiter;
use narrato::synthesis::Synthesizer;

/// Route library logs to the test harness; safe to call many times
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &[u8]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Plain text with one paragraph per entry
pub fn txt_bytes(paragraphs: &[&str]) -> Vec<u8> {
    paragraphs.join("\n\n").into_bytes()
}

/// `count` numbered paragraphs, "Paragraph 1." through "Paragraph N."
pub fn numbered_paragraphs(count: usize) -> Vec<u8> {
    let paragraphs: Vec<String> = (1..=count).map(|i| format!("Paragraph {}.", i)).collect();
    paragraphs.join("\n\n").into_bytes()
}

fn zip_archive(entries: &[(String, String)]) -> Result<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file("[Content_Types].xml", SimpleFileOptions::default())?;
    writer.write_all(b"<Types/>")?;
    for (name, content) in entries {
        writer.start_file(name.as_str(), SimpleFileOptions::default())?;
        writer.write_all(content.as_bytes())?;
    }
    Ok(writer.finish()?.into_inner())
}

/// Minimal WordprocessingML package with one paragraph per entry
pub fn docx_bytes(paragraphs: &[&str]) -> Result<Vec<u8>> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
        .collect();
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?><w:document><w:body>{}<w:sectPr/></w:body></w:document>",
        body
    );
    zip_archive(&[("word/document.xml".to_string(), document)])
}

/// Minimal PresentationML package; each slide is `(number, text runs)`.
///
/// Entries are written in the given order so tests control zip order.
pub fn pptx_bytes(slides: &[(u32, &[&str])]) -> Result<Vec<u8>> {
    let mut entries = vec![(
        "ppt/slideLayouts/slideLayout1.xml".to_string(),
        "<p:sldLayout><a:t>Layout title</a:t></p:sldLayout>".to_string(),
    )];
    for (number, runs) in slides {
        let body: String = runs
            .iter()
            .map(|run| format!("<a:r><a:rPr lang=\"en-US\"/><a:t>{}</a:t></a:r>", run))
            .collect();
        entries.push((
            format!("ppt/slides/slide{}.xml", number),
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?><p:sld><p:cSld><p:spTree><p:sp><p:txBody><a:p>{}</a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>",
                body
            ),
        ));
    }
    zip_archive(&entries)
}

/// Pipeline over mock capabilities with a fresh default rate limiter
pub fn mock_pipeline(generator: MockGenerator, speech: MockSpeech) -> NarrationPipeline {
    mock_pipeline_with_limiter(generator, speech, Arc::new(FixedWindowRateLimiter::default()))
}

/// Pipeline over mock capabilities sharing the given rate limiter
pub fn mock_pipeline_with_limiter(
    generator: MockGenerator,
    speech: MockSpeech,
    limiter: Arc<FixedWindowRateLimiter>,
) -> NarrationPipeline {
    NarrationPipeline::new(
        Segmenter::default(),
        Narrator::new(Arc::new(generator), limiter),
        Synthesizer::new(Arc::new(speech), VoiceConfig::linear16_wav("aura-asteria-en")),
        PipelineConfig::default(),
    )
}
