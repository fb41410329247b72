/*!
 * Tests for file utilities and upload staging
 */

use anyhow::Result;
use narrato::document::DocumentFormat;
use narrato::file_utils::FileManager;
use crate::common;

#[test]
fn test_findDocuments_shouldReturnSupportedFilesSorted() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let nested = dir.path().join("nested");
    FileManager::ensure_dir(&nested)?;

    common::create_test_file(dir.path(), "b.txt", b"B.")?;
    common::create_test_file(dir.path(), "a.PPTX", b"not really a deck")?;
    common::create_test_file(dir.path(), "notes.pdf", b"%PDF")?;
    common::create_test_file(dir.path(), "readme", b"no extension")?;
    common::create_test_file(&nested, "c.docx", b"zip")?;

    let found = FileManager::find_documents(dir.path())?;
    let names: Vec<String> = found
        .iter()
        .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
        .collect();

    assert_eq!(names, vec!["a.PPTX", "b.txt", "nested/c.docx"]);
    Ok(())
}

#[test]
fn test_generateAudioPath_shouldPadSlideNumber() {
    let path = FileManager::generate_audio_path("/decks/q3 review.pptx", "/out", 7);
    assert_eq!(path, std::path::PathBuf::from("/out/q3 review.slide-07.wav"));
}

#[test]
fn test_writeBytes_shouldCreateParentDirectories() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let target = dir.path().join("deep").join("er").join("audio.wav");

    FileManager::write_bytes(&target, b"RIFF")?;

    assert!(FileManager::file_exists(&target));
    assert_eq!(std::fs::read(&target)?, b"RIFF");
    Ok(())
}

#[test]
fn test_stageUpload_shouldKeepExtensionUntilReleased() -> Result<()> {
    let upload = FileManager::stage_upload(b"Hello.\n\nWorld.", DocumentFormat::Txt)?;
    let path = upload.path().unwrap().to_path_buf();

    assert_eq!(DocumentFormat::from_path(&path)?, DocumentFormat::Txt);
    assert_eq!(std::fs::read(&path)?, b"Hello.\n\nWorld.");

    upload.release();
    assert!(!path.exists());
    Ok(())
}

#[test]
fn test_stageUpload_droppedWithoutRelease_shouldStillDelete() -> Result<()> {
    let path = {
        let upload = FileManager::stage_upload(b"x", DocumentFormat::Docx)?;
        upload.path().unwrap().to_path_buf()
    };
    assert!(!path.exists());
    Ok(())
}
