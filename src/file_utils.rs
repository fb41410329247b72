use anyhow::{Context, Result};
use log::{debug, error};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use walkdir::WalkDir;

use crate::document::DocumentFormat;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Report path next to the input, or inside output_dir
    // @params: input_file, output_dir, suffix, extension
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        suffix: &str,
        extension: &str,
    ) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default();
        let file_name = format!("{}.{}.{}", stem.to_string_lossy(), suffix, extension);
        output_dir.as_ref().join(file_name)
    }

    // @generates: Audio path for one slide, e.g. deck.slide-03.wav
    pub fn generate_audio_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        audio_dir: P2,
        slide_number: usize,
    ) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default();
        let file_name = format!("{}.slide-{:02}.wav", stem.to_string_lossy(), slide_number);
        audio_dir.as_ref().join(file_name)
    }

    /// Find every supported document under a directory, sorted by path
    pub fn find_documents<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && DocumentFormat::from_path(path).is_ok() {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        Self::write_bytes(path, content.as_bytes())
    }

    /// Write bytes to a file, creating parent directories
    pub fn write_bytes<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))
    }

    /// Stage uploaded bytes in a temporary file carrying the format's extension
    pub fn stage_upload(bytes: &[u8], format: DocumentFormat) -> Result<ScopedUpload> {
        Self::stage_upload_in(std::env::temp_dir(), bytes, format)
    }

    /// Same as `stage_upload`, inside the given directory
    pub fn stage_upload_in<P: AsRef<Path>>(dir: P, bytes: &[u8], format: DocumentFormat) -> Result<ScopedUpload> {
        let mut file = Builder::new()
            .prefix("narrato-upload-")
            .suffix(&format!(".{}", format.extension()))
            .tempfile_in(dir.as_ref())
            .with_context(|| format!("Failed to create temporary upload file in {:?}", dir.as_ref()))?;

        file.write_all(bytes)
            .and_then(|_| file.flush())
            .context("Failed to write temporary upload file")?;

        debug!("Staged {} byte upload at {:?}", bytes.len(), file.path());
        Ok(ScopedUpload { file: Some(file) })
    }
}

/// Temporary copy of an uploaded document.
///
/// `release` deletes the file and logs a failure instead of returning it.
/// Dropping without `release` still deletes the file, silently.
#[derive(Debug)]
pub struct ScopedUpload {
    file: Option<NamedTempFile>,
}

impl ScopedUpload {
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|f| f.path())
    }

    /// Delete the temporary file
    pub fn release(mut self) {
        if let Some(file) = self.file.take() {
            let path = file.path().to_path_buf();
            match file.close() {
                Ok(()) => debug!("Removed temporary upload {:?}", path),
                Err(e) => error!("Failed to remove temporary upload {:?}: {}", path, e),
            }
        }
    }
}
