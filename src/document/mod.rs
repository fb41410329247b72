/*!
 * Document segmentation.
 *
 * Turns the bytes of an uploaded document into an ordered list of text
 * segments, each of which becomes one narrated slide:
 *
 * - `text`: paragraph splitting shared by `txt` and `docx`
 * - `docx`: structural text extraction from WordprocessingML
 * - `pptx`: per-slide text runs from PresentationML, in slide-number order
 * - `xml`: minimal text-run scanner used by both zip based formats
 */

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use log::debug;

use crate::errors::DocumentError;

pub mod docx;
pub mod pptx;
pub mod text;
pub mod xml;

pub use docx::{DocxTextExtractor, StructuralTextExtractor};

/// Document formats the segmenter understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Docx,
    Pptx,
    Txt,
}

impl DocumentFormat {
    /// All supported formats, in the order they are advertised
    pub const ALL: [DocumentFormat; 3] = [Self::Docx, Self::Pptx, Self::Txt];

    /// Lowercase file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Txt => "txt",
        }
    }

    /// Resolve the format from a file name, using its last extension
    pub fn from_file_name(file_name: &str) -> Result<Self, DocumentError> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or_default();
        extension.parse()
    }

    /// Resolve the format from a path on disk
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_default();
        extension.parse()
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for DocumentFormat {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "docx" => Ok(Self::Docx),
            "pptx" => Ok(Self::Pptx),
            "txt" => Ok(Self::Txt),
            other => Err(DocumentError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Raw document bytes with their declared format
#[derive(Debug, Clone)]
pub struct Document {
    bytes: Vec<u8>,
    format: DocumentFormat,
}

impl Document {
    pub fn new(bytes: Vec<u8>, format: DocumentFormat) -> Self {
        Self { bytes, format }
    }

    /// Read a document from disk.
    ///
    /// The format is resolved from the extension before any byte is read, so an
    /// unsupported file fails without being opened.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let format = DocumentFormat::from_path(path)?;
        let bytes = std::fs::read(path)?;
        Ok(Self { bytes, format })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }
}

/// One contiguous unit of extracted text, narrated as one slide
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    index: usize,
    text: String,
}

impl Segment {
    /// Create a segment from raw text; whitespace-only text yields `None`
    pub fn new(index: usize, text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            index,
            text: trimmed.to_string(),
        })
    }

    /// Zero-based position in document order
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Number raw pieces in document order, dropping the empty ones
pub(crate) fn into_segments<I, S>(pieces: I) -> Vec<Segment>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut segments = Vec::new();
    for piece in pieces {
        if let Some(segment) = Segment::new(segments.len(), piece.as_ref()) {
            segments.push(segment);
        }
    }
    segments
}

/// Splits documents into segments according to their format
#[derive(Clone)]
pub struct Segmenter {
    docx_extractor: Arc<dyn StructuralTextExtractor>,
}

impl fmt::Debug for Segmenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segmenter").finish_non_exhaustive()
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(Arc::new(DocxTextExtractor))
    }
}

impl Segmenter {
    /// Create a segmenter with a custom docx text extractor
    pub fn new(docx_extractor: Arc<dyn StructuralTextExtractor>) -> Self {
        Self { docx_extractor }
    }

    /// Segment a document.
    ///
    /// Fails with `EmptyContent` when nothing but whitespace could be extracted.
    pub fn segment(&self, document: &Document) -> Result<Vec<Segment>, DocumentError> {
        let segments = match document.format() {
            DocumentFormat::Txt => text::split_paragraphs(&text::decode(document.bytes())),
            DocumentFormat::Docx => {
                let plain = self.docx_extractor.extract_text(document.bytes())?;
                text::split_paragraphs(&plain)
            }
            DocumentFormat::Pptx => pptx::extract_slides(document.bytes())?,
        };

        if segments.is_empty() {
            return Err(DocumentError::EmptyContent);
        }

        debug!(
            "Segmented {} document into {} segment(s)",
            document.format(),
            segments.len()
        );
        Ok(segments)
    }
}
