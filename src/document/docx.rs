use std::fmt::Debug;
use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::errors::DocumentError;

use super::xml::{self, Token};

/// Main document part of a WordprocessingML package
const MAIN_DOCUMENT_PART: &str = "word/document.xml";

/// Converts a structured `docx` document into plain text.
///
/// Paragraphs must be separated by a blank line so the paragraph splitter can
/// recover them.
pub trait StructuralTextExtractor: Send + Sync + Debug {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, DocumentError>;
}

/// Reads `word/document.xml` and renders each paragraph followed by a blank line
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxTextExtractor;

impl StructuralTextExtractor for DocxTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, DocumentError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut document_xml = String::new();
        archive
            .by_name(MAIN_DOCUMENT_PART)?
            .read_to_string(&mut document_xml)
            .map_err(|e| DocumentError::Malformed(format!("{}: {}", MAIN_DOCUMENT_PART, e)))?;

        Ok(render_paragraphs(&document_xml))
    }
}

/// Render WordprocessingML body text.
///
/// `w:t` runs are concatenated within their paragraph, `w:tab` becomes a tab
/// and `w:br`/`w:cr` a line break. Deleted text (`w:delText`) is skipped.
/// A paragraph nested in a text box is emitted on its own, before the
/// paragraph that contains it.
pub fn render_paragraphs(document_xml: &str) -> String {
    let mut output = String::new();
    let mut open_paragraphs: Vec<String> = Vec::new();
    let mut in_text_run = false;

    for token in xml::tokenize(document_xml) {
        match token {
            Token::Start { name: "w:p", empty: true } => output.push_str("\n\n"),
            Token::Start { name: "w:p", empty: false } => open_paragraphs.push(String::new()),
            Token::End("w:p") => {
                if let Some(paragraph) = open_paragraphs.pop() {
                    output.push_str(&paragraph);
                    output.push_str("\n\n");
                }
            }
            Token::Start { name: "w:t", empty: false } => in_text_run = true,
            Token::End("w:t") => in_text_run = false,
            token => {
                let Some(paragraph) = open_paragraphs.last_mut() else {
                    continue;
                };
                match token {
                    Token::Start { name: "w:tab", .. } => paragraph.push('\t'),
                    Token::Start { name: "w:br" | "w:cr", .. } => paragraph.push('\n'),
                    Token::Text(text) if in_text_run => paragraph.push_str(&xml::unescape(text)),
                    _ => {}
                }
            }
        }
    }
    output
}
