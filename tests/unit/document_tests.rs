/*!
 * Tests for document segmentation
 */

use anyhow::Result;
use narrato::document::{Document, DocumentFormat, Segmenter};
use narrato::errors::DocumentError;
use crate::common;

fn texts(document: &Document) -> Result<Vec<String>> {
    Ok(Segmenter::default()
        .segment(document)?
        .iter()
        .map(|s| s.text().to_string())
        .collect())
}

#[test]
fn test_segment_withCrlfText_shouldSplitOnBlankLines() -> Result<()> {
    let document = Document::new(
        b"\xEF\xBB\xBFFirst line\r\nstill first.\r\n\r\nSecond.\r\n".to_vec(),
        DocumentFormat::Txt,
    );

    assert_eq!(texts(&document)?, vec!["First line\nstill first.", "Second."]);
    Ok(())
}

#[test]
fn test_segment_withParagraphWithoutPunctuation_shouldKeepItWhole() -> Result<()> {
    let document = Document::new(common::txt_bytes(&["A heading with no period", "Body."]), DocumentFormat::Txt);
    assert_eq!(texts(&document)?, vec!["A heading with no period", "Body."]);
    Ok(())
}

#[test]
fn test_segment_withDocx_shouldReturnParagraphs() -> Result<()> {
    let bytes = common::docx_bytes(&["Welcome &amp; overview.", "", "Key metrics improved."])?;
    let document = Document::new(bytes, DocumentFormat::Docx);

    assert_eq!(texts(&document)?, vec!["Welcome & overview.", "Key metrics improved."]);
    Ok(())
}

#[test]
fn test_segment_withEmptyDocx_shouldFailEmptyContent() -> Result<()> {
    let document = Document::new(common::docx_bytes(&["", "  "])?, DocumentFormat::Docx);
    let result = Segmenter::default().segment(&document);
    assert!(matches!(result, Err(DocumentError::EmptyContent)));
    Ok(())
}

#[test]
fn test_segment_withElevenSlides_shouldKeepNumericOrder() -> Result<()> {
    // Written in lexical order to make sure zip order is not trusted
    let mut numbers: Vec<u32> = (1..=11).collect();
    numbers.sort_by_key(|n| n.to_string());
    let labels: Vec<String> = numbers.iter().map(|n| format!("Slide {}", n)).collect();
    let slides: Vec<(u32, [&str; 1])> = numbers
        .iter()
        .zip(labels.iter())
        .map(|(n, label)| (*n, [label.as_str()]))
        .collect();
    let slide_refs: Vec<(u32, &[&str])> = slides.iter().map(|(n, runs)| (*n, &runs[..])).collect();

    let document = Document::new(common::pptx_bytes(&slide_refs)?, DocumentFormat::Pptx);
    let expected: Vec<String> = (1..=11).map(|n| format!("Slide {}", n)).collect();

    assert_eq!(texts(&document)?, expected);
    Ok(())
}

#[test]
fn test_segment_withBlankSlide_shouldDropItAndRenumber() -> Result<()> {
    let bytes = common::pptx_bytes(&[
        (1, &["Title", "slide"]),
        (2, &[" "]),
        (3, &["Closing"]),
    ])?;
    let segments = Segmenter::default().segment(&Document::new(bytes, DocumentFormat::Pptx))?;

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].text(), "Title slide");
    assert_eq!(segments[1].index(), 1);
    assert_eq!(segments[1].text(), "Closing");
    Ok(())
}

#[test]
fn test_segment_withTruncatedArchive_shouldFailMalformed() -> Result<()> {
    let mut bytes = common::pptx_bytes(&[(1, &["Hello"])])?;
    bytes.truncate(bytes.len() / 2);

    let result = Segmenter::default().segment(&Document::new(bytes, DocumentFormat::Pptx));
    assert!(matches!(result, Err(DocumentError::Malformed(_))));
    Ok(())
}

#[test]
fn test_documentFormat_shouldRejectPdfBeforeReading() -> Result<()> {
    let dir = common::create_temp_dir()?;
    // Not a PDF at all: parsing it would fail differently
    let path = common::create_test_file(dir.path(), "paper.pdf", b"Intro.\n\nBody.")?;

    let result = Document::from_path(&path);
    assert!(matches!(result, Err(DocumentError::UnsupportedFormat(ext)) if ext == "pdf"));
    Ok(())
}

#[test]
fn test_documentFormat_all_shouldListSupportedExtensions() {
    let extensions: Vec<&str> = DocumentFormat::ALL.iter().map(|f| f.extension()).collect();
    assert_eq!(extensions, vec!["docx", "pptx", "txt"]);
}
