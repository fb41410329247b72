use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Segment, into_segments};

// @const: Paragraph separator, two or more newlines
static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());

/// Decode plain text bytes, tolerating invalid UTF-8 and a leading BOM
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes)
}

/// Split text into paragraph segments.
///
/// Paragraphs are separated by runs of two or more newlines; sentences inside
/// a paragraph are never split here.
pub fn split_paragraphs(text: &str) -> Vec<Segment> {
    let normalized = if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    };

    into_segments(PARAGRAPH_BREAK.split(&normalized))
}
