use std::io::{Cursor, Read};

use once_cell::sync::Lazy;
use regex::Regex;
use zip::ZipArchive;

use crate::errors::DocumentError;

use super::{Segment, into_segments, xml};

// @const: Slide part names inside a presentation package
static SLIDE_ENTRY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

/// DrawingML text run element
const TEXT_RUN_TAG: &str = "a:t";

/// Slide part names ordered by slide number.
///
/// Zip iteration order and lexical order both put `slide10` before `slide2`,
/// so the numeric suffix is parsed and sorted on explicitly.
pub fn ordered_slide_entries<'a, I>(names: I) -> Vec<(u32, String)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut entries: Vec<(u32, String)> = names
        .into_iter()
        .filter_map(|name| {
            let number = SLIDE_ENTRY_REGEX.captures(name)?.get(1)?.as_str().parse().ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    entries.sort_by_key(|(number, _)| *number);
    entries
}

/// Text of one slide: its text runs joined with single spaces
pub fn slide_text(slide_xml: &str) -> String {
    xml::text_runs(slide_xml, TEXT_RUN_TAG)
        .iter()
        .map(|run| run.trim())
        .filter(|run| !run.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract one segment per non-blank slide, in slide-number order
pub fn extract_slides(bytes: &[u8]) -> Result<Vec<Segment>, DocumentError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let entries = ordered_slide_entries(archive.file_names());

    let mut texts = Vec::with_capacity(entries.len());
    for (_, name) in entries {
        let mut slide_xml = String::new();
        archive
            .by_name(&name)?
            .read_to_string(&mut slide_xml)
            .map_err(|e| DocumentError::Malformed(format!("{}: {}", name, e)))?;
        texts.push(slide_text(&slide_xml));
    }

    Ok(into_segments(texts))
}
