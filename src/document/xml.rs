/*!
 * Minimal XML tokenizer for Office Open XML parts.
 *
 * Only what text extraction needs: element boundaries and the character data
 * between them. Comments, processing instructions and declarations are
 * skipped as opaque text outside any element of interest.
 */

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

// @const: Start, end and empty element tags
static TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)([A-Za-z_][\w.:\-]*)(?:\s[^>]*?)?(/?)>").unwrap());

// @const: Entity and character references
static ENTITY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(?:(amp|lt|gt|quot|apos)|#([0-9]+)|#x([0-9A-Fa-f]+));").unwrap());

/// A lexical unit of an XML part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Opening tag; `empty` is true for `<tag/>`
    Start { name: &'a str, empty: bool },
    /// Closing tag
    End(&'a str),
    /// Raw character data between two tags, still escaped
    Text(&'a str),
}

/// Tokenize an XML document in document order
pub fn tokenize(xml: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    for captures in TAG_REGEX.captures_iter(xml) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        if whole.start() > cursor {
            tokens.push(Token::Text(&xml[cursor..whole.start()]));
        }
        cursor = whole.end();

        let closing = captures.get(1).is_some_and(|m| !m.as_str().is_empty());
        let name = captures.get(2).map_or("", |m| m.as_str());
        let empty = captures.get(3).is_some_and(|m| !m.as_str().is_empty());

        if closing {
            tokens.push(Token::End(name));
        } else {
            tokens.push(Token::Start { name, empty });
        }
    }

    if cursor < xml.len() {
        tokens.push(Token::Text(&xml[cursor..]));
    }
    tokens
}

/// Decode the predefined entities and numeric character references
pub fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    ENTITY_REGEX.replace_all(text, |captures: &regex::Captures<'_>| {
        if let Some(named) = captures.get(1) {
            return match named.as_str() {
                "amp" => "&",
                "lt" => "<",
                "gt" => ">",
                "quot" => "\"",
                _ => "'",
            }
            .to_string();
        }

        let code = match (captures.get(2), captures.get(3)) {
            (Some(decimal), _) => decimal.as_str().parse::<u32>().ok(),
            (None, Some(hex)) => u32::from_str_radix(hex.as_str(), 16).ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| captures[0].to_string())
    })
}

/// Collect the text content of every `run_tag` element, in document order
pub fn text_runs(xml: &str, run_tag: &str) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current: Option<String> = None;

    for token in tokenize(xml) {
        match token {
            Token::Start { name, empty: false } if name == run_tag => {
                current = Some(String::new());
            }
            Token::Text(text) => {
                if let Some(run) = current.as_mut() {
                    run.push_str(&unescape(text));
                }
            }
            Token::End(name) if name == run_tag => {
                if let Some(run) = current.take() {
                    runs.push(run);
                }
            }
            _ => {}
        }
    }
    runs
}
