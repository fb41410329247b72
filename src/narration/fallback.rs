/*!
 * Deterministic offline rewrite used when the generative provider is
 * unavailable or refused.
 */

use once_cell::sync::Lazy;
use regex::Regex;

static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

/// Number of leading sentences kept by the offline rewrite
pub const FALLBACK_SENTENCES: usize = 2;

/// Lead-in phrase for a recognized audience; unknown audiences get none
pub fn audience_prefix(audience: &str) -> &'static str {
    match audience {
        "Students" => "For students, ",
        "Executives" => "For executives, ",
        "Technical" => "From a technical perspective, ",
        "Layperson" => "In simple terms, ",
        _ => "",
    }
}

/// Rewrite a segment without any provider.
///
/// Keeps the first two sentences of `text`, joins them with `". "`, closes
/// with a period and prepends the audience lead-in.
pub fn fallback_rewrite(text: &str, audience: &str) -> String {
    let sentences: Vec<&str> = SENTENCE_BREAK
        .split(text)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .take(FALLBACK_SENTENCES)
        .collect();

    let body = if sentences.is_empty() {
        text.trim().to_string()
    } else {
        sentences.join(". ")
    };

    format!("{}{}.", audience_prefix(audience), body)
}
