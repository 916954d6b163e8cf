//! Sermon title extraction and matching.
//!
//! Source documents are named `<reference code> <title>.<ext>`, e.g.
//! `"62-0909E In His Presence.pdf"`. The matcher decides whether a query
//! (or a bare reference code, or a series member identifier) names a given
//! source document. Matching is precision-over-recall: every meaningful
//! title word must appear in the input, so a single common title word in
//! passing never pulls in an unrelated document.

use crate::normalize::{normalize_text, tokenize_meaningful};

/// Strip a trailing file extension (a final dot followed by up to four
/// alphanumeric characters). Anything else is left alone.
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => {
            let ext = &name[idx + 1..];
            if !ext.is_empty() && ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric())
            {
                &name[..idx]
            } else {
                name
            }
        }
        _ => name,
    }
}

/// Extract the strictly-normalized title from a source identifier.
///
/// The extension is stripped; if the first whitespace-delimited segment
/// contains a hyphen it is taken to be a reference-code prefix and
/// discarded.
///
/// `"62-0909E In His Presence.pdf"` becomes `"in his presence"`.
pub fn extract_sermon_title(source: &str) -> String {
    let name = strip_extension(source.trim());
    let title = match name.split_once(char::is_whitespace) {
        Some((first, rest)) if first.contains('-') => rest,
        _ => name,
    };
    normalize_text(title)
}

/// Extract the leading reference code of a source identifier, upper-cased.
///
/// Returns `None` when the leading segment does not look like a code
/// (no hyphen).
pub fn extract_reference_code(source: &str) -> Option<String> {
    let name = strip_extension(source.trim());
    let first = name.split_whitespace().next()?;
    if first.contains('-') {
        Some(first.to_uppercase())
    } else {
        None
    }
}

/// Does `input` name the document identified by `source`?
///
/// True when every meaningful title word of the source appears among the
/// input's meaningful tokens, or when the input is exactly the source's
/// reference code. A source whose extracted title has no meaningful
/// words never matches.
pub fn title_matches(input: &str, source: &str) -> bool {
    let title_tokens = tokenize_meaningful(&extract_sermon_title(source));
    if title_tokens.is_empty() {
        return false;
    }
    let input_tokens = tokenize_meaningful(input);
    if title_tokens.is_subset(&input_tokens) {
        return true;
    }
    // A bare reference code names a document directly even though it
    // shares no words with the title.
    extract_reference_code(source)
        .is_some_and(|code| normalize_text(&code) == normalize_text(input))
}
