//! Query intent classification.
//!
//! Inspects a raw query for the two targeting signals that short-circuit
//! general search: an explicit document reference code, or the name of a
//! configured series. Neither signal is validated against the corpus; a
//! false positive just means one wasted scan stage before the fallbacks.

use tracing::debug;

use crate::config::SeriesMap;
use crate::normalize::normalize;

/// What a raw query was found to be asking for.
#[derive(Debug, Default)]
pub struct QueryIntent<'a> {
    /// First hyphenated token of length >= 7, upper-cased. Heuristic:
    /// reference codes look like `NN-NNNN[letter]`, but the shape is not
    /// enforced beyond hyphen and length.
    pub explicit_reference: Option<String>,
    /// Ordered document identifiers of the matched series, if any
    /// configured series key occurs in the normalized query.
    pub series: Option<&'a [String]>,
}

/// Classify a raw query against the configured series definitions.
///
/// Both signals are reported when present; the retrieval cascade acts on
/// the explicit reference first.
pub fn classify<'a>(query: &str, series: &'a SeriesMap) -> QueryIntent<'a> {
    let explicit_reference = query
        .split_whitespace()
        .find(|token| token.contains('-') && token.len() >= 7)
        .map(str::to_uppercase);

    let query_clean = normalize(query);
    let matched_series = series
        .iter()
        .find(|(key, _)| query_clean.contains(key.as_str()))
        .map(|(_, docs)| docs.as_slice());

    if let Some(code) = &explicit_reference {
        debug!(code = %code, "explicit reference detected");
    }
    if matched_series.is_some() {
        debug!("series detected");
    }

    QueryIntent {
        explicit_reference,
        series: matched_series,
    }
}
