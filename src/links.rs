//! Read-online links for source documents.

use crate::title::extract_reference_code;

/// Default reader URL; `{code}` is replaced with the document's
/// reference code.
pub const DEFAULT_READ_URL_TEMPLATE: &str =
    "https://www.messagehub.info/en/read.do?ref_num={code}";

/// Build a read-only viewing URL for a source document.
///
/// Returns `None` when the source has no leading reference code.
pub fn reference_link(source: &str, template: &str) -> Option<String> {
    let code = extract_reference_code(source)?;
    Some(template.replace("{code}", &code))
}
