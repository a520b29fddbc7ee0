//! Splitting content-format labels into media type components.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::MediaType;

/// Parenthesised notes such as `(TEMPORARY - registered 2023-05-01)`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PAREN_NOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)").expect("valid regex"));

/// Whether a `;`-separated part is a trailing citation rather than a parameter.
fn is_citation(part: &str) -> bool {
    let lower = part.to_ascii_lowercase();
    lower.starts_with("ref:") || lower.starts_with("reference:") || part.starts_with('[')
}

/// Split a content-format label into type, subtype, suffix and parameters.
///
/// Returns `None` when the label has no `type/subtype` head.
///
/// # Examples
/// ```
/// use iana_harvester::parser::parse_media_type;
///
/// let mt = parse_media_type(r#"application/cose; cose-type="cose-encrypt0"; Ref: [RFC9052]"#).unwrap();
/// assert_eq!(mt.type_, "application");
/// assert_eq!(mt.subtype, "cose");
/// assert_eq!(mt.params, vec![("cose-type".to_string(), "cose-encrypt0".to_string())]);
/// ```
#[must_use]
pub fn parse_media_type(label: &str) -> Option<MediaType> {
    let label = PAREN_NOTE.replace_all(label, "");
    let mut parts = label.split(';').map(str::trim);

    let (type_, rest) = parts.next()?.split_once('/')?;
    let (type_, rest) = (type_.trim(), rest.trim());
    if type_.is_empty() || rest.is_empty() {
        return None;
    }
    let (subtype, suffix) = match rest.split_once('+') {
        Some((subtype, suffix)) => (subtype, Some(suffix.to_string())),
        None => (rest, None),
    };

    let params = parts
        .filter(|part| !part.is_empty() && !is_citation(part))
        .filter_map(|part| {
            let (name, value) = part.split_once('=')?;
            Some((
                name.trim().to_string(),
                value.trim().trim_matches('"').to_string(),
            ))
        })
        .collect();

    Some(MediaType {
        type_: type_.to_string(),
        subtype: subtype.to_string(),
        suffix,
        params,
    })
}
