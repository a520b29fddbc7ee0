//! Locating the generator-managed region of a destination file.

use std::ops::Range;
use std::path::Path;

use crate::error::{HarvesterError, Result};

/// Begin marker of a section.
#[must_use]
pub fn begin_marker(section: &str) -> String {
    format!("/* Start of {section} autogenerated section */")
}

/// End marker of a section.
#[must_use]
pub fn end_marker(section: &str) -> String {
    format!("/* End of {section} autogenerated section */")
}

/// Byte range of the region interior, between the two markers.
///
/// The file must contain exactly one begin and one end marker, in that order.
pub fn locate(content: &str, section: &str, path: &Path) -> Result<Range<usize>> {
    let begin = begin_marker(section);
    let end = end_marker(section);

    let begins: Vec<usize> = content.match_indices(&begin).map(|(i, _)| i).collect();
    let ends: Vec<usize> = content.match_indices(&end).map(|(i, _)| i).collect();

    match (begins.as_slice(), ends.as_slice()) {
        ([b], [e]) if b + begin.len() <= *e => Ok(b + begin.len()..*e),
        ([_], [_]) => Err(HarvesterError::conflict(
            path,
            format!("end marker for section '{section}' precedes its begin marker"),
        )),
        ([], []) => Err(HarvesterError::conflict(
            path,
            format!("no managed region for section '{section}'"),
        )),
        (b, e) => Err(HarvesterError::conflict(
            path,
            format!(
                "expected one begin and one end marker for section '{section}', found {} and {}",
                b.len(),
                e.len()
            ),
        )),
    }
}

/// Like [`locate`], but a file with neither marker yields `None`.
///
/// Used for optional regions that are appended on first use.
pub fn locate_optional(content: &str, section: &str, path: &Path) -> Result<Option<Range<usize>>> {
    if !content.contains(&begin_marker(section)) && !content.contains(&end_marker(section)) {
        return Ok(None);
    }
    locate(content, section, path).map(Some)
}

/// Replace the region interior, leaving everything else byte-for-byte intact.
#[must_use]
pub fn splice(content: &str, interior: Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(content.len() + replacement.len());
    out.push_str(&content[..interior.start]);
    out.push_str(replacement);
    out.push_str(&content[interior.end..]);
    out
}
