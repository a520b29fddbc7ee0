//! C rendering of a registry's managed region.

use std::fmt::Write as _;

use super::existing::annotation;
use crate::catalog::{RangeMarker, RegistrySpec};
use crate::types::{MergedDefinition, Provenance};

const INDENT: &str = "  ";

/// Marker that opens the block of definitions no longer in the registry.
pub const RETAINED_MARKER: &str = "/* Retained: no longer published by the registry */";

fn push_range(out: &mut String, range: &RangeMarker) {
    let _ = writeln!(
        out,
        "{INDENT}/* {}-{} : {} */",
        range.start, range.end, range.description
    );
}

fn push_definition(out: &mut String, spec: &RegistrySpec, definition: &MergedDefinition) {
    if let Some(comment) = definition.comment.as_deref().filter(|c| !c.is_empty()) {
        let _ = writeln!(out, "{INDENT}// {comment}");
    }
    let suffix = spec.literal_suffix.as_deref().unwrap_or_default();
    let _ = write!(
        out,
        "{INDENT}{} = {}{suffix},",
        definition.name, definition.value
    );
    let marked_override = definition.provenance == Provenance::Preserved && !definition.retained;
    if let Some(note) = annotation(definition.applicability.as_deref(), marked_override) {
        let _ = write!(out, " /* {note} */");
    }
    out.push('\n');
}

/// Render the region interior: everything between the two markers.
///
/// The interior starts and ends with a newline so the markers sit on their
/// own lines. Range markers are placed before the first definition at or
/// past their start; retained definitions follow all published ones.
#[must_use]
pub fn render_interior(spec: &RegistrySpec, definitions: &[MergedDefinition]) -> String {
    let mut out = String::from("\n");
    let _ = writeln!(out, "/* {} */", spec.head_comment());
    out.push_str("typedef enum {\n");

    let mut ranges = spec.ranges.iter().peekable();
    let (published, retained): (Vec<&MergedDefinition>, Vec<&MergedDefinition>) =
        definitions.iter().partition(|d| !d.retained);

    for definition in published {
        while let Some(range) = ranges.next_if(|r| r.start <= definition.value) {
            push_range(&mut out, range);
        }
        push_definition(&mut out, spec, definition);
    }
    for range in ranges {
        push_range(&mut out, range);
    }

    if !retained.is_empty() {
        let _ = writeln!(out, "{INDENT}{RETAINED_MARKER}");
        for definition in retained {
            push_definition(&mut out, spec, definition);
        }
    }

    let _ = writeln!(out, "}} {};", spec.typedef);
    out
}

/// Render the feature-flag region interior: `#define NAME NAME`, sorted by name.
#[must_use]
pub fn render_feature_flags(definitions: &[MergedDefinition]) -> String {
    let mut names: Vec<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
    names.sort_unstable();

    let mut out = String::from("\n/* #define the constants so we can check with #ifdef */\n");
    for name in names {
        let _ = writeln!(out, "#define {name} {name}");
    }
    out
}
