//! Reading definitions back out of a managed region.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::ExistingDefinition;

/// One enumerator line: `NAME = 42ULL, /* applies to x; override */`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(0[xX][0-9A-Fa-f]+|\d+)[uUlL]*\s*,?\s*(?:/\*\s*(.*?)\s*\*/)?\s*(?://.*)?$",
    )
    .expect("valid regex")
});

const APPLIES_TO: &str = "applies to ";
const OVERRIDE: &str = "override";

fn parse_number(text: &str) -> Option<u64> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Parse the definitions inside a region interior.
///
/// A `//` line directly above a definition becomes its comment. Every
/// definition starts out as generated; the merger decides authorship.
pub fn parse_definitions(interior: &str) -> Vec<ExistingDefinition> {
    let mut definitions = Vec::new();
    let mut pending_comment: Option<String> = None;

    for line in interior.lines() {
        let trimmed = line.trim();
        if let Some(comment) = trimmed.strip_prefix("//") {
            pending_comment = Some(comment.trim().to_string());
            continue;
        }

        let Some(caps) = DEFINITION.captures(line) else {
            pending_comment = None;
            continue;
        };
        let Some(value) = parse_number(&caps[2]) else {
            tracing::warn!(line = trimmed, "Ignoring definition with out-of-range value");
            pending_comment = None;
            continue;
        };

        let mut applicability = None;
        let mut marked_override = false;
        if let Some(annotation) = caps.get(3) {
            for part in annotation.as_str().split(';').map(str::trim) {
                if part.eq_ignore_ascii_case(OVERRIDE) {
                    marked_override = true;
                } else if let Some(context) = part.strip_prefix(APPLIES_TO) {
                    applicability = Some(context.trim().to_string());
                }
            }
        }

        definitions.push(ExistingDefinition {
            name: caps[1].to_string(),
            value,
            applicability,
            comment: pending_comment.take().filter(|c| !c.is_empty()),
            marked_override,
            is_user_authored: false,
        });
    }

    definitions
}

/// Annotation text for a rendered definition, if any.
pub fn annotation(applicability: Option<&str>, marked_override: bool) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(context) = applicability {
        parts.push(format!("{APPLIES_TO}{context}"));
    }
    if marked_override {
        parts.push(OVERRIDE.to_string());
    }
    (!parts.is_empty()).then(|| parts.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_plain_definitions() {
        let interior = "
/* Autogenerated IANA CBOR Tags (Source: https://example.org) */
typedef enum {
  /* 0-23 : Standards Action */
  // Standard date/time string; Ref: [RFC8949]
  CBOR_TAG_STD_DATE_TIME_STRING = 0ULL,
  CBOR_TAG_EPOCH_DATE_TIME = 1ULL,
} cbor_tag_t;
";
        let defs = parse_definitions(interior);
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].name, "CBOR_TAG_STD_DATE_TIME_STRING");
        assert_eq!(defs[0].value, 0);
        assert_eq!(
            defs[0].comment.as_deref(),
            Some("Standard date/time string; Ref: [RFC8949]")
        );
        assert_eq!(defs[1].comment, None);
        assert!(!defs[1].marked_override);
    }

    #[test]
    fn test_parse_annotations() {
        let interior = "
  COAP_OPTION_IF_MATCH = 1, /* override */
  COAP_SIGNALING_OPTION_MAX_MESSAGE_SIZE = 2, /* applies to 7.01 */
  COAP_SIGNALING_OPTION_CUSTODY = 2, /* applies to 7.03; override */
";
        let defs = parse_definitions(interior);
        assert_eq!(defs.len(), 3);
        assert!(defs[0].marked_override);
        assert_eq!(defs[0].applicability, None);
        assert_eq!(defs[1].applicability.as_deref(), Some("7.01"));
        assert!(!defs[1].marked_override);
        assert_eq!(defs[2].applicability.as_deref(), Some("7.03"));
        assert!(defs[2].marked_override);
    }

    #[test]
    fn test_comment_must_be_adjacent() {
        let interior = "
  // orphaned comment
  /* 24-255 : Specification Required */
  CBOR_TAG_URI = 32ULL,
";
        let defs = parse_definitions(interior);
        assert_eq!(defs[0].comment, None);
    }

    #[test]
    fn test_hand_edited_forms() {
        let interior = "
  MY_TAG=0x20
  OTHER_TAG = 33u, // trailing note
  not a definition = 5,
";
        let defs = parse_definitions(interior);
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].value, 32);
        assert_eq!(defs[1].name, "OTHER_TAG");
        assert_eq!(defs[1].value, 33);
    }

    #[test]
    fn test_annotation_text() {
        assert_eq!(annotation(None, false), None);
        assert_eq!(annotation(None, true).as_deref(), Some("override"));
        assert_eq!(
            annotation(Some("7.xx"), true).as_deref(),
            Some("applies to 7.xx; override")
        );
    }
}
