//! Identifier derivation.
//!
//! Maps each [`RegistryEntry`] to an [`IdentifierCandidate`]: a C constant
//! name of the form `PREFIX[_VALUE]_TEXT` plus a documentation comment.
//! The registry's [`NamingFamily`] selects the text heuristic:
//!
//! - `Label`: short names such as `If-Match` or `Not Found`
//! - `Semantics`: CBOR tag prose with citations, cross references and
//!   boilerplate openings
//! - `MediaType`: content-format media types, joined component by component
//!
//! Names that still collide after derivation get a numeric suffix in entry
//! order and a [`Warning::NamingCollision`].

mod abbrev;
mod text;

use std::collections::HashSet;

use crate::catalog::{NamingFamily, RegistrySpec, TableShape};
use crate::parser::code_token;
use crate::types::{IdentifierCandidate, MediaType, RegistryEntry, RegistryValue, Warning};

pub use abbrev::{abbreviate, LONG_NAME_LETTERS};
pub use text::{
    first_clause, identifier_words, strip_citations, strip_tag_boilerplate,
    truncate_cross_reference, unwrap_brackets,
};

/// Candidates for a whole registry, with collision warnings.
#[derive(Debug, Clone, Default)]
pub struct DerivedNames {
    pub candidates: Vec<IdentifierCandidate>,
    pub warnings: Vec<Warning>,
}

/// Name words for free text.
fn text_words(text: &str, family: NamingFamily) -> Vec<String> {
    let text = if family == NamingFamily::Semantics {
        strip_tag_boilerplate(text)
    } else {
        text
    };
    let text = unwrap_brackets(text);
    let text = truncate_cross_reference(text);
    let text = strip_citations(text);

    match family {
        NamingFamily::Semantics => {
            let heading = first_clause(&text).replace(['_', '-'], " ");
            abbreviate(identifier_words(&heading))
        }
        NamingFamily::Label | NamingFamily::MediaType => identifier_words(&text),
    }
}

/// Name words for a media type and optional content coding.
///
/// Parameter and coding words already present earlier are suppressed, so
/// `application/cose; cose-type="cose-encrypt0"` yields
/// `APPLICATION_COSE_ENCRYPT0`.
fn media_type_words(media_type: &MediaType, coding: Option<&str>) -> Vec<String> {
    let mut words = identifier_words(&media_type.type_);
    words.extend(identifier_words(&media_type.subtype));
    if let Some(suffix) = &media_type.suffix {
        words.push("PLUS".to_string());
        words.extend(identifier_words(suffix));
    }

    let extra = media_type
        .params
        .iter()
        .map(|(_, value)| value.as_str())
        .chain(coding);
    for component in extra {
        for word in identifier_words(component) {
            if !words.contains(&word) {
                words.push(word);
            }
        }
    }
    words
}

/// Comment text for an entry: description, content coding and reference.
#[must_use]
pub fn entry_comment(entry: &RegistryEntry) -> String {
    let reference = entry.reference.as_ref().map(|r| format!("Ref: {r}"));
    let parts = [
        entry.value_label.clone(),
        Some(entry.name_source().to_string()),
        entry.qualifier.clone(),
        reference,
    ];
    parts
        .into_iter()
        .flatten()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join("; ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Value token used inside names.
fn value_token(spec: &RegistrySpec, value: u64) -> String {
    if spec.shape == TableShape::DottedCode {
        code_token(value)
    } else {
        value.to_string()
    }
}

/// Derive the candidate for one entry, before collision handling.
///
/// Returns `None` for ranges, and for reserved or unassigned values when the
/// registry does not emit placeholders.
///
/// # Examples
/// ```
/// use iana_harvester::catalog::{builtin_spec, RegistryId};
/// use iana_harvester::naming::derive;
/// use iana_harvester::types::{RegistryEntry, RegistryValue};
///
/// let spec = builtin_spec(RegistryId::CborTags);
/// let entry = RegistryEntry::new(RegistryValue::Single(37), 1)
///     .with_description("Binary UUID ([RFC4122, Section 4.1.2])");
/// assert_eq!(derive(&spec, &entry).unwrap().name, "CBOR_TAG_37_BINARY_UUID");
/// ```
#[must_use]
pub fn derive(spec: &RegistrySpec, entry: &RegistryEntry) -> Option<IdentifierCandidate> {
    let RegistryValue::Single(value) = entry.value else {
        tracing::debug!(registry = %spec.id, value = %entry.value, "Range is not emitted");
        return None;
    };

    let mut parts = vec![spec.prefix.clone()];

    if let Some(token) = entry.status.placeholder_token() {
        if !spec.placeholders {
            tracing::debug!(registry = %spec.id, value, status = token, "Placeholder not emitted");
            return None;
        }
        parts.push(value_token(spec, value));
        parts.push(token.to_string());
    } else {
        let words = match (spec.overrides.get(&value), &entry.media_type) {
            (Some(text), _) => text_words(text, spec.family),
            (None, Some(media_type)) if spec.family == NamingFamily::MediaType => {
                media_type_words(media_type, entry.qualifier.as_deref())
            }
            (None, _) => {
                let mut words = text_words(entry.name_source(), spec.family);
                if spec.family == NamingFamily::MediaType {
                    if let Some(coding) = &entry.qualifier {
                        words.extend(identifier_words(coding));
                    }
                }
                words
            }
        };

        if spec.include_value || words.is_empty() {
            parts.push(value_token(spec, value));
        }
        parts.extend(words);
    }

    if let Some(context) = &entry.applicability {
        parts.extend(identifier_words(context));
    }

    let name = parts.join("_");
    Some(IdentifierCandidate {
        base_name: name.clone(),
        name,
        comment: entry_comment(entry),
        source_value: value,
        applicability: entry.applicability.clone(),
    })
}

/// First free `<name>_<n>` for `n >= 2`.
#[must_use]
pub fn disambiguate(name: &str, taken: &HashSet<String>) -> String {
    (2..)
        .map(|n| format!("{name}_{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// Derive names for every entry and resolve collisions in entry order.
#[must_use]
pub fn derive_all(spec: &RegistrySpec, entries: &[RegistryEntry]) -> DerivedNames {
    let mut derived = DerivedNames::default();
    let mut taken = HashSet::new();

    for entry in entries {
        let Some(mut candidate) = derive(spec, entry) else {
            continue;
        };
        if taken.contains(&candidate.name) {
            let renamed = disambiguate(&candidate.name, &taken);
            tracing::warn!(
                registry = %spec.id,
                name = %candidate.name,
                renamed = %renamed,
                value = candidate.source_value,
                "Name collision"
            );
            derived.warnings.push(Warning::NamingCollision {
                name: candidate.name.clone(),
                renamed_to: renamed.clone(),
                value: candidate.source_value,
            });
            candidate.name = renamed;
        }
        taken.insert(candidate.name.clone());
        derived.candidates.push(candidate);
    }

    derived
}
