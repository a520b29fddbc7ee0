//! Catalog of supported IANA registries.
//!
//! The set of registry shapes is fixed: every registry is one of the
//! [`RegistryId`] variants, and its [`RegistrySpec`] selects the table
//! shape and naming family used to process it.

mod builtin;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::{HarvesterError, Result};

pub use builtin::{builtin_spec, coap_code};

/// Identifier of a supported registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum RegistryId {
    CoapCodes,
    CoapOptions,
    CoapContentFormats,
    CoapSignalingOptions,
    CborSimpleValues,
    CborTags,
    HttpStatusCodes,
}

impl RegistryId {
    /// Parse a registry identifier from user input.
    ///
    /// # Examples
    /// ```
    /// use iana_harvester::catalog::RegistryId;
    ///
    /// assert_eq!(RegistryId::parse("cbor-tags").unwrap(), RegistryId::CborTags);
    /// assert!(RegistryId::parse("cbor_tags").is_err());
    /// ```
    pub fn parse(id: &str) -> Result<Self> {
        id.parse()
            .map_err(|_| HarvesterError::UnknownRegistry(id.to_string()))
    }

    /// All registries in catalog order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Layout of a registry table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableShape {
    /// One row, one entry.
    Simple,
    /// One row, one entry; values published as `class.detail` codes.
    DottedCode,
    /// One entry per (value, applicability context) pair.
    MultiApplicability,
    /// Label is a media type that is split into its components.
    CompoundKey,
}

/// Naming heuristic family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingFamily {
    /// Short submitter-provided names (option names, status phrases).
    Label,
    /// Free-text semantics with citations and cross-references (CBOR tags).
    Semantics,
    /// Content-format media types.
    MediaType,
}

/// Header aliases for each logical column.
#[derive(Debug, Clone, Copy)]
pub struct Columns {
    pub value: &'static [&'static str],
    pub label: &'static [&'static str],
    pub description: &'static [&'static str],
    pub reference: &'static [&'static str],
    pub applicability: &'static [&'static str],
    pub qualifier: &'static [&'static str],
}

impl Columns {
    pub const NONE: &'static [&'static str] = &[];
}

/// One downloadable document feeding a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Cache slot key, unique across the catalog.
    pub key: String,
    pub url: String,
}

/// Registration-procedure block rendered as a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeMarker {
    pub start: u64,
    pub end: u64,
    pub description: String,
}

impl RangeMarker {
    #[must_use]
    pub fn new(start: u64, end: u64, description: impl Into<String>) -> Self {
        Self {
            start,
            end,
            description: description.into(),
        }
    }
}

/// Everything needed to process one registry.
#[derive(Debug, Clone)]
pub struct RegistrySpec {
    pub id: RegistryId,
    pub title: String,
    /// Human-readable registry page.
    pub source_url: String,
    pub sources: Vec<Source>,
    pub shape: TableShape,
    pub family: NamingFamily,
    pub columns: Columns,
    /// Name prefix, e.g. `CBOR_TAG`.
    pub prefix: String,
    /// C typedef name, e.g. `cbor_tag_t`.
    pub typedef: String,
    /// Managed-region section name.
    pub section: String,
    pub destination: PathBuf,
    pub ranges: Vec<RangeMarker>,
    /// Suffix for integer literals (`ULL` for 64-bit tag numbers).
    pub literal_suffix: Option<String>,
    /// Insert the value into derived names.
    pub include_value: bool,
    /// Emit placeholder names for reserved/unassigned single values.
    pub placeholders: bool,
    /// Drop prior definitions whose value left the registry.
    pub prune: bool,
    /// Fewer entries than this means the document is not what we expect.
    pub min_entries: usize,
    /// Replacement name text per value.
    pub overrides: BTreeMap<u64, String>,
    /// Values never emitted.
    pub exclude: BTreeSet<u64>,
    /// C text written below the banner when the destination is created.
    pub preamble: Option<String>,
    /// Emit a `#define NAME NAME` per definition in a second region so C code
    /// can test for a constant with `#ifdef`.
    pub feature_flags: bool,
}

impl RegistrySpec {
    /// Text of the head comment inside the managed region.
    #[must_use]
    pub fn head_comment(&self) -> String {
        format!("Autogenerated {} (Source: {})", self.title, self.source_url)
    }

    /// Section name of the feature-flag region.
    #[must_use]
    pub fn feature_flag_section(&self) -> String {
        format!("{} feature flag", self.section)
    }
}

/// Built-in specs for every registry.
#[must_use]
pub fn builtin_catalog() -> Vec<RegistrySpec> {
    RegistryId::all().map(builtin_spec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_id_round_trip() {
        for id in RegistryId::all() {
            assert_eq!(RegistryId::parse(id.as_str()).unwrap(), id);
        }
        assert_eq!(RegistryId::CoapSignalingOptions.to_string(), "coap-signaling-options");
    }

    #[test]
    fn test_unknown_registry() {
        let err = RegistryId::parse("dns-types").unwrap_err();
        assert!(matches!(err, HarvesterError::UnknownRegistry(ref id) if id == "dns-types"));
    }

    #[test]
    fn test_catalog_source_keys_unique() {
        let catalog = builtin_catalog();
        let mut keys = BTreeSet::new();
        for spec in &catalog {
            for source in &spec.sources {
                assert!(keys.insert(source.key.clone()), "duplicate key {}", source.key);
            }
        }
    }

    #[test]
    fn test_catalog_destinations_unique() {
        let catalog = builtin_catalog();
        let destinations: BTreeSet<_> = catalog.iter().map(|s| s.destination.clone()).collect();
        assert_eq!(destinations.len(), catalog.len());
    }
}
