//! Core data types for the harvester.
//!
//! These types follow a registry row from the parsed table through naming
//! and merging to the definition that ends up in the generated header.

use std::fmt;

use crate::error::HarvesterError;

/// Numeric code assigned by a registry row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegistryValue {
    /// A single assigned code.
    Single(u64),
    /// An inclusive block of codes (usually unassigned or reserved).
    Range(u64, u64),
}

impl RegistryValue {
    /// First code covered by this value.
    #[must_use]
    pub fn start(&self) -> u64 {
        match *self {
            Self::Single(v) | Self::Range(v, _) => v,
        }
    }

    /// The code when this is a single value.
    #[must_use]
    pub fn single(&self) -> Option<u64> {
        match *self {
            Self::Single(v) => Some(v),
            Self::Range(..) => None,
        }
    }
}

impl fmt::Display for RegistryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(v) => write!(f, "{v}"),
            Self::Range(a, b) => write!(f, "{a}-{b}"),
        }
    }
}

/// Registration status of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    Assigned,
    Reserved,
    Unassigned,
    PrivateUse,
    Experimental,
}

impl EntryStatus {
    /// Classify a label or description cell.
    ///
    /// # Examples
    /// ```
    /// use iana_harvester::types::EntryStatus;
    ///
    /// assert_eq!(EntryStatus::classify("Unassigned"), EntryStatus::Unassigned);
    /// assert_eq!(EntryStatus::classify("Reserved for future use"), EntryStatus::Reserved);
    /// assert_eq!(EntryStatus::classify("Binary UUID"), EntryStatus::Assigned);
    /// ```
    #[must_use]
    pub fn classify(text: &str) -> Self {
        let lower = text.trim().to_lowercase();
        if lower == "unassigned" {
            Self::Unassigned
        } else if lower.starts_with("private use") || lower.starts_with("reserved for private") {
            Self::PrivateUse
        } else if lower.starts_with("reserved")
            || lower.starts_with("earmarked")
            || lower == "(reserved)"
        {
            Self::Reserved
        } else if lower.starts_with("experimental") {
            Self::Experimental
        } else {
            Self::Assigned
        }
    }

    /// Token used for placeholder names.
    #[must_use]
    pub fn placeholder_token(&self) -> Option<&'static str> {
        match self {
            Self::Assigned => None,
            Self::Reserved => Some("RESERVED"),
            Self::Unassigned => Some("UNASSIGNED"),
            Self::PrivateUse => Some("PRIVATE_USE"),
            Self::Experimental => Some("EXPERIMENTAL"),
        }
    }
}

/// Structured media type from a content-format label.
///
/// `application/cose; cose-type="cose-encrypt0"` splits into type
/// `application`, subtype `cose` and one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    pub type_: String,
    pub subtype: String,
    /// Structured syntax suffix after `+` (e.g. `cbor` in `senml+cbor`).
    pub suffix: Option<String>,
    /// Parameters as (name, value) with quotes removed.
    pub params: Vec<(String, String)>,
}

/// One normalized row of a registry table.
///
/// Immutable once parsed from a registry snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub value: RegistryValue,
    /// Published form of the value when it is not a plain integer (`2.05`).
    pub value_label: Option<String>,
    pub raw_label: Option<String>,
    pub raw_description: Option<String>,
    pub reference: Option<String>,
    /// Context this meaning applies to, for multi-applicability registries.
    pub applicability: Option<String>,
    /// Secondary key column, e.g. the content coding of a content format.
    pub qualifier: Option<String>,
    pub media_type: Option<MediaType>,
    pub status: EntryStatus,
    /// 1-based data row in the source table.
    pub row: usize,
}

impl RegistryEntry {
    /// Create an assigned entry with only a value.
    #[must_use]
    pub fn new(value: RegistryValue, row: usize) -> Self {
        Self {
            value,
            value_label: None,
            raw_label: None,
            raw_description: None,
            reference: None,
            applicability: None,
            qualifier: None,
            media_type: None,
            status: EntryStatus::Assigned,
            row,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.raw_label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.raw_description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn with_applicability(mut self, applicability: impl Into<String>) -> Self {
        self.applicability = Some(applicability.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: EntryStatus) -> Self {
        self.status = status;
        self
    }

    /// Label if present and non-empty, otherwise the description.
    #[must_use]
    pub fn name_source(&self) -> &str {
        self.raw_label
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.raw_description.as_deref())
            .unwrap_or_default()
    }

    /// Matching key for merging.
    #[must_use]
    pub fn key(&self) -> DefinitionKey {
        DefinitionKey::new(self.value.start(), self.applicability.clone())
    }
}

/// Key used to match fresh candidates to prior definitions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DefinitionKey {
    pub value: u64,
    pub applicability: Option<String>,
}

impl DefinitionKey {
    #[must_use]
    pub fn new(value: u64, applicability: Option<String>) -> Self {
        Self {
            value,
            applicability,
        }
    }
}

impl fmt::Display for DefinitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.applicability {
            Some(ctx) => write!(f, "{} ({ctx})", self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

/// Name derived for one registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierCandidate {
    pub name: String,
    /// Name before any collision suffix was appended.
    pub base_name: String,
    pub comment: String,
    pub source_value: u64,
    pub applicability: Option<String>,
}

impl IdentifierCandidate {
    #[must_use]
    pub fn key(&self) -> DefinitionKey {
        DefinitionKey::new(self.source_value, self.applicability.clone())
    }
}

/// Definition read back from a previously generated region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingDefinition {
    pub name: String,
    pub value: u64,
    pub applicability: Option<String>,
    pub comment: Option<String>,
    /// The prior run pinned this name as an override.
    pub marked_override: bool,
    /// Name differs from what the current heuristic derives.
    ///
    /// Filled in by the merger; `false` straight after parsing.
    pub is_user_authored: bool,
}

impl ExistingDefinition {
    #[must_use]
    pub fn key(&self) -> DefinitionKey {
        DefinitionKey::new(self.value, self.applicability.clone())
    }
}

/// Where a merged name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Generated,
    Preserved,
}

/// Final definition to emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedDefinition {
    pub name: String,
    pub value: u64,
    pub applicability: Option<String>,
    pub comment: Option<String>,
    pub provenance: Provenance,
    /// No longer published by the registry; kept in the trailing block.
    pub retained: bool,
}

impl MergedDefinition {
    #[must_use]
    pub fn key(&self) -> DefinitionKey {
        DefinitionKey::new(self.value, self.applicability.clone())
    }
}

/// Recoverable issue surfaced at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A row could not be turned into an entry and was skipped.
    Row { row: usize, message: String },
    /// Two entries derived the same name; the later one was suffixed.
    NamingCollision {
        name: String,
        renamed_to: String,
        value: u64,
    },
    /// The network was unavailable and a stale cache entry was used.
    StaleCache { source_key: String, message: String },
    /// Prior output defined the same key twice; only the first was kept.
    DuplicateExisting { name: String, key: String },
    /// A pinned override now equals the generated name.
    OverrideReclassified { name: String, value: u64 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Row { row, message } => write!(f, "row {row}: {message}"),
            Self::NamingCollision {
                name,
                renamed_to,
                value,
            } => write!(
                f,
                "name {name} already taken, value {value} emitted as {renamed_to}"
            ),
            Self::StaleCache {
                source_key,
                message,
            } => write!(f, "{source_key}: using stale cache ({message})"),
            Self::DuplicateExisting { name, key } => write!(
                f,
                "existing definition {name} duplicates key {key} and was dropped"
            ),
            Self::OverrideReclassified { name, value } => write!(
                f,
                "override {name} (value {value}) now matches the generated name and is no longer pinned"
            ),
        }
    }
}

/// Change between the current destination and the merged output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionChange {
    Added { name: String, key: DefinitionKey },
    Removed { name: String, key: DefinitionKey },
    Renamed {
        from: String,
        to: String,
        key: DefinitionKey,
    },
    CommentChanged { name: String, key: DefinitionKey },
}

impl fmt::Display for DefinitionChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { name, key } => write!(f, "+ {name} = {key}"),
            Self::Removed { name, key } => write!(f, "- {name} = {key}"),
            Self::Renamed { from, to, key } => write!(f, "~ {from} -> {to} = {key}"),
            Self::CommentChanged { name, key } => write!(f, "~ {name} = {key} (comment)"),
        }
    }
}

/// What happened to a registry's destination.
#[derive(Debug)]
pub enum Outcome {
    Written,
    Unchanged,
    DryRun {
        changes: Vec<DefinitionChange>,
        would_write: bool,
    },
    Failed(HarvesterError),
}

/// Per-registry summary of one run.
#[derive(Debug)]
pub struct RegistryReport {
    pub registry: String,
    pub generated: usize,
    pub preserved: usize,
    pub retained: usize,
    pub pruned: usize,
    pub warnings: Vec<Warning>,
    pub outcome: Outcome,
}

impl RegistryReport {
    /// Create an empty report.
    #[must_use]
    pub fn new(registry: impl Into<String>) -> Self {
        Self {
            registry: registry.into(),
            generated: 0,
            preserved: 0,
            retained: 0,
            pruned: 0,
            warnings: Vec::new(),
            outcome: Outcome::Unchanged,
        }
    }

    /// Report for a registry that hard-failed.
    #[must_use]
    pub fn failed(registry: impl Into<String>, error: HarvesterError, warnings: Vec<Warning>) -> Self {
        let mut report = Self::new(registry);
        report.warnings = warnings;
        report.outcome = Outcome::Failed(error);
        report
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classify() {
        assert_eq!(EntryStatus::classify("unassigned"), EntryStatus::Unassigned);
        assert_eq!(EntryStatus::classify("Reserved"), EntryStatus::Reserved);
        assert_eq!(
            EntryStatus::classify("Earmarked for CoRIM"),
            EntryStatus::Reserved
        );
        assert_eq!(
            EntryStatus::classify("Reserved for Private Use"),
            EntryStatus::Reserved
        );
        assert_eq!(EntryStatus::classify("Private Use"), EntryStatus::PrivateUse);
        assert_eq!(EntryStatus::classify("If-Match"), EntryStatus::Assigned);
    }

    #[test]
    fn test_name_source_prefers_label() {
        let entry = RegistryEntry::new(RegistryValue::Single(1), 1)
            .with_label("If-Match")
            .with_description("ignored");
        assert_eq!(entry.name_source(), "If-Match");

        let entry = RegistryEntry::new(RegistryValue::Single(1), 1)
            .with_label("  ")
            .with_description("Binary UUID");
        assert_eq!(entry.name_source(), "Binary UUID");
    }

    #[test]
    fn test_key_display() {
        assert_eq!(DefinitionKey::new(2, None).to_string(), "2");
        assert_eq!(
            DefinitionKey::new(2, Some("7.01".to_string())).to_string(),
            "2 (7.01)"
        );
    }

    #[test]
    fn test_value_display() {
        assert_eq!(RegistryValue::Single(37).to_string(), "37");
        assert_eq!(RegistryValue::Range(24, 32767).to_string(), "24-32767");
        assert_eq!(RegistryValue::Range(24, 32767).single(), None);
    }
}
