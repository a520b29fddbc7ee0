//! Registry document parsing.
//!
//! Turns raw CSV exports into an ordered list of [`RegistryEntry`] values.
//! The table shape of the registry selects how rows map to entries:
//!
//! - [`TableShape::Simple`] and [`TableShape::DottedCode`]: one row, one entry
//! - [`TableShape::CompoundKey`]: one row, one entry with its label split into
//!   a [`MediaType`](crate::types::MediaType)
//! - [`TableShape::MultiApplicability`]: one entry per (value, context) pair
//!
//! A row that cannot be read is skipped with a [`Warning::Row`]. A document
//! whose columns are not recognized, or that yields too few entries, is a
//! parse error for the whole registry.

mod media_type;
mod multi;
mod simple;
mod table;
mod value;

use std::collections::BTreeSet;

use crate::catalog::{RegistrySpec, Source, TableShape};
use crate::error::{HarvesterError, Result};
use crate::types::{DefinitionKey, EntryStatus, RegistryEntry, RegistryValue, Warning};

pub use media_type::parse_media_type;
pub use table::{Table, TableRow};
pub use value::{code_label, code_token, parse_code, parse_value};

/// Entries and row-level warnings from one registry.
#[derive(Debug, Clone, Default)]
pub struct ParsedRegistry {
    pub entries: Vec<RegistryEntry>,
    pub warnings: Vec<Warning>,
}

/// One fetched source document.
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    pub source: &'a Source,
    pub bytes: &'a [u8],
}

/// Parse every source document of a registry into one entry list.
///
/// Entries are returned in (value, applicability) order.
pub fn parse_registry(spec: &RegistrySpec, documents: &[Document<'_>]) -> Result<ParsedRegistry> {
    let mut set = EntrySet::new(spec);

    for document in documents {
        let table = Table::from_csv(document.bytes).map_err(|e| {
            HarvesterError::parse(spec.id.as_str(), format!("{}: {e}", document.source.key))
        })?;
        tracing::debug!(
            registry = %spec.id,
            source = %document.source.key,
            rows = table.rows().len(),
            "Decoded registry table"
        );

        match spec.shape {
            TableShape::Simple | TableShape::DottedCode | TableShape::CompoundKey => {
                simple::parse_table(spec, &document.source.key, &table, &mut set)?;
            }
            TableShape::MultiApplicability => {
                multi::parse_table(spec, &document.source.key, &table, &mut set)?;
            }
        }
    }

    if spec.shape == TableShape::DottedCode {
        set.add_empty_message();
    }

    set.finish()
}

/// Accumulates entries across rows and documents.
pub(crate) struct EntrySet<'a> {
    spec: &'a RegistrySpec,
    entries: Vec<RegistryEntry>,
    seen: BTreeSet<DefinitionKey>,
    warnings: Vec<Warning>,
}

impl<'a> EntrySet<'a> {
    fn new(spec: &'a RegistrySpec) -> Self {
        Self {
            spec,
            entries: Vec::new(),
            seen: BTreeSet::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an entry, skipping excluded values and duplicate keys.
    pub(crate) fn push(&mut self, source_key: &str, entry: RegistryEntry) {
        if let RegistryValue::Single(value) = entry.value {
            if self.spec.exclude.contains(&value) {
                tracing::debug!(registry = %self.spec.id, value, "Value excluded by configuration");
                return;
            }
            let key = entry.key();
            if !self.seen.insert(key.clone()) {
                self.warn(
                    entry.row,
                    format!("{source_key}: duplicate key {key}, keeping the first row"),
                );
                return;
            }
        }
        self.entries.push(entry);
    }

    /// Record a skipped row.
    pub(crate) fn warn(&mut self, row: usize, message: String) {
        tracing::warn!(registry = %self.spec.id, row, %message, "Skipping registry row");
        self.warnings.push(Warning::Row { row, message });
    }

    /// No CoAP code table publishes `0.00`, so it is synthesized.
    fn add_empty_message(&mut self) {
        if self.seen.contains(&DefinitionKey::new(0, None)) {
            return;
        }
        let mut entry = RegistryEntry::new(RegistryValue::Single(0), 0)
            .with_label("Empty Message")
            .with_reference("[RFC7252, Section 4.1]");
        entry.value_label = Some(code_label(0));
        self.push("builtin", entry);
    }

    fn finish(mut self) -> Result<ParsedRegistry> {
        let ranges = self
            .entries
            .iter()
            .filter(|e| matches!(e.value, RegistryValue::Range(..)))
            .count();
        let placeholders = self
            .entries
            .iter()
            .filter(|e| e.status != EntryStatus::Assigned)
            .count();
        tracing::debug!(
            registry = %self.spec.id,
            entries = self.entries.len(),
            ranges,
            placeholders,
            "Parsed registry"
        );

        if self.entries.len() < self.spec.min_entries.max(1) {
            return Err(HarvesterError::parse(
                self.spec.id.as_str(),
                format!(
                    "expected at least {} entries, found {}",
                    self.spec.min_entries.max(1),
                    self.entries.len()
                ),
            ));
        }

        self.entries.sort_by(|a, b| {
            a.value
                .start()
                .cmp(&b.value.start())
                .then_with(|| a.applicability.cmp(&b.applicability))
        });

        Ok(ParsedRegistry {
            entries: self.entries,
            warnings: self.warnings,
        })
    }
}
