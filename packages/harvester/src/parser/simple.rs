//! Row-per-entry tables, including dotted CoAP codes and media type labels.

use super::table::{Table, TableRow};
use super::value::{parse_code, parse_value};
use super::{parse_media_type, EntrySet};
use crate::catalog::{RegistrySpec, TableShape};
use crate::error::{HarvesterError, Result};
use crate::types::{EntryStatus, RegistryEntry};

/// Column indices resolved against one table.
pub(super) struct ResolvedColumns {
    pub value: usize,
    pub label: Option<usize>,
    pub description: Option<usize>,
    pub reference: Option<usize>,
    pub applicability: Option<usize>,
    pub qualifier: Option<usize>,
}

impl ResolvedColumns {
    pub(super) fn resolve(spec: &RegistrySpec, table: &Table) -> Result<Self> {
        let registry = spec.id.as_str();
        let columns = &spec.columns;

        let resolved = Self {
            value: table.require(registry, columns.value)?,
            label: table.column(columns.label),
            description: table.column(columns.description),
            reference: table.column(columns.reference),
            applicability: if columns.applicability.is_empty() {
                None
            } else {
                Some(table.require(registry, columns.applicability)?)
            },
            qualifier: table.column(columns.qualifier),
        };

        if resolved.label.is_none() && resolved.description.is_none() {
            let mut wanted: Vec<&str> = columns.label.to_vec();
            wanted.extend_from_slice(columns.description);
            return Err(HarvesterError::parse(
                registry,
                format!("missing name column {}", wanted.join(" / ")),
            ));
        }
        Ok(resolved)
    }
}

/// Read the common fields of one row.
///
/// `Ok(None)` means the row is blank; `Err` carries the reason it was skipped.
pub(super) fn read_row(
    spec: &RegistrySpec,
    columns: &ResolvedColumns,
    row: &TableRow,
) -> std::result::Result<Option<RegistryEntry>, String> {
    if row.is_blank() {
        return Ok(None);
    }

    let cell = row
        .get(Some(columns.value))
        .ok_or_else(|| "missing value".to_string())?;
    let dotted = spec.shape == TableShape::DottedCode;
    let value = if dotted {
        parse_code(cell)
    } else {
        parse_value(cell)
    }
    .ok_or_else(|| format!("unrecognized value '{cell}'"))?;

    let mut entry = RegistryEntry::new(value, row.number);
    if dotted && value.single().is_some() {
        entry.value_label = Some(cell.to_string());
    }
    entry.raw_label = row.get(columns.label).map(String::from);
    entry.raw_description = row.get(columns.description).map(String::from);
    entry.reference = row.get(columns.reference).map(String::from);
    entry.qualifier = row.get(columns.qualifier).map(String::from);

    entry.status = EntryStatus::classify(entry.name_source());
    if entry.status == EntryStatus::Assigned {
        // CBOR tags mark unassigned blocks in the data item column.
        if let Some(EntryStatus::Unassigned) = entry.qualifier.as_deref().map(EntryStatus::classify) {
            entry.status = EntryStatus::Unassigned;
        }
    }

    Ok(Some(entry))
}

pub(super) fn parse_table(
    spec: &RegistrySpec,
    source_key: &str,
    table: &Table,
    set: &mut EntrySet<'_>,
) -> Result<()> {
    let columns = ResolvedColumns::resolve(spec, table)?;

    for row in table.rows() {
        let mut entry = match read_row(spec, &columns, row) {
            Ok(Some(entry)) => entry,
            Ok(None) => continue,
            Err(message) => {
                set.warn(row.number, format!("{source_key}: {message}"));
                continue;
            }
        };

        if spec.shape == TableShape::CompoundKey && entry.status == EntryStatus::Assigned {
            entry.media_type = entry.raw_label.as_deref().and_then(parse_media_type);
            if entry.media_type.is_none() {
                tracing::debug!(
                    registry = %spec.id,
                    row = row.number,
                    label = entry.name_source(),
                    "Label is not a media type, naming it as text"
                );
            }
        }

        set.push(source_key, entry);
    }
    Ok(())
}
