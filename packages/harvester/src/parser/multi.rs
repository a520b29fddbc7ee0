//! Tables where one value has a meaning per applicability context.
//!
//! CoAP signaling option numbers are defined per signaling code: option 2
//! is `Max-Message-Size` for `7.01` (CSM) and `Custody` for `7.02` (Ping).
//! Each (value, context) pair becomes its own entry.

use std::collections::BTreeSet;

use super::simple::{read_row, ResolvedColumns};
use super::table::Table;
use super::EntrySet;
use crate::catalog::RegistrySpec;
use crate::error::Result;
use crate::types::RegistryEntry;

/// Whether a context names every code of the table (`7.xx`, `all`).
fn is_wildcard(context: &str) -> bool {
    let lower = context.to_ascii_lowercase();
    lower == "all" || lower.ends_with(".xx") || lower.contains('*')
}

/// Split an "Applies to" cell into contexts.
fn split_contexts(cell: &str) -> Vec<String> {
    cell.split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub(super) fn parse_table(
    spec: &RegistrySpec,
    source_key: &str,
    table: &Table,
    set: &mut EntrySet<'_>,
) -> Result<()> {
    let columns = ResolvedColumns::resolve(spec, table)?;

    // First pass: rows and every concrete context named in the table.
    let mut rows: Vec<(RegistryEntry, Vec<String>)> = Vec::new();
    let mut concrete: Vec<String> = Vec::new();
    for row in table.rows() {
        let entry = match read_row(spec, &columns, row) {
            Ok(Some(entry)) => entry,
            Ok(None) => continue,
            Err(message) => {
                set.warn(row.number, format!("{source_key}: {message}"));
                continue;
            }
        };

        let contexts = split_contexts(row.get(columns.applicability).unwrap_or_default());
        if contexts.is_empty() && entry.value.single().is_some() {
            set.warn(row.number, format!("{source_key}: missing applicability"));
            continue;
        }
        for context in contexts.iter().filter(|c| !is_wildcard(c)) {
            if !concrete.contains(context) {
                concrete.push(context.clone());
            }
        }
        rows.push((entry, contexts));
    }
    concrete.sort();

    // Second pass: expand wildcards against the concrete contexts.
    for (entry, contexts) in rows {
        let mut expanded: Vec<String> = Vec::new();
        for context in contexts {
            if is_wildcard(&context) && !concrete.is_empty() {
                expanded.extend(concrete.iter().cloned());
            } else {
                expanded.push(context);
            }
        }
        if expanded.is_empty() {
            // Unassigned ranges carry no context.
            set.push(source_key, entry);
            continue;
        }
        let mut seen = BTreeSet::new();
        expanded.retain(|context| seen.insert(context.clone()));
        for context in expanded {
            set.push(source_key, entry.clone().with_applicability(context));
        }
    }
    Ok(())
}
