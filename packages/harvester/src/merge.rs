//! Reconciling derived names with previously emitted definitions.
//!
//! Definitions are matched by (value, applicability). A prior name that
//! differs from the derived one is a user override and survives
//! regeneration with a refreshed comment. A prior name that is the derived
//! name with a collision suffix from an earlier run is not an override: it
//! follows the current run's name. Prior definitions whose value is no
//! longer published are kept in a trailing block unless pruning is on.

use std::collections::{BTreeMap, HashSet};

use crate::naming::disambiguate;
use crate::types::{
    DefinitionKey, ExistingDefinition, IdentifierCandidate, MergedDefinition, Provenance, Warning,
};

/// Result of one merge pass.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub definitions: Vec<MergedDefinition>,
    pub warnings: Vec<Warning>,
    /// Prior definitions dropped because their value left the registry.
    pub pruned: usize,
}

impl MergeOutcome {
    #[must_use]
    pub fn count(&self, provenance: Provenance, retained: bool) -> usize {
        self.definitions
            .iter()
            .filter(|d| d.provenance == provenance && d.retained == retained)
            .count()
    }
}

/// Whether `existing` is `derived` with a collision suffix (`NAME_2`).
fn is_suffixed_form(existing: &str, derived: &str) -> bool {
    existing
        .strip_prefix(derived)
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Whether `prior` is a name the generator produced from `base`, with or
/// without a collision suffix. Names pinned with `override` never are.
fn is_generator_name(prior: &ExistingDefinition, base: &str) -> bool {
    !prior.marked_override && (prior.name == base || is_suffixed_form(&prior.name, base))
}

/// Index prior definitions by key, keeping the first of any duplicates.
fn index_existing(
    existing: Vec<ExistingDefinition>,
    warnings: &mut Vec<Warning>,
) -> BTreeMap<DefinitionKey, ExistingDefinition> {
    let mut by_key = BTreeMap::new();
    for definition in existing {
        let key = definition.key();
        if by_key.contains_key(&key) {
            tracing::warn!(name = %definition.name, key = %key, "Duplicate key in existing definitions");
            warnings.push(Warning::DuplicateExisting {
                name: definition.name,
                key: key.to_string(),
            });
            continue;
        }
        by_key.insert(key, definition);
    }
    by_key
}

/// Merge prior definitions with freshly derived candidates.
///
/// Output order is the order of `derived`, followed by the retained tail in
/// key order. Names are unique: preserved and retained names are claimed
/// first, and a generated name that clashes with one of them is suffixed.
#[must_use]
pub fn merge(
    existing: Vec<ExistingDefinition>,
    derived: Vec<IdentifierCandidate>,
    prune: bool,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    let mut existing = index_existing(existing, &mut outcome.warnings);

    let mut matched = Vec::with_capacity(derived.len());
    for candidate in derived {
        let key = candidate.key();
        let definition = match existing.remove(&key) {
            None => MergedDefinition {
                name: candidate.name,
                value: candidate.source_value,
                applicability: candidate.applicability,
                comment: Some(candidate.comment),
                provenance: Provenance::Generated,
                retained: false,
            },
            Some(mut prior) => {
                prior.is_user_authored = prior.name != candidate.name
                    && !is_generator_name(&prior, &candidate.base_name);

                if prior.marked_override && prior.name == candidate.name {
                    tracing::warn!(name = %prior.name, value = prior.value, "Override now matches the generated name");
                    outcome.warnings.push(Warning::OverrideReclassified {
                        name: prior.name.clone(),
                        value: prior.value,
                    });
                }

                let (name, provenance) = if prior.is_user_authored {
                    (prior.name, Provenance::Preserved)
                } else {
                    (candidate.name, Provenance::Generated)
                };
                MergedDefinition {
                    name,
                    value: candidate.source_value,
                    applicability: candidate.applicability,
                    comment: Some(candidate.comment),
                    provenance,
                    retained: false,
                }
            }
        };
        matched.push(definition);
    }

    let mut tail: Vec<MergedDefinition> = Vec::new();
    for (key, prior) in existing {
        if prune {
            tracing::info!(name = %prior.name, key = %key, "Pruning definition no longer in the registry");
            outcome.pruned += 1;
            continue;
        }
        tracing::debug!(name = %prior.name, key = %key, "Retaining definition no longer in the registry");
        tail.push(MergedDefinition {
            name: prior.name,
            value: prior.value,
            applicability: prior.applicability,
            comment: prior.comment,
            provenance: Provenance::Preserved,
            retained: true,
        });
    }

    let mut definitions = matched;
    definitions.extend(tail);

    // Names from prior output claim first, generated names yield.
    let (first, rest): (Vec<usize>, Vec<usize>) = (0..definitions.len())
        .partition(|&i| definitions[i].provenance == Provenance::Preserved);
    let mut taken: HashSet<String> = HashSet::new();
    for i in first.into_iter().chain(rest) {
        let definition = &mut definitions[i];
        if taken.contains(&definition.name) {
            let renamed = disambiguate(&definition.name, &taken);
            tracing::warn!(name = %definition.name, renamed = %renamed, value = definition.value, "Name collision");
            outcome.warnings.push(Warning::NamingCollision {
                name: definition.name.clone(),
                renamed_to: renamed.clone(),
                value: definition.value,
            });
            definition.name = renamed;
        }
        taken.insert(definition.name.clone());
    }

    outcome.definitions = definitions;
    outcome
}
