//! Writing merged definitions into C headers.
//!
//! Each registry owns one region of its destination file, delimited by a
//! begin and an end marker comment. Only the bytes between the markers are
//! ever replaced; anything the user wrote around them stays as it is.

mod existing;
mod region;
mod render;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub use existing::parse_definitions;
pub use region::{begin_marker, end_marker};
pub use render::{render_feature_flags, render_interior, RETAINED_MARKER};

use crate::cache::write_atomic;
use crate::catalog::RegistrySpec;
use crate::error::Result;
use crate::types::{DefinitionChange, ExistingDefinition, MergedDefinition};

/// Header written above the region of a freshly created file.
///
/// Followed by the registry's preamble, if any, and a blank line.
#[must_use]
pub fn banner(spec: &RegistrySpec) -> String {
    let mut out = format!(
        "/* {}\n * Generated by iana-harvester. Edits outside the autogenerated section are kept.\n */\n\n",
        spec.title
    );
    if let Some(preamble) = spec.preamble.as_deref().filter(|p| !p.is_empty()) {
        out.push_str(preamble);
        if !preamble.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// A destination file as found on disk before the run.
#[derive(Debug, Clone)]
pub struct Destination {
    path: PathBuf,
    /// `None` when the file does not exist yet.
    content: Option<String>,
}

impl Destination {
    /// Read the destination, treating a missing file as empty.
    pub fn read(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, content })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.content.is_some()
    }

    /// Definitions currently inside the section's region.
    ///
    /// Fails with a destination conflict when the file exists but its
    /// markers are missing, duplicated or out of order.
    pub fn existing_definitions(&self, section: &str) -> Result<Vec<ExistingDefinition>> {
        match &self.content {
            None => Ok(Vec::new()),
            Some(content) => {
                let interior = region::locate(content, section, &self.path)?;
                Ok(parse_definitions(&content[interior]))
            }
        }
    }

    /// Full file content with the section's region replaced.
    ///
    /// With feature flags enabled, the flag region is replaced too, or
    /// appended at the end of the file when it is not there yet.
    pub fn render(&self, spec: &RegistrySpec, definitions: &[MergedDefinition]) -> Result<String> {
        let interior = render_interior(spec, definitions);
        let content = match &self.content {
            None => format!(
                "{}{}{interior}{}\n",
                banner(spec),
                begin_marker(&spec.section),
                end_marker(&spec.section)
            ),
            Some(content) => {
                let range = region::locate(content, &spec.section, &self.path)?;
                region::splice(content, range, &interior)
            }
        };
        if !spec.feature_flags {
            return Ok(content);
        }

        let section = spec.feature_flag_section();
        let flags = render_feature_flags(definitions);
        match region::locate_optional(&content, &section, &self.path)? {
            Some(range) => Ok(region::splice(&content, range, &flags)),
            None => {
                let separator = if content.ends_with('\n') { "\n" } else { "\n\n" };
                Ok(format!(
                    "{content}{separator}{}{flags}{}\n",
                    begin_marker(&section),
                    end_marker(&section)
                ))
            }
        }
    }

    /// Whether `rendered` differs from what is on disk.
    #[must_use]
    pub fn would_change(&self, rendered: &str) -> bool {
        self.content.as_deref() != Some(rendered)
    }

    /// Atomically replace the file. Returns `false` when nothing changed.
    pub fn write(&self, rendered: &str) -> Result<bool> {
        if !self.would_change(rendered) {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        write_atomic(&self.path, rendered.as_bytes())?;
        tracing::info!(path = %self.path.display(), "Wrote destination");
        Ok(true)
    }
}

/// Definition-level changes from `existing` to `merged`.
#[must_use]
pub fn diff(existing: &[ExistingDefinition], merged: &[MergedDefinition]) -> Vec<DefinitionChange> {
    let mut before: BTreeMap<_, &ExistingDefinition> = BTreeMap::new();
    for definition in existing {
        before.entry(definition.key()).or_insert(definition);
    }

    let mut changes = Vec::new();
    for definition in merged {
        let key = definition.key();
        match before.remove(&key) {
            None => changes.push(DefinitionChange::Added {
                name: definition.name.clone(),
                key,
            }),
            Some(prior) if prior.name != definition.name => changes.push(DefinitionChange::Renamed {
                from: prior.name.clone(),
                to: definition.name.clone(),
                key,
            }),
            Some(prior) => {
                let comment = definition.comment.as_deref().filter(|c| !c.is_empty());
                if prior.comment.as_deref() != comment {
                    changes.push(DefinitionChange::CommentChanged {
                        name: definition.name.clone(),
                        key,
                    });
                }
            }
        }
    }
    changes.extend(
        before
            .into_iter()
            .map(|(key, prior)| DefinitionChange::Removed {
                name: prior.name.clone(),
                key,
            }),
    );
    changes
}
