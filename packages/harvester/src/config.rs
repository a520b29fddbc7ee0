//! Configuration constants, settings file loading and validation.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::catalog::{builtin_spec, RegistryId, RegistrySpec};
use crate::error::{HarvesterError, Result};

/// Base URL for IANA protocol registries.
pub const IANA_ASSIGNMENTS_URL: &str = "https://www.iana.org/assignments";

/// HTTP timeout in seconds.
///
/// A timeout counts as a network failure and is eligible for stale-cache fallback.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default time-to-live of a cached registry document (24 hours).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// Default cache directory.
pub const DEFAULT_CACHE_DIR: &str = "cache";

/// Default output directory for generated headers.
pub const DEFAULT_OUTPUT_DIR: &str = "c";

/// Settings file read when `--config` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = "iana-sources.toml";

/// C identifier pattern used for prefixes and typedef names.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static C_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Check that `name` is a valid C identifier.
///
/// # Examples
/// ```
/// use iana_harvester::config::validate_identifier;
///
/// assert!(validate_identifier("CBOR_TAG").is_ok());
/// assert!(validate_identifier("2CBOR").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<()> {
    if C_IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(HarvesterError::Config(format!(
            "'{name}' is not a valid C identifier"
        )))
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// A `..` that would climb above the start of a relative path is kept.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use iana_harvester::config::normalize_path;
///
/// assert_eq!(normalize_path(Path::new("include/./a.h")), Path::new("include/a.h"));
/// assert_eq!(normalize_path(Path::new("include/x/../a.h")), Path::new("include/a.h"));
/// assert_eq!(normalize_path(Path::new("../a.h")), Path::new("../a.h"));
/// ```
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

/// `[cache]` table of the settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    pub dir: Option<PathBuf>,
    pub ttl_secs: Option<u64>,
}

/// `[output]` table of the settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSettings {
    pub dir: Option<PathBuf>,
}

/// Per-registry overrides, `[registries.<id>]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrySettings {
    pub destination: Option<PathBuf>,
    pub prefix: Option<String>,
    pub typedef: Option<String>,
    /// Replaces the download URL; only valid for single-source registries.
    pub url: Option<String>,
    pub placeholders: Option<bool>,
    pub include_value: Option<bool>,
    pub prune: Option<bool>,
    /// Add the `#ifdef`-able feature-flag region.
    pub feature_flags: Option<bool>,
    /// Name text per value, keyed by the decimal value.
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
    #[serde(default)]
    pub exclude: Vec<u64>,
}

/// Contents of the settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub registries: BTreeMap<String, RegistrySettings>,
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load settings from a file.
    ///
    /// A missing file yields the defaults; an unreadable or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => {
                tracing::info!(path = %path.display(), "Loaded settings file");
                Self::from_toml(&text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "Settings file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Apply `IANA_CACHE_DIR`, `IANA_CACHE_TTL_SECS` and `IANA_OUTPUT_DIR`.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("IANA_CACHE_DIR") {
            self.cache.dir = Some(dir.into());
        }
        if let Some(ttl) = std::env::var("IANA_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.cache.ttl_secs = Some(ttl);
        }
        if let Ok(dir) = std::env::var("IANA_OUTPUT_DIR") {
            self.output.dir = Some(dir.into());
        }
        self
    }

    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.cache
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR))
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS))
    }

    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.output
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    /// Build the spec for one registry, applying its overrides.
    pub fn registry_spec(&self, id: RegistryId) -> Result<RegistrySpec> {
        let mut spec = builtin_spec(id);
        let Some(overrides) = self.registries.get(id.as_str()) else {
            return Ok(spec);
        };

        if let Some(destination) = &overrides.destination {
            spec.destination = destination.clone();
        }
        if let Some(prefix) = &overrides.prefix {
            validate_identifier(prefix)?;
            spec.prefix = prefix.clone();
        }
        if let Some(typedef) = &overrides.typedef {
            validate_identifier(typedef)?;
            spec.typedef = typedef.clone();
        }
        if let Some(url) = &overrides.url {
            match spec.sources.as_mut_slice() {
                [only] => only.url = url.clone(),
                _ => {
                    return Err(HarvesterError::Config(format!(
                        "registry {id} has several sources, 'url' cannot be overridden"
                    )))
                }
            }
        }
        if let Some(placeholders) = overrides.placeholders {
            spec.placeholders = placeholders;
        }
        if let Some(include_value) = overrides.include_value {
            spec.include_value = include_value;
        }
        if let Some(prune) = overrides.prune {
            spec.prune = prune;
        }
        if let Some(feature_flags) = overrides.feature_flags {
            spec.feature_flags = feature_flags;
        }
        for (value, text) in &overrides.overrides {
            let value: u64 = value.trim().parse().map_err(|_| {
                HarvesterError::Config(format!(
                    "override key '{value}' for registry {id} is not a number"
                ))
            })?;
            spec.overrides.insert(value, text.clone());
        }
        spec.exclude.extend(overrides.exclude.iter().copied());

        Ok(spec)
    }

    /// Build specs for the selected registries.
    ///
    /// Fails on unknown registry tables and on two registries sharing a destination,
    /// since every destination must have exactly one writer per run.
    pub fn resolve(&self, ids: &[RegistryId]) -> Result<Vec<RegistrySpec>> {
        for key in self.registries.keys() {
            RegistryId::parse(key)?;
        }

        let specs = ids
            .iter()
            .map(|id| self.registry_spec(*id))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = BTreeSet::new();
        for spec in &specs {
            if !seen.insert(normalize_path(&spec.destination)) {
                return Err(HarvesterError::Config(format!(
                    "destination {} is used by more than one registry",
                    spec.destination.display()
                )));
            }
        }
        Ok(specs)
    }
}
