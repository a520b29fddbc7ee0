//! IANA Harvester - Generate C enum constants from IANA protocol registries.
//!
//! This crate downloads IANA registry tables (CoAP, CBOR, HTTP), derives C
//! identifiers for their values and maintains them inside a generator-owned
//! region of each destination header, keeping user overrides across runs.
//!
//! # Example
//!
//! ```
//! use iana_harvester::catalog::{builtin_spec, RegistryId};
//! use iana_harvester::naming::derive;
//! use iana_harvester::types::{RegistryEntry, RegistryValue};
//!
//! let spec = builtin_spec(RegistryId::CborTags);
//! let entry = RegistryEntry::new(RegistryValue::Single(37), 1)
//!     .with_description("Binary UUID ([RFC4122, Section 4.1.2])");
//! assert_eq!(derive(&spec, &entry).unwrap().name, "CBOR_TAG_37_BINARY_UUID");
//! ```
//!
//! # Architecture
//!
//! The harvester is organized into several modules:
//!
//! - [`catalog`]: Supported registries and their per-registry settings
//! - [`config`]: Configuration constants, settings file and validation
//! - [`types`]: Core data types (entries, definitions, warnings, reports)
//! - [`error`]: Error types and Result alias
//! - [`http`]: HTTP transport with retries and conditional requests
//! - [`cache`]: On-disk document cache
//! - [`fetch`]: Cache-first registry fetching with stale fallback
//! - [`parser`]: CSV registry tables to entries
//! - [`naming`]: Identifier derivation heuristics
//! - [`merge`]: Reconciliation with previously emitted definitions
//! - [`emit`]: Managed-region rendering and replacement
//! - [`cli`]: Command-line interface
//! - [`harvester`]: Main harvester service

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod emit;
pub mod error;
pub mod fetch;
pub mod harvester;
pub mod http;
pub mod merge;
pub mod naming;
pub mod parser;
pub mod types;

// Re-export main entry points
pub use harvester::{Harvester, RunOptions};

// Re-export commonly used items
pub use catalog::{RegistryId, RegistrySpec};
pub use config::Settings;
pub use error::{HarvesterError, Result};
pub use types::{Outcome, RegistryReport, Warning};
