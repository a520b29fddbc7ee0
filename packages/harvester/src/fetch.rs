//! Registry document retrieval with cache, TTL and stale fallback.

use std::time::Duration;

use chrono::Utc;

use crate::cache::{CacheEntry, CacheMeta, CacheStore};
use crate::catalog::Source;
use crate::error::{HarvesterError, Result};
use crate::http::{Download, Transport};
use crate::types::Warning;

/// Staleness policy for one run.
#[derive(Debug, Clone, Copy)]
pub struct FetchPolicy {
    pub ttl: Duration,
    /// Treat every cache entry as stale.
    pub force_refresh: bool,
}

/// Where the returned bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Fresh cache hit, no network access.
    Cache,
    /// Downloaded and stored.
    Network,
    /// Server answered `304 Not Modified`.
    Revalidated,
    /// Network failed and a stale entry was used.
    Stale,
}

/// A fetched registry document.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    pub origin: Origin,
    pub warning: Option<Warning>,
}

/// Obtains raw registry documents through a cache.
pub struct RegistryFetcher<'a> {
    transport: &'a dyn Transport,
    cache: &'a CacheStore,
    policy: FetchPolicy,
}

impl<'a> RegistryFetcher<'a> {
    #[must_use]
    pub fn new(transport: &'a dyn Transport, cache: &'a CacheStore, policy: FetchPolicy) -> Self {
        Self {
            transport,
            cache,
            policy,
        }
    }

    /// Fetch one source document.
    ///
    /// Returns the cached bytes when the entry is fresh. Otherwise downloads
    /// the document and stores it. A failed download falls back to any cached
    /// entry with a [`Warning::StaleCache`]; without one it is a
    /// [`HarvesterError::Fetch`].
    pub fn fetch(&self, source: &Source) -> Result<Fetched> {
        let cached = match self.cache.load(&source.key) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %source.key, error = %e, "Cache slot unreadable, ignoring it");
                None
            }
        };

        if let Some(entry) = &cached {
            let stale = self.policy.force_refresh || entry.is_stale(self.policy.ttl, Utc::now());
            if !stale && entry.meta.url == source.url {
                tracing::debug!(key = %source.key, "Using cached document");
                return Ok(Fetched {
                    bytes: entry.bytes.clone(),
                    origin: Origin::Cache,
                    warning: None,
                });
            }
        }

        // Only revalidate an entry that was downloaded from the same URL.
        let validator = cached
            .as_ref()
            .filter(|entry| entry.meta.url == source.url)
            .and_then(|entry| entry.meta.last_modified.as_deref());

        tracing::info!(key = %source.key, url = %source.url, "Downloading registry document");
        match self.transport.get(&source.url, validator) {
            Ok(Download::Body {
                bytes,
                last_modified,
            }) => {
                let entry = CacheEntry {
                    bytes,
                    meta: CacheMeta {
                        url: source.url.clone(),
                        fetched_at: Utc::now(),
                        last_modified,
                    },
                };
                if let Err(e) = self.cache.store(&source.key, &entry) {
                    tracing::warn!(key = %source.key, error = %e, "Failed to write cache entry");
                }
                Ok(Fetched {
                    bytes: entry.bytes,
                    origin: Origin::Network,
                    warning: None,
                })
            }
            Ok(Download::NotModified) => match cached {
                Some(mut entry) => {
                    tracing::debug!(key = %source.key, "Document not modified");
                    entry.meta.fetched_at = Utc::now();
                    if let Err(e) = self.cache.store_meta(&source.key, &entry.meta) {
                        tracing::warn!(key = %source.key, error = %e, "Failed to refresh cache metadata");
                    }
                    Ok(Fetched {
                        bytes: entry.bytes,
                        origin: Origin::Revalidated,
                        warning: None,
                    })
                }
                None => Err(HarvesterError::Fetch {
                    source_key: source.key.clone(),
                    message: "server answered 304 without a cached copy".to_string(),
                }),
            },
            Err(e) => match cached {
                Some(entry) => {
                    tracing::warn!(
                        key = %source.key,
                        error = %e,
                        fetched_at = %entry.meta.fetched_at,
                        "Download failed, falling back to stale cache"
                    );
                    Ok(Fetched {
                        bytes: entry.bytes,
                        origin: Origin::Stale,
                        warning: Some(Warning::StaleCache {
                            source_key: source.key.clone(),
                            message: e.to_string(),
                        }),
                    })
                }
                None => Err(HarvesterError::Fetch {
                    source_key: source.key.clone(),
                    message: e.to_string(),
                }),
            },
        }
    }
}
