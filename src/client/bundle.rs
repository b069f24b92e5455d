//! # Form Bundle Cache
//!
//! Loads form definitions with an offline-first policy:
//!
//! 1. Read the cached bundle (a failure here is only logged).
//! 2. Fetch the bundle from the API.
//! 3. Fetch failed: serve the cache, or fail when there is none.
//! 4. Fetch succeeded with the cached version: serve the cache, no write.
//! 5. Otherwise persist the fetched bundle and serve it.
//!
//! [`FormRepository::load_or_fallback`] adds the last resort: the bundle
//! compiled into the binary.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::client::api::FormsApi;
use crate::client::storage;
use crate::shared::error::{BundleError, StorageError};
use crate::shared::schema::FormBundle;

/// Bundle shipped with the binary.
pub const EMBEDDED_BUNDLE: &str = include_str!("../../assets/forms.json");

/// Where the served bundle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Api,
    Cache,
    Embedded,
    /// Nothing could be loaded; the bundle is empty.
    Error,
}

impl Origin {
    /// Status banner shown above the form list.
    pub fn banner(&self) -> &'static str {
        match self {
            Origin::Api => "Online Mode – Loaded from API",
            Origin::Cache => "Offline Mode – Loaded from Cache",
            Origin::Embedded => "Offline Mode – Using Embedded Forms",
            Origin::Error => "Unable to load forms",
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, Origin::Api)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Origin::Api => "api",
            Origin::Cache => "cache",
            Origin::Embedded => "embedded",
            Origin::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct LoadedForms {
    pub bundle: FormBundle,
    pub origin: Origin,
}

/// The on-disk copy of the last bundle fetched from the API.
#[derive(Debug, Clone)]
pub struct BundleCache {
    path: PathBuf,
}

impl BundleCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached bundle, `None` when nothing has been cached yet.
    pub async fn read(&self) -> Result<Option<FormBundle>, StorageError> {
        storage::read_json_opt(&self.path).await
    }

    pub async fn write(&self, bundle: &FormBundle) -> Result<(), StorageError> {
        storage::write_json_atomic(&self.path, bundle).await
    }
}

/// Parse the bundle compiled into the binary.
pub fn embedded_bundle() -> Result<FormBundle, BundleError> {
    parse_embedded(EMBEDDED_BUNDLE)
}

fn parse_embedded(source: &str) -> Result<FormBundle, BundleError> {
    serde_json::from_str(source).map_err(|e| BundleError::Embedded(e.to_string()))
}

#[derive(Debug, Clone)]
pub struct FormRepository {
    cache: BundleCache,
}

impl FormRepository {
    pub fn new(cache: BundleCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &BundleCache {
        &self.cache
    }

    /// Load from the API, falling back to the cache.
    pub async fn load(&self, api: &dyn FormsApi) -> Result<LoadedForms, BundleError> {
        let cached = match self.cache.read().await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("[FORMS] Ignoring unreadable cache: {}", e);
                None
            }
        };

        let remote = match api.fetch_bundle().await {
            Ok(remote) => remote,
            Err(fetch) => {
                return match cached {
                    Some(bundle) => {
                        tracing::warn!("[FORMS] Using cached forms: {}", fetch);
                        Ok(LoadedForms {
                            bundle,
                            origin: Origin::Cache,
                        })
                    }
                    None => Err(BundleError::Unavailable { fetch }),
                };
            }
        };

        if let Some(bundle) = cached {
            if !bundle.version.is_empty() && bundle.version == remote.version {
                tracing::info!("[FORMS] Forms up to date (version {})", bundle.version);
                return Ok(LoadedForms {
                    bundle,
                    origin: Origin::Cache,
                });
            }
        }

        match self.cache.write(&remote).await {
            Ok(()) => tracing::info!("[FORMS] Updated forms cache to version {}", remote.version),
            Err(e) => tracing::warn!("[FORMS] Failed to update cache: {}", e),
        }

        Ok(LoadedForms {
            bundle: remote,
            origin: Origin::Api,
        })
    }

    /// Like [`load`](Self::load), but never fails.
    pub async fn load_or_fallback(&self, api: &dyn FormsApi) -> LoadedForms {
        match self.load(api).await {
            Ok(loaded) => loaded,
            Err(e) => fallback(e, EMBEDDED_BUNDLE),
        }
    }
}

fn fallback(error: BundleError, embedded: &str) -> LoadedForms {
    tracing::warn!("[FORMS] Could not load forms: {}", error);
    match parse_embedded(embedded) {
        Ok(bundle) => {
            tracing::info!("[FORMS] Loaded embedded forms (version {})", bundle.version);
            LoadedForms {
                bundle,
                origin: Origin::Embedded,
            }
        }
        Err(e) => {
            tracing::error!("[FORMS] Failed to load any form definitions: {}", e);
            LoadedForms {
                bundle: FormBundle::default(),
                origin: Origin::Error,
            }
        }
    }
}
