//! Persisted cache manifest mapping logical sources to generated artifacts.
//!
//! The manifest is stored as `manifest.json` in the cache directory. For each
//! logical source path it records every live content hash and the files that
//! hash produced. Rows are decoded independently so that one damaged row costs
//! a regeneration of that source only, never the whole cache.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use graft_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::fs::atomic_write;

/// Name of the manifest file within the cache directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Artifacts known for one logical source, keyed by content hash.
pub type SourceEntries = BTreeMap<ContentHash, CacheEntry>;

/// Top-level cache manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheManifest {
    /// graft version that produced this cache. Invalidate on version change.
    pub graft_version: String,

    /// Per-source artifact entries, keyed by project-relative logical path.
    pub sources: BTreeMap<PathBuf, SourceEntries>,
}

/// Files generated for one content hash of a logical source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Intermediate module, relative to the project root.
    pub tsx_rel_path: PathBuf,

    /// Type declaration, relative to the project root.
    pub dts_rel_path: PathBuf,

    /// Original (unstripped) text of a `gql` literal, kept so the type-inject
    /// entrypoint can be rebuilt without re-reading sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gql_content: Option<String>,

    /// Argument of a `load(...)` call, kept for the same reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gql_path_fragment: Option<String>,
}

impl CacheEntry {
    /// Returns `true` if both generated files exist under `cwd`.
    pub fn artifacts_exist(&self, cwd: &Path) -> bool {
        cwd.join(&self.tsx_rel_path).is_file() && cwd.join(&self.dts_rel_path).is_file()
    }
}

/// Manifest shape used while loading: rows stay undecoded until checked.
#[derive(Deserialize)]
struct RawManifest {
    graft_version: String,
    #[serde(default)]
    sources: BTreeMap<PathBuf, serde_json::Value>,
}

impl CacheManifest {
    /// Creates a new, empty cache manifest for the given graft version.
    pub fn new(graft_version: &str) -> Self {
        Self {
            graft_version: graft_version.to_string(),
            sources: BTreeMap::new(),
        }
    }

    /// Loads the manifest from the cache directory, returning `None` if the
    /// file doesn't exist or its top level can't be parsed.
    ///
    /// Rows that fail to decode are dropped individually with a warning.
    pub fn load(cache_dir: &Path) -> Option<Self> {
        let path = cache_dir.join(MANIFEST_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no cache manifest, starting fresh");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable cache manifest, starting fresh");
                return None;
            }
        };

        let raw: RawManifest = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt cache manifest, starting fresh");
                return None;
            }
        };

        let mut sources = BTreeMap::new();
        for (source, value) in raw.sources {
            match serde_json::from_value::<SourceEntries>(value) {
                Ok(entries) => {
                    sources.insert(source, entries);
                }
                Err(e) => {
                    tracing::warn!(source = %source.display(), error = %e, "dropping corrupt cache row");
                }
            }
        }

        Some(Self {
            graft_version: raw.graft_version,
            sources,
        })
    }

    /// Saves the manifest to the cache directory via write-then-rename.
    ///
    /// Creates the cache directory if it doesn't exist.
    pub fn save(&self, cache_dir: &Path) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        atomic_write(&cache_dir.join(MANIFEST_FILE), json.as_bytes())
    }

    /// Returns `true` if this manifest was produced by a compatible graft version.
    pub fn is_compatible(&self, current_version: &str) -> bool {
        self.graft_version == current_version
    }

    /// Total number of entries across all sources.
    pub fn entry_count(&self) -> usize {
        self.sources.values().map(BTreeMap::len).sum()
    }
}
