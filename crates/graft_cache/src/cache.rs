//! High-level artifact cache.
//!
//! `ArtifactCache` owns the in-memory manifest for one cache directory and
//! exposes the load / query / record / prune / save lifecycle used by the
//! code generator. Exactly one owner mutates it per build; parallel phases
//! only ever borrow it immutably.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use graft_common::ContentHash;

use crate::error::CacheError;
use crate::fs::remove_if_exists;
use crate::manifest::{CacheEntry, CacheManifest, SourceEntries};

static NO_ENTRIES: SourceEntries = BTreeMap::new();

/// Persistent map from logical source paths to their generated artifacts.
///
/// Loading is fail-safe: a missing, corrupt or incompatible manifest yields
/// an empty cache, and entries whose files vanished from disk are dropped.
#[derive(Debug)]
pub struct ArtifactCache {
    /// Project root; entry paths are relative to it.
    cwd: PathBuf,

    /// Absolute directory holding `manifest.json`.
    cache_dir: PathBuf,

    /// The in-memory cache state.
    manifest: CacheManifest,

    /// graft version string for compatibility checks.
    graft_version: String,
}

impl ArtifactCache {
    /// Creates an empty, unloaded cache for a project root and cache directory.
    ///
    /// A relative `cache_dir` is taken relative to `cwd`.
    pub fn new(cwd: &Path, cache_dir: &Path, graft_version: &str) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            cache_dir: cwd.join(cache_dir),
            manifest: CacheManifest::new(graft_version),
            graft_version: graft_version.to_string(),
        }
    }

    /// Creates a cache and immediately loads its persisted state.
    pub fn load_or_create(cwd: &Path, cache_dir: &Path, graft_version: &str) -> Self {
        let mut cache = Self::new(cwd, cache_dir, graft_version);
        cache.load();
        cache
    }

    /// Replaces the in-memory state with the persisted manifest.
    ///
    /// Discards any unsaved mutation. Entries whose artifacts are missing
    /// on disk are dropped. Returns the number of dropped entries.
    pub fn load(&mut self) -> usize {
        let loaded = CacheManifest::load(&self.cache_dir);
        let mut manifest = match loaded {
            Some(m) if m.is_compatible(&self.graft_version) => m,
            Some(m) => {
                tracing::warn!(
                    found = %m.graft_version,
                    expected = %self.graft_version,
                    "cache written by another graft version, starting fresh"
                );
                CacheManifest::new(&self.graft_version)
            }
            None => CacheManifest::new(&self.graft_version),
        };

        let mut dropped = 0;
        let cwd = &self.cwd;
        manifest.sources.retain(|source, entries| {
            entries.retain(|hash, entry| {
                let alive = entry.artifacts_exist(cwd);
                if !alive {
                    tracing::debug!(
                        source = %source.display(),
                        %hash,
                        "dropping cache entry with missing artifacts"
                    );
                    dropped += 1;
                }
                alive
            });
            !entries.is_empty()
        });

        if dropped > 0 {
            tracing::warn!(dropped, "repaired cache: entries with missing artifacts removed");
        }
        self.manifest = manifest;
        dropped
    }

    /// Returns the live entries for a logical source, empty if none are known.
    pub fn get(&self, source: &Path) -> &SourceEntries {
        self.manifest.sources.get(source).unwrap_or(&NO_ENTRIES)
    }

    /// Returns the entry for an exact `(source, hash)` pair.
    pub fn lookup(&self, source: &Path, hash: &ContentHash) -> Option<&CacheEntry> {
        self.get(source).get(hash)
    }

    /// Returns `true` if `(source, hash)` is cached and its files are on disk.
    pub fn is_fresh(&self, source: &Path, hash: &ContentHash) -> bool {
        self.lookup(source, hash)
            .is_some_and(|entry| entry.artifacts_exist(&self.cwd))
    }

    /// Registers a freshly generated or confirmed artifact.
    pub fn record(&mut self, source: &Path, hash: ContentHash, entry: CacheEntry) {
        self.manifest
            .sources
            .entry(source.to_path_buf())
            .or_default()
            .insert(hash, entry);
    }

    /// Drops every hash recorded under `source` that is not in `live`,
    /// deleting the corresponding artifact files.
    ///
    /// Returns the number of pruned entries.
    pub fn prune(
        &mut self,
        source: &Path,
        live: &HashSet<ContentHash>,
    ) -> Result<usize, CacheError> {
        let Some(entries) = self.manifest.sources.get_mut(source) else {
            return Ok(0);
        };

        let stale: Vec<ContentHash> = entries
            .keys()
            .filter(|hash| !live.contains(hash))
            .copied()
            .collect();

        for hash in &stale {
            if let Some(entry) = entries.remove(hash) {
                tracing::debug!(source = %source.display(), %hash, "pruning stale artifact");
                remove_artifacts(&self.cwd, &entry)?;
            }
        }

        if entries.is_empty() {
            self.manifest.sources.remove(source);
        }
        Ok(stale.len())
    }

    /// Drops every logical source not in `live`, deleting its artifacts.
    ///
    /// Only valid after a run that saw every source of the project.
    /// Returns the number of removed sources.
    pub fn retain_sources(&mut self, live: &HashSet<PathBuf>) -> Result<usize, CacheError> {
        let gone: Vec<PathBuf> = self
            .manifest
            .sources
            .keys()
            .filter(|source| !live.contains(*source))
            .cloned()
            .collect();

        for source in &gone {
            if let Some(entries) = self.manifest.sources.remove(source) {
                tracing::debug!(source = %source.display(), "removing artifacts of deleted source");
                for entry in entries.values() {
                    remove_artifacts(&self.cwd, entry)?;
                }
            }
        }
        Ok(gone.len())
    }

    /// Persists the current manifest to disk, replacing the previous file.
    pub fn save(&self) -> Result<(), CacheError> {
        self.manifest.save(&self.cache_dir)
    }

    /// Iterates over every logical source and its entries, in path order.
    pub fn sources(&self) -> impl Iterator<Item = (&PathBuf, &SourceEntries)> {
        self.manifest.sources.iter()
    }

    /// Returns a reference to the current cache manifest.
    pub fn manifest(&self) -> &CacheManifest {
        &self.manifest
    }

    /// The project root entry paths are relative to.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Absolute cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

fn remove_artifacts(cwd: &Path, entry: &CacheEntry) -> Result<(), CacheError> {
    remove_if_exists(&cwd.join(&entry.tsx_rel_path))?;
    remove_if_exists(&cwd.join(&entry.dts_rel_path))?;
    Ok(())
}
