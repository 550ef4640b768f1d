//! Incremental codegen cache management.
//!
//! This crate provides the content-addressed identity of generated artifacts
//! and the persistent cache that maps each logical source path to the
//! artifacts produced for its live content hashes, enabling incremental
//! rebuilds that only touch what changed.

#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod fs;
pub mod manifest;
pub mod paths;

pub use cache::ArtifactCache;
pub use error::CacheError;
pub use manifest::{CacheEntry, CacheManifest, SourceEntries};
pub use paths::{resolve_paths, ArtifactPaths, PathResolver};
