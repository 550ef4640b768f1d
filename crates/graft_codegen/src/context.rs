//! Per-source codegen task descriptors.

use std::path::{Path, PathBuf};

use graft_cache::{ArtifactPaths, CacheEntry};
use graft_common::ContentHash;
use serde::{Deserialize, Serialize};

/// Discriminant of a [`CodegenContext`], also sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextKind {
    /// A standalone `.graphql` document.
    DocumentImport,
    /// A schema file.
    SchemaImport,
    /// A `gql` template literal.
    GqlCall,
    /// A `load` call.
    LoadCall,
}

/// Context for a schema or document file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContext {
    /// Project-relative path of the GraphQL file.
    pub gql_rel_path: PathBuf,
    /// Effective content hash.
    pub gql_hash: ContentHash,
    /// Where the artifacts for this hash live.
    #[serde(flatten)]
    pub paths: ArtifactPaths,
    /// `true` if valid artifacts already exist for `gql_hash`.
    pub skip: bool,
}

/// Context for a `gql` literal inside a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiteralContext {
    /// Project-relative path of the script containing the literal.
    pub src_rel_path: PathBuf,
    /// Literal text as written.
    pub gql_content: String,
    /// Literal text with ignored characters removed.
    pub stripped_gql_content: String,
    /// Effective content hash.
    pub gql_hash: ContentHash,
    /// Where the artifacts for this hash live.
    #[serde(flatten)]
    pub paths: ArtifactPaths,
    /// `true` if valid artifacts already exist for `gql_hash`.
    pub skip: bool,
}

/// Context for a `load` call inside a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadContext {
    /// Project-relative path of the script containing the call.
    pub src_rel_path: PathBuf,
    /// Call argument as written.
    pub gql_path_fragment: String,
    /// Project-relative path of the loaded document.
    pub gql_rel_path: PathBuf,
    /// Effective content hash.
    pub gql_hash: ContentHash,
    /// Where the artifacts for this hash live.
    #[serde(flatten)]
    pub paths: ArtifactPaths,
    /// `true` if valid artifacts already exist for `gql_hash`.
    pub skip: bool,
}

/// One codegen task: what to generate, under which hash, and where.
///
/// Built fresh every run and never persisted; only the cache entries it
/// confirms outlive it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CodegenContext {
    /// A standalone document file.
    DocumentImport(FileContext),
    /// A schema file.
    SchemaImport(FileContext),
    /// A `gql` literal.
    GqlCall(LiteralContext),
    /// A `load` call.
    LoadCall(LoadContext),
}

impl CodegenContext {
    /// The context's discriminant.
    pub fn kind(&self) -> ContextKind {
        match self {
            Self::DocumentImport(_) => ContextKind::DocumentImport,
            Self::SchemaImport(_) => ContextKind::SchemaImport,
            Self::GqlCall(_) => ContextKind::GqlCall,
            Self::LoadCall(_) => ContextKind::LoadCall,
        }
    }

    /// The logical path the cache keys this context under.
    ///
    /// For literals and load-calls this is the calling script.
    pub fn logical_path(&self) -> &Path {
        match self {
            Self::DocumentImport(c) | Self::SchemaImport(c) => &c.gql_rel_path,
            Self::GqlCall(c) => &c.src_rel_path,
            Self::LoadCall(c) => &c.src_rel_path,
        }
    }

    /// Effective content hash.
    pub fn hash(&self) -> &ContentHash {
        match self {
            Self::DocumentImport(c) | Self::SchemaImport(c) => &c.gql_hash,
            Self::GqlCall(c) => &c.gql_hash,
            Self::LoadCall(c) => &c.gql_hash,
        }
    }

    /// Resolved artifact locations.
    pub fn paths(&self) -> &ArtifactPaths {
        match self {
            Self::DocumentImport(c) | Self::SchemaImport(c) => &c.paths,
            Self::GqlCall(c) => &c.paths,
            Self::LoadCall(c) => &c.paths,
        }
    }

    /// Whether regeneration can be omitted.
    pub fn skip(&self) -> bool {
        match self {
            Self::DocumentImport(c) | Self::SchemaImport(c) => c.skip,
            Self::GqlCall(c) => c.skip,
            Self::LoadCall(c) => c.skip,
        }
    }

    /// The cache entry recording this context's artifacts.
    pub fn cache_entry(&self) -> CacheEntry {
        let paths = self.paths();
        let (gql_content, gql_path_fragment) = match self {
            Self::GqlCall(c) => (Some(c.gql_content.clone()), None),
            Self::LoadCall(c) => (None, Some(c.gql_path_fragment.clone())),
            Self::DocumentImport(_) | Self::SchemaImport(_) => (None, None),
        };
        CacheEntry {
            tsx_rel_path: paths.tsx_rel_path.clone(),
            dts_rel_path: paths.dts_rel_path.clone(),
            gql_content,
            gql_path_fragment,
        }
    }
}

/// Returns `true` if no context needs regeneration.
pub fn is_all_skip(contexts: &[CodegenContext]) -> bool {
    contexts.iter().all(CodegenContext::skip)
}
