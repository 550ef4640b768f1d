//! Error types for code generation runs.

use std::path::PathBuf;

use graft_cache::CacheError;

use crate::backend::BackendError;

/// Errors that abort a codegen run.
///
/// None of these leave a partially committed cache behind: the manifest is
/// only saved after every backend call and artifact write has succeeded.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// Writing artifacts, pruning or saving the cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The backend rejected a source.
    #[error("codegen failed for {path}: {source}")]
    Backend {
        /// Logical path of the rejected source.
        path: PathBuf,
        /// The backend's diagnostic, unmodified.
        source: BackendError,
    },

    /// The backend returned a different number of outputs than requested.
    #[error("backend returned {actual} outputs for {expected} documents of {path}")]
    OutputMismatch {
        /// Logical path of the request.
        path: PathBuf,
        /// Number of documents sent.
        expected: usize,
        /// Number of outputs received.
        actual: usize,
    },

    /// Documents were supplied without any schema to type them against.
    #[error("no schema sources found; documents cannot be generated without a schema")]
    MissingSchema,
}
