//! Incremental GraphQL code generation.
//!
//! Turns discovered GraphQL sources into content-addressed codegen contexts,
//! hands the stale ones to a [`CodegenBackend`], and keeps the artifact cache
//! consistent with what is on disk. Work whose inputs have not changed is
//! skipped entirely.

#![warn(missing_docs)]

pub mod backend;
pub mod builder;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod source;
pub mod strip;
pub mod type_inject;

pub use backend::{
    BackendError, CodegenBackend, DocumentInput, GenerateRequest, GeneratedOutput, SourceLocation,
};
pub use builder::{schema_identity, CodegenContextBuilder};
pub use context::{CodegenContext, ContextKind, FileContext, LiteralContext, LoadContext};
pub use error::CodegenError;
pub use orchestrator::{CodegenSettings, Orchestrator, RunSummary};
pub use source::{SourceUnit, UnitKind};
pub use strip::strip_ignored_characters;

/// Version stamped into the cache manifest; a mismatch starts a fresh cache.
pub const GRAFT_VERSION: &str = env!("CARGO_PKG_VERSION");
