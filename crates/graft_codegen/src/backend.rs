//! The seam to the external code generator.
//!
//! graft decides *what* must be generated and *where* it goes; a
//! [`CodegenBackend`] turns GraphQL text into a module and its type
//! declaration. One request covers every stale unit of one logical path, so
//! all literals in a script are generated in a single call.

use std::fmt;
use std::path::Path;

use graft_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::context::ContextKind;

/// One document within a [`GenerateRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentInput<'a> {
    /// Kind of the originating context.
    pub kind: ContextKind,
    /// Effective content hash, which also names the artifacts.
    pub hash: ContentHash,
    /// Raw GraphQL text.
    pub content: &'a str,
}

/// Everything a backend needs to generate artifacts for one logical path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest<'a> {
    /// Logical path the documents belong to.
    pub source_path: &'a Path,
    /// Concatenated schema text.
    pub schema: &'a str,
    /// Documents to generate, in source order.
    pub documents: Vec<DocumentInput<'a>>,
    /// Codegen plugin names.
    pub plugins: &'a [String],
    /// Free-form plugin options.
    pub config: &'a serde_json::Value,
}

/// The generated files for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedOutput {
    /// Intermediate module text.
    pub tsx: String,
    /// Type declaration text.
    pub dts: String,
}

/// A position in GraphQL source, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number.
    pub line: u32,
    /// Column number.
    pub column: u32,
}

/// A diagnostic reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendError {
    /// Human-readable message.
    pub message: String,
    /// Positions the message refers to.
    #[serde(default)]
    pub locations: Vec<SourceLocation>,
}

impl BackendError {
    /// A diagnostic without source positions.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        for loc in &self.locations {
            write!(f, " ({}:{})", loc.line, loc.column)?;
        }
        Ok(())
    }
}

impl std::error::Error for BackendError {}

/// A code generator that graft dispatches stale units to.
///
/// Calls for different logical paths run concurrently, so implementations
/// must be thread-safe. A successful response holds exactly one output per
/// request document, in request order.
pub trait CodegenBackend: Send + Sync {
    /// Generates artifacts for every document of one logical path.
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<Vec<GeneratedOutput>, BackendError>;
}

impl<B: CodegenBackend + ?Sized> CodegenBackend for &B {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<Vec<GeneratedOutput>, BackendError> {
        (**self).generate(request)
    }
}

impl<B: CodegenBackend + ?Sized> CodegenBackend for Box<B> {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<Vec<GeneratedOutput>, BackendError> {
        (**self).generate(request)
    }
}
