//! Discovered GraphQL inputs.

use std::path::{Path, PathBuf};

/// What a [`SourceUnit`] contributes to code generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitKind {
    /// A `.graphqls` (or schema-glob matched) schema file.
    Schema,
    /// A standalone `.graphql` operation document.
    Document,
    /// A `gql(`...`)` template literal embedded in a script.
    Literal,
    /// A `load("...")` call embedded in a script.
    LoadCall {
        /// The argument exactly as written at the call site.
        gql_path_fragment: String,
        /// Project-relative path of the loaded document.
        gql_rel_path: PathBuf,
    },
}

/// One piece of GraphQL text plus the logical path it was found at.
///
/// For literals and load-calls the logical path is the calling script, so
/// several units may share it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Project-relative logical path.
    pub logical_path: PathBuf,
    /// Raw GraphQL text.
    pub content: String,
    /// Kind of input.
    pub kind: UnitKind,
}

impl SourceUnit {
    /// A schema file.
    pub fn schema(logical_path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            logical_path: logical_path.into(),
            content: content.into(),
            kind: UnitKind::Schema,
        }
    }

    /// A standalone document file.
    pub fn document(logical_path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            logical_path: logical_path.into(),
            content: content.into(),
            kind: UnitKind::Document,
        }
    }

    /// A `gql` literal found in the script at `logical_path`.
    pub fn literal(logical_path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            logical_path: logical_path.into(),
            content: content.into(),
            kind: UnitKind::Literal,
        }
    }

    /// A `load` call in the script at `logical_path`, with the loaded
    /// document's text already read.
    pub fn load_call(
        logical_path: impl Into<PathBuf>,
        gql_path_fragment: impl Into<String>,
        gql_rel_path: impl Into<PathBuf>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            logical_path: logical_path.into(),
            content: content.into(),
            kind: UnitKind::LoadCall {
                gql_path_fragment: gql_path_fragment.into(),
                gql_rel_path: gql_rel_path.into(),
            },
        }
    }

    /// Returns `true` for schema units.
    pub fn is_schema(&self) -> bool {
        self.kind == UnitKind::Schema
    }

    /// The logical path as a `Path`.
    pub fn path(&self) -> &Path {
        &self.logical_path
    }
}
