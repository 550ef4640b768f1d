//! Turns source units into codegen contexts.
//!
//! Every hash is chained on its upstream identity: schema files on the
//! configuration hash, everything else on the combined schema identity. A
//! document therefore gets a new hash, and new artifacts, whenever the schema
//! or configuration changes even if its own text did not.

use graft_cache::{ArtifactCache, PathResolver};
use graft_common::{to_slash, ContentHash};
use rayon::prelude::*;

use crate::context::{CodegenContext, FileContext, LiteralContext, LoadContext};
use crate::error::CodegenError;
use crate::source::{SourceUnit, UnitKind};
use crate::strip::strip_ignored_characters;

/// Hash of one schema file under a configuration.
fn schema_unit_hash(config_hash: &ContentHash, content: &str) -> ContentHash {
    ContentHash::chained(config_hash, &strip_ignored_characters(content))
}

/// Combined identity of every schema unit in `units`, in order.
///
/// Returns `None` if `units` contains no schema.
pub fn schema_identity(config_hash: &ContentHash, units: &[SourceUnit]) -> Option<ContentHash> {
    let hashes: Vec<ContentHash> = units
        .par_iter()
        .filter(|unit| unit.is_schema())
        .map(|unit| schema_unit_hash(config_hash, &unit.content))
        .collect();
    if hashes.is_empty() {
        None
    } else {
        Some(ContentHash::combine(&hashes))
    }
}

/// Builds [`CodegenContext`]s against one project layout and cache state.
///
/// Only reads the cache; deciding `skip` never mutates it.
pub struct CodegenContextBuilder<'a> {
    resolver: &'a PathResolver,
    cache: &'a ArtifactCache,
}

impl<'a> CodegenContextBuilder<'a> {
    /// Creates a builder over a resolver and a loaded cache.
    pub fn new(resolver: &'a PathResolver, cache: &'a ArtifactCache) -> Self {
        Self { resolver, cache }
    }

    /// Builds one context per unit, in input order.
    ///
    /// The schema identity is derived from the schema units in the batch, so
    /// a batch containing documents must also contain the schema.
    pub fn build(
        &self,
        units: &[SourceUnit],
        config_hash: &ContentHash,
    ) -> Result<Vec<CodegenContext>, CodegenError> {
        match schema_identity(config_hash, units) {
            Some(schema_hash) => Ok(self.build_with_upstream(units, config_hash, &schema_hash)),
            None if units.is_empty() => Ok(Vec::new()),
            None => Err(CodegenError::MissingSchema),
        }
    }

    /// Builds one context per unit against an explicit schema identity.
    pub fn build_with_upstream(
        &self,
        units: &[SourceUnit],
        config_hash: &ContentHash,
        schema_hash: &ContentHash,
    ) -> Vec<CodegenContext> {
        units
            .par_iter()
            .map(|unit| self.context_for(unit, config_hash, schema_hash))
            .collect()
    }

    fn context_for(
        &self,
        unit: &SourceUnit,
        config_hash: &ContentHash,
        schema_hash: &ContentHash,
    ) -> CodegenContext {
        let stripped = strip_ignored_characters(&unit.content);
        let hash = match &unit.kind {
            UnitKind::Schema => ContentHash::chained(config_hash, &stripped),
            UnitKind::Document | UnitKind::Literal => ContentHash::chained(schema_hash, &stripped),
            UnitKind::LoadCall { gql_rel_path, .. } => ContentHash::chained(
                schema_hash,
                &format!("{}\n{stripped}", to_slash(gql_rel_path)),
            ),
        };
        let paths = self.resolver.resolve(unit.path(), &hash);
        let skip = self.cache.is_fresh(unit.path(), &hash);

        match &unit.kind {
            UnitKind::Schema => CodegenContext::SchemaImport(FileContext {
                gql_rel_path: unit.logical_path.clone(),
                gql_hash: hash,
                paths,
                skip,
            }),
            UnitKind::Document => CodegenContext::DocumentImport(FileContext {
                gql_rel_path: unit.logical_path.clone(),
                gql_hash: hash,
                paths,
                skip,
            }),
            UnitKind::Literal => CodegenContext::GqlCall(LiteralContext {
                src_rel_path: unit.logical_path.clone(),
                gql_content: unit.content.clone(),
                stripped_gql_content: stripped,
                gql_hash: hash,
                paths,
                skip,
            }),
            UnitKind::LoadCall {
                gql_path_fragment,
                gql_rel_path,
            } => CodegenContext::LoadCall(LoadContext {
                src_rel_path: unit.logical_path.clone(),
                gql_path_fragment: gql_path_fragment.clone(),
                gql_rel_path: gql_rel_path.clone(),
                gql_hash: hash,
                paths,
                skip,
            }),
        }
    }
}
