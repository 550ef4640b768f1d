//! One build invocation: build contexts, generate what is stale, commit.
//!
//! The run is all-or-nothing with respect to the persisted cache. Backend
//! calls all finish before any artifact is written, and the manifest is only
//! saved once every write and prune has succeeded. The cache itself is only
//! touched from this module's sequential phases; the parallel phases borrow
//! it read-only.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use graft_cache::fs::atomic_write;
use graft_cache::{ArtifactCache, PathResolver};
use graft_common::ContentHash;
use graft_config::ResolvedConfig;
use rayon::prelude::*;

use crate::backend::{CodegenBackend, DocumentInput, GenerateRequest, GeneratedOutput};
use crate::builder::CodegenContextBuilder;
use crate::context::{is_all_skip, CodegenContext};
use crate::error::CodegenError;
use crate::source::SourceUnit;
use crate::type_inject::write_type_inject;
use crate::GRAFT_VERSION;

/// Inputs that stay fixed across runs of one [`Orchestrator`].
#[derive(Debug, Clone)]
pub struct CodegenSettings {
    /// Project layout for artifact paths.
    pub resolver: PathResolver,
    /// Identity of the configuration; every hash chains on it.
    pub config_hash: ContentHash,
    /// Plugin names forwarded to the backend.
    pub plugins: Vec<String>,
    /// Plugin options forwarded to the backend.
    pub generate_options: serde_json::Value,
    /// Type-inject entrypoint relative to the project root, if one is kept.
    pub type_inject_entrypoint: Option<PathBuf>,
}

impl CodegenSettings {
    /// Derives settings from a resolved configuration.
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self {
            resolver: PathResolver::new(&config.cwd, &config.cache_dir, &config.gen_dts_dir),
            config_hash: config.config_hash,
            plugins: config.plugins.clone(),
            generate_options: config.generate_options.clone(),
            type_inject_entrypoint: Some(config.type_inject_entrypoint.clone()),
        }
    }
}

/// Counters describing the last completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Contexts sent to the backend and written.
    pub generated: usize,
    /// Contexts whose artifacts were already valid.
    pub skipped: usize,
    /// Stale hashes removed for sources seen in the run.
    pub pruned: usize,
    /// Sources forgotten because they no longer exist.
    pub removed_sources: usize,
}

#[derive(Debug, Clone, Copy)]
enum Scope<'a> {
    /// Sources in the batch, plus the listed ones, are reconciled.
    Partial(&'a [PathBuf]),
    /// The batch is the whole project; unseen sources are removed.
    Project,
}

/// Drives [`CodegenContextBuilder`], a [`CodegenBackend`] and the
/// [`ArtifactCache`] through one build.
pub struct Orchestrator<B> {
    settings: CodegenSettings,
    cache: ArtifactCache,
    backend: B,
    summary: RunSummary,
}

impl<B: CodegenBackend> Orchestrator<B> {
    /// Creates an orchestrator from explicit parts.
    pub fn new(settings: CodegenSettings, cache: ArtifactCache, backend: B) -> Self {
        Self {
            settings,
            cache,
            backend,
            summary: RunSummary::default(),
        }
    }

    /// Creates an orchestrator for a resolved configuration.
    pub fn from_config(config: &ResolvedConfig, backend: B) -> Self {
        let cache = ArtifactCache::new(&config.cwd, &config.cache_dir, GRAFT_VERSION);
        Self::new(CodegenSettings::from_config(config), cache, backend)
    }

    /// Runs codegen for a batch of units and returns one context per unit,
    /// in input order.
    ///
    /// Only sources present in `units` are reconciled; cache rows of other
    /// sources are left alone. The batch must carry the schema units.
    pub fn run(&mut self, units: &[SourceUnit]) -> Result<Vec<CodegenContext>, CodegenError> {
        self.execute(units, Scope::Partial(&[]))
    }

    /// Like [`run`](Self::run), but also reconciles every path in `sources`
    /// even when it contributes no units.
    ///
    /// A listed source whose calls were all removed loses its cached rows
    /// and artifacts.
    pub fn run_sources(
        &mut self,
        sources: &[PathBuf],
        units: &[SourceUnit],
    ) -> Result<Vec<CodegenContext>, CodegenError> {
        self.execute(units, Scope::Partial(sources))
    }

    /// Like [`run`](Self::run), but treats `units` as the complete project and
    /// removes cached artifacts of every source not in it.
    pub fn run_project(
        &mut self,
        units: &[SourceUnit],
    ) -> Result<Vec<CodegenContext>, CodegenError> {
        self.execute(units, Scope::Project)
    }

    /// The cache as of the last run.
    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Counters of the last successful run.
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    fn execute(
        &mut self,
        units: &[SourceUnit],
        scope: Scope<'_>,
    ) -> Result<Vec<CodegenContext>, CodegenError> {
        let started = Instant::now();
        self.cache.load();

        let contexts = CodegenContextBuilder::new(&self.settings.resolver, &self.cache)
            .build(units, &self.settings.config_hash)?;

        if is_all_skip(&contexts) {
            tracing::debug!(contexts = contexts.len(), "every context is up to date");
        }
        let outputs = self.generate(units, &contexts)?;
        for (index, output) in &outputs {
            let paths = contexts[*index].paths();
            atomic_write(&paths.tsx_full_path, output.tsx.as_bytes())?;
            atomic_write(&paths.dts_full_path, output.dts.as_bytes())?;
        }

        let mut summary = RunSummary {
            generated: outputs.len(),
            skipped: contexts.len() - outputs.len(),
            ..RunSummary::default()
        };
        self.commit(&contexts, scope, &mut summary)?;
        self.summary = summary;

        tracing::info!(
            generated = summary.generated,
            skipped = summary.skipped,
            pruned = summary.pruned + summary.removed_sources,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "codegen finished"
        );
        Ok(contexts)
    }

    /// Calls the backend once per logical path with stale contexts.
    ///
    /// Returns `(context index, output)` pairs. Fails on the first backend
    /// error without writing anything.
    fn generate(
        &self,
        units: &[SourceUnit],
        contexts: &[CodegenContext],
    ) -> Result<Vec<(usize, GeneratedOutput)>, CodegenError> {
        let mut groups: BTreeMap<&Path, Vec<usize>> = BTreeMap::new();
        for (index, ctx) in contexts.iter().enumerate() {
            if !ctx.skip() {
                groups.entry(ctx.logical_path()).or_default().push(index);
            }
        }
        if groups.is_empty() {
            return Ok(Vec::new());
        }

        let schema = units
            .iter()
            .filter(|unit| unit.is_schema())
            .map(|unit| unit.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let groups: Vec<(&Path, Vec<usize>)> = groups.into_iter().collect();

        let batches = groups
            .par_iter()
            .map(|(path, indices)| {
                let request = GenerateRequest {
                    source_path: path,
                    schema: &schema,
                    documents: indices
                        .iter()
                        .map(|&i| DocumentInput {
                            kind: contexts[i].kind(),
                            hash: *contexts[i].hash(),
                            content: &units[i].content,
                        })
                        .collect(),
                    plugins: &self.settings.plugins,
                    config: &self.settings.generate_options,
                };
                tracing::debug!(source = %path.display(), documents = indices.len(), "generating");

                let outputs = self.backend.generate(&request).map_err(|source| {
                    CodegenError::Backend {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                if outputs.len() != indices.len() {
                    return Err(CodegenError::OutputMismatch {
                        path: path.to_path_buf(),
                        expected: indices.len(),
                        actual: outputs.len(),
                    });
                }
                Ok(indices.iter().copied().zip(outputs).collect::<Vec<_>>())
            })
            .collect::<Result<Vec<_>, CodegenError>>()?;

        Ok(batches.into_iter().flatten().collect())
    }

    /// Records every context, prunes stale hashes and persists the cache.
    fn commit(
        &mut self,
        contexts: &[CodegenContext],
        scope: Scope<'_>,
        summary: &mut RunSummary,
    ) -> Result<(), CodegenError> {
        let mut live: BTreeMap<PathBuf, HashSet<ContentHash>> = BTreeMap::new();
        for ctx in contexts {
            self.cache
                .record(ctx.logical_path(), *ctx.hash(), ctx.cache_entry());
            live.entry(ctx.logical_path().to_path_buf())
                .or_default()
                .insert(*ctx.hash());
        }
        if let Scope::Partial(sources) = scope {
            for source in sources {
                live.entry(source.clone()).or_default();
            }
        }

        for (source, hashes) in &live {
            summary.pruned += self.cache.prune(source, hashes)?;
        }
        if matches!(scope, Scope::Project) {
            let sources: HashSet<PathBuf> = live.into_keys().collect();
            summary.removed_sources = self.cache.retain_sources(&sources)?;
        }

        if let Some(entrypoint) = &self.settings.type_inject_entrypoint {
            let changed = summary.generated + summary.pruned + summary.removed_sources > 0;
            if changed || !self.cache.cwd().join(entrypoint).is_file() {
                write_type_inject(&self.cache, entrypoint)?;
            }
        }

        self.cache.save()?;
        Ok(())
    }
}
