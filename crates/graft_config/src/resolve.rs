//! Resolution of a validated configuration against the filesystem layout.

use std::path::{Path, PathBuf};

use graft_common::{normalize, ContentHash};

use crate::error::ConfigError;
use crate::loader::LoadedConfig;
use crate::types::BackendConfig;

/// A fully resolved configuration with the project root made absolute.
///
/// Artifact directories stay relative to `cwd`; validation has already
/// guaranteed they do not escape it.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute project root.
    pub cwd: PathBuf,
    /// Schema globs, relative to `cwd`.
    pub schema: Vec<String>,
    /// Document globs, relative to `cwd`.
    pub documents: Vec<String>,
    /// Codegen plugin names.
    pub plugins: Vec<String>,
    /// Cache directory relative to `cwd`.
    pub cache_dir: PathBuf,
    /// Generated declaration directory relative to `cwd`.
    pub gen_dts_dir: PathBuf,
    /// Type-inject entrypoint relative to `cwd`.
    pub type_inject_entrypoint: PathBuf,
    /// Backend options as JSON, ready to hand to the backend.
    pub generate_options: serde_json::Value,
    /// Backend invocation.
    pub backend: BackendConfig,
    /// Whether progress output is suppressed.
    pub silent: bool,
    /// Identity of the configuration text.
    pub config_hash: ContentHash,
}

impl ResolvedConfig {
    /// Absolute cache directory.
    pub fn cache_full_dir(&self) -> PathBuf {
        self.cwd.join(&self.cache_dir)
    }
}

/// Resolves a loaded configuration relative to the directory that contained it.
///
/// `cwd` from the configuration is joined onto `config_dir`; when absent the
/// configuration directory itself is the project root.
pub fn resolve_config(
    loaded: &LoadedConfig,
    config_dir: &Path,
) -> Result<ResolvedConfig, ConfigError> {
    let config = &loaded.config;
    let base = if config_dir.is_absolute() {
        config_dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(config_dir)
    };
    let cwd = match &config.cwd {
        Some(cwd) => normalize(&base.join(cwd)),
        None => normalize(&base),
    };

    let generate_options = serde_json::to_value(&config.generate_options)
        .map_err(|e| ConfigError::ValidationError(format!("generate_options: {e}")))?;

    Ok(ResolvedConfig {
        cwd,
        schema: config.schema.clone(),
        documents: config.documents.clone(),
        plugins: config.plugins.clone(),
        cache_dir: normalize(Path::new(&config.cache_dir)),
        gen_dts_dir: normalize(Path::new(&config.gen_dts_dir)),
        type_inject_entrypoint: normalize(Path::new(&config.type_inject_entrypoint)),
        generate_options,
        backend: config.backend.clone(),
        silent: config.silent,
        config_hash: loaded.config_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_with_env;

    fn load(toml: &str) -> LoadedConfig {
        load_config_with_env(toml, |_| None).unwrap()
    }

    #[test]
    fn cwd_defaults_to_config_dir() {
        let loaded = load(
            r#"
schema = "schema.graphql"
documents = "src/**/*.graphql"
plugins = ["typescript-operations"]
"#,
        );
        let resolved = resolve_config(&loaded, Path::new("/work/project")).unwrap();
        assert_eq!(resolved.cwd, PathBuf::from("/work/project"));
        assert_eq!(
            resolved.cache_full_dir(),
            PathBuf::from("/work/project/node_modules/.cache/graft")
        );
    }

    #[test]
    fn cwd_joined_onto_config_dir() {
        let loaded = load(
            r#"
schema = "schema.graphql"
documents = "src/**/*.graphql"
plugins = ["typescript-operations"]
cwd = "../app"
gen_dts_dir = "./types/./gen"
"#,
        );
        let resolved = resolve_config(&loaded, Path::new("/work/config")).unwrap();
        assert_eq!(resolved.cwd, PathBuf::from("/work/app"));
        assert_eq!(resolved.gen_dts_dir, PathBuf::from("types/gen"));
    }

    #[test]
    fn generate_options_become_json() {
        let loaded = load(
            r#"
schema = "schema.graphql"
documents = "src/**/*.graphql"
plugins = ["typescript-operations"]

[generate_options]
withHooks = true
scalars = { DateTime = "string" }
"#,
        );
        let resolved = resolve_config(&loaded, Path::new("/p")).unwrap();
        assert_eq!(resolved.generate_options["withHooks"], serde_json::json!(true));
        assert_eq!(
            resolved.generate_options["scalars"]["DateTime"],
            serde_json::json!("string")
        );
        assert_eq!(resolved.config_hash, loaded.config_hash);
    }
}
