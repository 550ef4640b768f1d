//! Shared pipeline helpers for CLI commands.
//!
//! Locates and loads the project configuration and wires the orchestrator to
//! the configured backend.

use std::path::{Path, PathBuf};

use graft_codegen::Orchestrator;
use graft_config::{load_config_file, resolve_config, ResolvedConfig, CONFIG_FILE};

use crate::backend::CommandBackend;
use crate::GlobalArgs;

/// Walks up from `start` looking for the nearest directory containing `graft.toml`.
///
/// Returns the directory containing `graft.toml`, or an error if none is found.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the configuration file path from global CLI args.
///
/// If `--config` is specified, uses that path (directory → its `graft.toml`).
/// Otherwise walks up from the current directory looking for `graft.toml`.
pub fn config_path(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match &global.config {
        Some(config) => {
            let p = PathBuf::from(config);
            if p.is_dir() {
                Ok(p.join(CONFIG_FILE))
            } else {
                Ok(p)
            }
        }
        None => Ok(find_project_root(&std::env::current_dir()?)?.join(CONFIG_FILE)),
    }
}

/// Loads, validates and resolves the project configuration.
pub fn load_project(global: &GlobalArgs) -> Result<ResolvedConfig, Box<dyn std::error::Error>> {
    let path = config_path(global)?;
    load_project_at(&path)
}

/// Loads and resolves the configuration at an explicit file path.
pub fn load_project_at(path: &Path) -> Result<ResolvedConfig, Box<dyn std::error::Error>> {
    let loaded = load_config_file(path)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let config = resolve_config(&loaded, dir)?;
    tracing::debug!(cwd = %config.cwd.display(), config_hash = %config.config_hash, "loaded configuration");
    Ok(config)
}

/// Builds an orchestrator that shells out to the configured backend.
pub fn orchestrator(config: &ResolvedConfig) -> Orchestrator<CommandBackend> {
    Orchestrator::from_config(config, CommandBackend::from_config(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
schema = "schema.graphqls"
documents = "src/**/*.graphql"
plugins = ["typescript-operations"]
"#;

    #[test]
    fn find_root_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), CONFIG).unwrap();
        let nested = dir.path().join("src").join("pages");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_root(&nested).unwrap(), dir.path());
    }

    #[test]
    fn find_root_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_project_root(dir.path()).unwrap_err();
        assert!(err.to_string().contains("could not find graft.toml"));
    }

    #[test]
    fn config_flag_accepts_directory() {
        let dir = tempfile::tempdir().unwrap();
        let global = GlobalArgs {
            quiet: false,
            verbose: false,
            config: Some(dir.path().to_string_lossy().into_owned()),
        };
        assert_eq!(config_path(&global).unwrap(), dir.path().join(CONFIG_FILE));
    }

    #[test]
    fn load_project_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, CONFIG).unwrap();
        let config = load_project_at(&path).unwrap();
        assert_eq!(config.cwd, graft_common::normalize(dir.path()));
        assert_eq!(config.plugins, vec!["typescript-operations"]);
    }

    #[test]
    fn load_project_names_the_file_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "schema = ").unwrap();
        let err = load_project_at(&path).unwrap_err();
        assert!(err.to_string().contains("graft.toml"));
    }
}
