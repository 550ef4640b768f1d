//! Configuration file loading and validation.

use std::path::{Path, PathBuf};

use graft_common::{escapes_root, ContentHash};

use crate::env::interpolate;
use crate::error::ConfigError;
use crate::types::GraftConfig;

/// File name of the project configuration.
pub const CONFIG_FILE: &str = "graft.toml";

/// A parsed and validated configuration together with its identity.
#[derive(Debug)]
pub struct LoadedConfig {
    /// The validated configuration.
    pub config: GraftConfig,
    /// Hash of the interpolated configuration text.
    ///
    /// Folded into every schema hash, so any configuration edit invalidates
    /// all generated artifacts.
    pub config_hash: ContentHash,
}

/// Loads and validates `graft.toml` from a project directory.
pub fn load_config(project_dir: &Path) -> Result<LoadedConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(config_path: &Path) -> Result<LoadedConfig, ConfigError> {
    let content = std::fs::read_to_string(config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string, interpolating
/// variables from the process environment.
pub fn load_config_from_str(content: &str) -> Result<LoadedConfig, ConfigError> {
    load_config_with_env(content, |name| std::env::var(name).ok())
}

/// Parses and validates a configuration with a custom variable lookup.
///
/// Useful for testing without touching the process environment.
pub fn load_config_with_env(
    content: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<LoadedConfig, ConfigError> {
    let content = interpolate(content, lookup)?;
    let config: GraftConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(LoadedConfig {
        config,
        config_hash: ContentHash::from_bytes(content.as_bytes()),
    })
}

/// Validates that required fields are present and paths stay inside the project.
fn validate_config(config: &GraftConfig) -> Result<(), ConfigError> {
    if config.schema.iter().all(|s| s.trim().is_empty()) {
        return Err(ConfigError::MissingField("schema".to_string()));
    }
    if config.documents.iter().all(|d| d.trim().is_empty()) {
        return Err(ConfigError::MissingField("documents".to_string()));
    }
    if config.plugins.is_empty() {
        return Err(ConfigError::MissingField("plugins".to_string()));
    }

    for doc in &config.documents {
        if escapes_root(Path::new(doc)) {
            return Err(ConfigError::ValidationError(format!(
                "document glob '{doc}' must be relative and must not escape the project root; \
                 set `cwd` to a common parent directory instead"
            )));
        }
    }

    let dirs = [
        ("cache_dir", &config.cache_dir),
        ("gen_dts_dir", &config.gen_dts_dir),
        ("type_inject_entrypoint", &config.type_inject_entrypoint),
    ];
    for (field, value) in dirs {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(field.to_string()));
        }
        if escapes_root(&PathBuf::from(value)) {
            return Err(ConfigError::ValidationError(format!(
                "{field} '{value}' must be relative and must not escape the project root"
            )));
        }
    }

    if config.backend.command.trim().is_empty() {
        return Err(ConfigError::MissingField("backend.command".to_string()));
    }

    if config.plugins.iter().any(|p| p == "typescript") {
        tracing::warn!(
            "plugin \"typescript\" is redundant: schema types are always generated \
             and imported by each document's output"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
schema = "schema/**/*.graphqls"
documents = ["src/**/*.graphql", "src/**/*.tsx"]
plugins = ["typescript-operations", "typescript-react-apollo"]
"#;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parse_minimal_config() {
        let loaded = load_config_with_env(MINIMAL, no_env).unwrap();
        assert_eq!(loaded.config.schema, vec!["schema/**/*.graphqls"]);
        assert_eq!(loaded.config.plugins.len(), 2);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
schema = ["schema/a.graphqls", "schema/b.graphqls"]
documents = "src/**/*.{graphql,tsx}"
plugins = ["typescript-operations"]
cwd = "app"
cache_dir = ".cache/graft"
gen_dts_dir = "types/__generated__"
type_inject_entrypoint = "types/graft.d.ts"
silent = true

[generate_options]
avoidOptionals = true

[backend]
command = "node"
args = ["codegen.js"]
"#;
        let loaded = load_config_with_env(toml, no_env).unwrap();
        let c = &loaded.config;
        assert_eq!(c.cwd.as_deref(), Some("app"));
        assert_eq!(c.cache_dir, ".cache/graft");
        assert_eq!(c.gen_dts_dir, "types/__generated__");
        assert!(c.silent);
        assert_eq!(
            c.generate_options.get("avoidOptionals"),
            Some(&toml::Value::Boolean(true))
        );
        assert_eq!(c.backend.command, "node");
    }

    #[test]
    fn config_hash_tracks_content() {
        let a = load_config_with_env(MINIMAL, no_env).unwrap();
        let b = load_config_with_env(MINIMAL, no_env).unwrap();
        assert_eq!(a.config_hash, b.config_hash);

        let edited = format!("{MINIMAL}silent = true\n");
        let c = load_config_with_env(&edited, no_env).unwrap();
        assert_ne!(a.config_hash, c.config_hash);
    }

    #[test]
    fn config_hash_covers_interpolated_values() {
        let toml = r#"
schema = "${SCHEMA}"
documents = "src/**/*.graphql"
plugins = ["typescript-operations"]
"#;
        let a = load_config_with_env(toml, |_| Some("a.graphqls".to_string())).unwrap();
        let b = load_config_with_env(toml, |_| Some("b.graphqls".to_string())).unwrap();
        assert_eq!(a.config.schema, vec!["a.graphqls"]);
        assert_ne!(a.config_hash, b.config_hash);
    }

    #[test]
    fn missing_schema_field_is_parse_error() {
        let toml = r#"
documents = "src/**/*.graphql"
plugins = ["typescript-operations"]
"#;
        let err = load_config_with_env(toml, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn misspelled_key_is_rejected() {
        let toml = format!("{MINIMAL}cacheDir = \".cache/elsewhere\"\n");
        let err = load_config_with_env(&toml, no_env).unwrap_err();
        match err {
            ConfigError::ParseError(msg) => assert!(msg.contains("cacheDir"), "{msg}"),
            other => panic!("expected parse error, got {other}"),
        }
    }

    #[test]
    fn retired_entrypoint_keys_are_rejected() {
        for key in ["schemaEntrypoint", "gqlDtsEntrypoint"] {
            let toml = format!("{MINIMAL}{key} = \"lib/schema.ts\"\n");
            let err = load_config_with_env(&toml, no_env).unwrap_err();
            assert!(err.to_string().contains(key), "{err}");
        }
    }

    #[test]
    fn unknown_backend_key_is_rejected() {
        let toml = format!("{MINIMAL}\n[backend]\ncmd = \"node\"\n");
        assert!(matches!(
            load_config_with_env(&toml, no_env),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn empty_documents_errors() {
        let toml = r#"
schema = "schema.graphql"
documents = []
plugins = ["typescript-operations"]
"#;
        let err = load_config_with_env(toml, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f == "documents"));
    }

    #[test]
    fn empty_plugins_errors() {
        let toml = r#"
schema = "schema.graphql"
documents = "src/**/*.graphql"
plugins = []
"#;
        let err = load_config_with_env(toml, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f == "plugins"));
    }

    #[test]
    fn escaping_documents_rejected() {
        let toml = r#"
schema = "schema.graphql"
documents = "../shared/**/*.graphql"
plugins = ["typescript-operations"]
"#;
        let err = load_config_with_env(toml, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn escaping_cache_dir_rejected() {
        let toml = r#"
schema = "schema.graphql"
documents = "src/**/*.graphql"
plugins = ["typescript-operations"]
cache_dir = "/tmp/graft"
"#;
        let err = load_config_with_env(toml, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn undefined_variable_errors() {
        let toml = r#"
schema = "${SCHEMA_PATH}"
documents = "src/**/*.graphql"
plugins = ["typescript-operations"]
"#;
        let err = load_config_with_env(toml, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::UndefinedVariable(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_with_env("this is not valid toml {{{}}}", no_env).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_project_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), MINIMAL).unwrap();
        let loaded = load_config(dir.path()).unwrap();
        assert_eq!(loaded.config.documents.len(), 2);
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
