//! Configuration types deserialized from `graft.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

/// Default cache directory, relative to the project root.
pub const DEFAULT_CACHE_DIR: &str = "node_modules/.cache/graft";

/// Default directory for generated type declarations, relative to the project root.
pub const DEFAULT_GEN_DTS_DIR: &str = "__generated__/types";

/// Default location of the aggregated type-inject declaration file.
pub const DEFAULT_TYPE_INJECT_ENTRYPOINT: &str = "node_modules/@types/graft/index.d.ts";

/// Default executable used as the codegen backend.
pub const DEFAULT_BACKEND_COMMAND: &str = "graft-codegen";

/// The top-level project configuration parsed from `graft.toml`.
///
/// Unknown keys are rejected so a misspelled setting does not silently fall
/// back to its default.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraftConfig {
    /// Schema file globs (or a single glob).
    #[serde(deserialize_with = "deserialize_string_or_vec")]
    pub schema: Vec<String>,
    /// Document globs: `.graphql` files and sources containing `gql` literals.
    #[serde(deserialize_with = "deserialize_string_or_vec")]
    pub documents: Vec<String>,
    /// Codegen plugin names handed to the backend.
    pub plugins: Vec<String>,
    /// Project root relative to the directory containing `graft.toml`.
    #[serde(default)]
    pub cwd: Option<String>,
    /// Directory for intermediate modules and the cache manifest.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    /// Directory for generated `.d.ts` files.
    #[serde(default = "default_gen_dts_dir")]
    pub gen_dts_dir: String,
    /// Path of the aggregated declaration file for `gql`/`load` calls.
    #[serde(default = "default_type_inject_entrypoint")]
    pub type_inject_entrypoint: String,
    /// Suppress progress output.
    #[serde(default)]
    pub silent: bool,
    /// Free-form options passed through to the backend.
    #[serde(default)]
    pub generate_options: toml::Table,
    /// How to invoke the codegen backend.
    #[serde(default)]
    pub backend: BackendConfig,
}

/// External codegen backend invocation.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Executable name or path.
    #[serde(default = "default_backend_command")]
    pub command: String,
    /// Extra arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            command: default_backend_command(),
            args: Vec::new(),
        }
    }
}

fn default_cache_dir() -> String {
    DEFAULT_CACHE_DIR.to_string()
}

fn default_gen_dts_dir() -> String {
    DEFAULT_GEN_DTS_DIR.to_string()
}

fn default_type_inject_entrypoint() -> String {
    DEFAULT_TYPE_INJECT_ENTRYPOINT.to_string()
}

fn default_backend_command() -> String {
    DEFAULT_BACKEND_COMMAND.to_string()
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Allows `schema = "schema.graphql"` as well as
/// `schema = ["a.graphqls", "b.graphqls"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}
