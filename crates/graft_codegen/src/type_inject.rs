//! The type-inject entrypoint.
//!
//! A single declaration file that overloads `gql` and `load` once per cached
//! literal or load-call, so editors resolve the result type of each call site
//! without running graft's bundler integration. It is rebuilt from the cache
//! alone, never from sources.

use std::path::Path;

use graft_cache::fs::atomic_write;
use graft_cache::{ArtifactCache, CacheError};
use graft_common::{relative_path, to_slash};

/// Name of the type each generated declaration exports for injection.
pub const INJECTION_TYPE: &str = "__GraftTypeInjection";

const HEADER: &str = "/* eslint-disable */\n/* This file is generated by graft. Do not edit. */\n";

/// Renders the entrypoint text for the current cache state.
///
/// `entrypoint` is relative to the project root, like every cached path.
pub fn render_type_inject(cache: &ArtifactCache, entrypoint: &Path) -> String {
    let from_dir = entrypoint.parent().unwrap_or_else(|| Path::new(""));
    let mut out = String::from(HEADER);
    let mut index = 0usize;

    for (_, entries) in cache.sources() {
        for entry in entries.values() {
            let signature = match (&entry.gql_content, &entry.gql_path_fragment) {
                (Some(content), _) => format!("gql(gql: `{}`)", escape_template(content)),
                (None, Some(fragment)) => format!("load(path: '{}')", escape_quoted(fragment)),
                (None, None) => continue,
            };
            let dts = to_slash(&relative_path(from_dir, &entry.dts_rel_path));
            let module = dts.strip_suffix(".d.ts").unwrap_or(&dts);
            let module = if module.starts_with("../") {
                module.to_string()
            } else {
                format!("./{module}")
            };
            out.push_str(&format!(
                "import * as T{index} from '{}';\n",
                escape_quoted(&module)
            ));
            out.push_str(&format!(
                "export declare function {signature}: T{index}.{INJECTION_TYPE};\n"
            ));
            index += 1;
        }
    }

    if index == 0 {
        out.push_str("export {};\n");
    }
    out
}

/// Writes the entrypoint under the cache's project root.
pub fn write_type_inject(cache: &ArtifactCache, entrypoint: &Path) -> Result<(), CacheError> {
    let text = render_type_inject(cache, entrypoint);
    atomic_write(&cache.cwd().join(entrypoint), text.as_bytes())?;
    tracing::debug!(path = %entrypoint.display(), "wrote type-inject entrypoint");
    Ok(())
}

fn escape_template(s: &str) -> String {
    s.replace('\\', "\\\\").replace('`', "\\`").replace("${", "\\${")
}

fn escape_quoted(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_cache::CacheEntry;
    use graft_common::ContentHash;
    use std::path::PathBuf;

    fn cache() -> (tempfile::TempDir, ArtifactCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new(dir.path(), Path::new(".cache/graft"), "0.1.0");
        (dir, cache)
    }

    fn entry(dts: &str, content: Option<&str>, fragment: Option<&str>) -> CacheEntry {
        CacheEntry {
            tsx_rel_path: PathBuf::from("unused.tsx"),
            dts_rel_path: PathBuf::from(dts),
            gql_content: content.map(str::to_string),
            gql_path_fragment: fragment.map(str::to_string),
        }
    }

    #[test]
    fn empty_cache_renders_module() {
        let (_dir, cache) = cache();
        let text = render_type_inject(&cache, Path::new("node_modules/@types/graft/index.d.ts"));
        assert!(text.starts_with("/* eslint-disable */"));
        assert!(text.ends_with("export {};\n"));
    }

    #[test]
    fn overloads_literals_and_loads() {
        let (_dir, mut cache) = cache();
        cache.record(
            Path::new("src/app.tsx"),
            ContentHash::from_bytes(b"a"),
            entry("__generated__/types/src/app.tsx-a.d.ts", Some("query A { a }"), None),
        );
        cache.record(
            Path::new("src/app.tsx"),
            ContentHash::from_bytes(b"b"),
            entry("__generated__/types/src/app.tsx-b.d.ts", None, Some("./viewer.graphql")),
        );
        cache.record(
            Path::new("src/viewer.graphql"),
            ContentHash::from_bytes(b"v"),
            entry("__generated__/types/src/viewer.graphql-v.d.ts", None, None),
        );

        let text = render_type_inject(&cache, Path::new("node_modules/@types/graft/index.d.ts"));
        assert!(text.contains(
            "from '../../../__generated__/types/src/app.tsx-a';\n\
             export declare function gql(gql: `query A { a }`)"
        ));
        assert!(text.contains("export declare function load(path: './viewer.graphql')"));
        assert!(!text.contains("viewer.graphql-v"));
        assert_eq!(text.matches("import * as T").count(), 2);
        assert!(!text.contains("export {};"));
    }

    #[test]
    fn sibling_directory_gets_dot_prefix() {
        let (_dir, mut cache) = cache();
        cache.record(
            Path::new("src/app.tsx"),
            ContentHash::from_bytes(b"a"),
            entry("types/src/app.tsx-a.d.ts", Some("{ a }"), None),
        );
        let text = render_type_inject(&cache, Path::new("index.d.ts"));
        assert!(text.contains("from './types/src/app.tsx-a';"));
    }

    #[test]
    fn escapes_template_syntax() {
        assert_eq!(escape_template("a`b${c}\\"), "a\\`b\\${c}\\\\");
        assert_eq!(escape_quoted("it's"), "it\\'s");
    }

    #[test]
    fn write_lands_under_project_root() {
        let (dir, cache) = cache();
        write_type_inject(&cache, Path::new("node_modules/@types/graft/index.d.ts")).unwrap();
        assert!(dir.path().join("node_modules/@types/graft/index.d.ts").is_file());
    }
}
