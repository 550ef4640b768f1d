//! Deterministic artifact paths derived from a logical path and content hash.
//!
//! The intermediate module lands under the cache directory and the type
//! declaration under the generated-types directory. Both mirror the logical
//! path's directory structure and append the content hash to the basename,
//! so `src/viewer.graphql` at hash `h` becomes
//! `<cache_dir>/src/viewer.graphql-h.tsx` and
//! `<gen_dts_dir>/src/viewer.graphql-h.d.ts`.

use std::path::{Path, PathBuf};

use graft_common::ContentHash;
use serde::{Deserialize, Serialize};

/// Extension of generated intermediate modules.
pub const TSX_EXT: &str = "tsx";

/// Extension of generated type declarations.
pub const DTS_EXT: &str = "d.ts";

/// Locations of the files generated for one `(logical path, hash)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    /// Intermediate module, relative to the project root.
    pub tsx_rel_path: PathBuf,
    /// Intermediate module, absolute.
    pub tsx_full_path: PathBuf,
    /// Type declaration, relative to the project root.
    pub dts_rel_path: PathBuf,
    /// Type declaration, absolute.
    pub dts_full_path: PathBuf,
}

/// Computes the artifact paths for a logical source at a content hash.
///
/// Pure and total. `logical_path` is project-relative and already validated
/// not to escape the project root; `gen_dts_dir` and `cache_dir` are relative
/// to `cwd`.
pub fn resolve_paths(
    logical_path: &Path,
    hash: &ContentHash,
    gen_dts_dir: &Path,
    cache_dir: &Path,
    cwd: &Path,
) -> ArtifactPaths {
    let base = logical_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = logical_path.parent().unwrap_or_else(|| Path::new(""));
    let stem = format!("{base}-{hash}");

    let tsx_rel_path = cache_dir.join(dir).join(format!("{stem}.{TSX_EXT}"));
    let dts_rel_path = gen_dts_dir.join(dir).join(format!("{stem}.{DTS_EXT}"));

    ArtifactPaths {
        tsx_full_path: cwd.join(&tsx_rel_path),
        dts_full_path: cwd.join(&dts_rel_path),
        tsx_rel_path,
        dts_rel_path,
    }
}

/// [`resolve_paths`] bound to one project layout.
#[derive(Debug, Clone)]
pub struct PathResolver {
    cwd: PathBuf,
    cache_dir: PathBuf,
    gen_dts_dir: PathBuf,
}

impl PathResolver {
    /// Creates a resolver for a project root and its relative artifact directories.
    pub fn new(cwd: &Path, cache_dir: &Path, gen_dts_dir: &Path) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            cache_dir: cache_dir.to_path_buf(),
            gen_dts_dir: gen_dts_dir.to_path_buf(),
        }
    }

    /// Resolves the artifact paths for a logical source at a content hash.
    pub fn resolve(&self, logical_path: &Path, hash: &ContentHash) -> ArtifactPaths {
        resolve_paths(
            logical_path,
            hash,
            &self.gen_dts_dir,
            &self.cache_dir,
            &self.cwd,
        )
    }

    /// The project root.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// The cache directory, relative to the project root.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PathResolver {
        PathResolver::new(
            Path::new("/project"),
            Path::new("node_modules/.cache/graft"),
            Path::new("__generated__/types"),
        )
    }

    #[test]
    fn mirrors_logical_directory() {
        let hash = ContentHash::from_bytes(b"viewer");
        let paths = resolver().resolve(Path::new("src/queries/viewer.graphql"), &hash);
        assert_eq!(
            paths.dts_rel_path,
            PathBuf::from(format!("__generated__/types/src/queries/viewer.graphql-{hash}.d.ts"))
        );
        assert_eq!(
            paths.tsx_rel_path,
            PathBuf::from(format!(
                "node_modules/.cache/graft/src/queries/viewer.graphql-{hash}.tsx"
            ))
        );
        assert_eq!(paths.dts_full_path, Path::new("/project").join(&paths.dts_rel_path));
        assert_eq!(paths.tsx_full_path, Path::new("/project").join(&paths.tsx_rel_path));
    }

    #[test]
    fn top_level_file() {
        let hash = ContentHash::from_bytes(b"schema");
        let paths = resolver().resolve(Path::new("schema.graphqls"), &hash);
        assert_eq!(
            paths.dts_rel_path,
            PathBuf::from(format!("__generated__/types/schema.graphqls-{hash}.d.ts"))
        );
    }

    #[test]
    fn deterministic() {
        let hash = ContentHash::from_bytes(b"x");
        let a = resolver().resolve(Path::new("src/a.tsx"), &hash);
        let b = resolver().resolve(Path::new("src/a.tsx"), &hash);
        assert_eq!(a, b);
    }

    #[test]
    fn different_hashes_never_collide() {
        let h1 = ContentHash::from_bytes(b"v1");
        let h2 = ContentHash::from_bytes(b"v2");
        let a = resolver().resolve(Path::new("src/a.graphql"), &h1);
        let b = resolver().resolve(Path::new("src/a.graphql"), &h2);
        assert_ne!(a.tsx_rel_path, b.tsx_rel_path);
        assert_ne!(a.dts_rel_path, b.dts_rel_path);
    }

    #[test]
    fn different_sources_never_collide() {
        let hash = ContentHash::from_bytes(b"same");
        let a = resolver().resolve(Path::new("src/a.graphql"), &hash);
        let b = resolver().resolve(Path::new("lib/a.graphql"), &hash);
        assert_ne!(a.dts_rel_path, b.dts_rel_path);
    }

    #[test]
    fn free_function_matches_resolver() {
        let hash = ContentHash::from_bytes(b"y");
        let direct = resolve_paths(
            Path::new("src/b.tsx"),
            &hash,
            Path::new("__generated__/types"),
            Path::new("node_modules/.cache/graft"),
            Path::new("/project"),
        );
        assert_eq!(direct, resolver().resolve(Path::new("src/b.tsx"), &hash));
    }
}
