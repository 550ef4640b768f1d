//! Lexical helpers for project-relative logical paths.
//!
//! Logical paths identify sources and artifacts independently of the machine
//! the build runs on, so none of these helpers touch the filesystem.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

/// Renders a path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        let part: Cow<'_, str> = match component {
            Component::RootDir => {
                out.push('/');
                continue;
            }
            Component::CurDir => Cow::Borrowed("."),
            Component::ParentDir => Cow::Borrowed(".."),
            Component::Normal(s) => s.to_string_lossy(),
            Component::Prefix(p) => p.as_os_str().to_string_lossy(),
        };
        if !out.is_empty() && !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(&part);
    }
    out
}

/// Lexically removes `.` components and folds `..` into their parent.
///
/// Leading `..` components that cannot be folded are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last = parts.last().copied();
                match last {
                    Some(Component::Normal(_)) => {
                        parts.pop();
                    }
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                    _ => parts.push(component),
                }
            }
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// Returns `true` if `path` is absolute or climbs above the directory it is
/// relative to.
pub fn escapes_root(path: &Path) -> bool {
    if path.has_root() || path.is_absolute() {
        return true;
    }
    let mut depth: i64 = 0;
    for component in path.components() {
        match component {
            Component::ParentDir => depth -= 1,
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return true,
        }
        if depth < 0 {
            return true;
        }
    }
    false
}

/// Computes the relative path from directory `from` to `to`.
///
/// Both inputs must be relative to the same root.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from = normalize(from);
    let to = normalize(to);
    let from_parts: Vec<_> = from.components().collect();
    let to_parts: Vec<_> = to.components().collect();
    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..from_parts.len() {
        rel.push("..");
    }
    for part in &to_parts[common..] {
        rel.push(part);
    }
    rel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_slash_joins_components() {
        let p = Path::new("src").join("pages").join("index.tsx");
        assert_eq!(to_slash(&p), "src/pages/index.tsx");
    }

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(
            normalize(Path::new("src/./a/../b.graphql")),
            PathBuf::from("src/b.graphql")
        );
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn escapes_root_detection() {
        assert!(escapes_root(Path::new("../schema.graphql")));
        assert!(escapes_root(Path::new("a/../../b")));
        assert!(escapes_root(Path::new("/abs/path")));
        assert!(!escapes_root(Path::new("a/../b")));
        assert!(!escapes_root(Path::new("./src/**/*.graphql")));
    }

    #[test]
    fn relative_path_siblings() {
        let rel = relative_path(
            Path::new("node_modules/@types/graft"),
            Path::new("__generated__/types/src/a.tsx-1.d.ts"),
        );
        assert_eq!(
            to_slash(&rel),
            "../../../__generated__/types/src/a.tsx-1.d.ts"
        );
    }

    #[test]
    fn relative_path_descendant() {
        let rel = relative_path(Path::new("a"), Path::new("a/b/c"));
        assert_eq!(to_slash(&rel), "b/c");
    }
}
