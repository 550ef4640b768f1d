//! Source discovery: glob expansion, file reading and call-site scanning.
//!
//! Schema globs yield schema units. Document globs yield `.graphql` documents
//! and scripts, which are scanned for `gql(`...`)` literals and
//! `load("./x.graphql")` calls. Every logical path is project-relative and
//! uses `/` separators.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use graft_codegen::SourceUnit;
use graft_common::{escapes_root, normalize, to_slash};
use graft_config::ResolvedConfig;
use rayon::prelude::*;

/// How a discovered file contributes units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    /// A GraphQL document (`.graphql`, `.graphqls`, `.gql`).
    Document,
    /// A script that may contain `gql` and `load` calls.
    Script,
}

/// A call site found in a script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptCall {
    /// Text of a `gql` template literal.
    Literal(String),
    /// Argument of a `load` call.
    Load(String),
}

/// Detects the file kind from its extension.
///
/// Returns `None` for unrecognized extensions.
pub fn detect_kind(path: &Path) -> Option<FileKind> {
    match path.extension()?.to_str()? {
        "graphql" | "graphqls" | "gql" => Some(FileKind::Document),
        "ts" | "tsx" | "mts" | "cts" | "js" | "jsx" | "mjs" | "cjs" => Some(FileKind::Script),
        _ => None,
    }
}

/// Expands globs relative to `cwd` into sorted, de-duplicated logical paths.
pub fn expand_globs(
    cwd: &Path,
    patterns: &[String],
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let root = glob::Pattern::escape(&cwd.to_string_lossy());
    let mut files = BTreeSet::new();

    for pattern in patterns {
        let full = format!("{root}/{}", pattern.trim_start_matches("./"));
        let entries = glob::glob(&full)
            .map_err(|e| format!("invalid glob pattern '{pattern}': {e}"))?;
        for entry in entries {
            let path = entry.map_err(|e| format!("glob error: {e}"))?;
            if !path.is_file() {
                continue;
            }
            if let Ok(rel) = path.strip_prefix(cwd) {
                files.insert(logical(rel));
            }
        }
    }
    Ok(files.into_iter().collect())
}

/// Discovers every unit of the project: schema units first, then the units
/// of each document-glob file in path order.
pub fn discover(config: &ResolvedConfig) -> Result<Vec<SourceUnit>, Box<dyn std::error::Error>> {
    let schema_files = expand_globs(&config.cwd, &config.schema)?;
    let schema_set: HashSet<&PathBuf> = schema_files.iter().collect();
    let document_files: Vec<PathBuf> = expand_globs(&config.cwd, &config.documents)?
        .into_iter()
        .filter(|p| !schema_set.contains(p))
        .collect();

    let mut units = read_schema(&config.cwd, &schema_files)?;
    let per_file = document_files
        .par_iter()
        .map(|rel| units_in_file(&config.cwd, rel))
        .collect::<Result<Vec<_>, String>>()?;
    units.extend(per_file.into_iter().flatten());

    tracing::debug!(
        schema = schema_files.len(),
        files = document_files.len(),
        units = units.len(),
        "discovered sources"
    );
    Ok(units)
}

/// Discovers the schema units plus the units of one file.
///
/// `rel` is the file's logical path. A file matched by the schema globs
/// contributes only the schema.
pub fn discover_file(
    config: &ResolvedConfig,
    rel: &Path,
) -> Result<Vec<SourceUnit>, Box<dyn std::error::Error>> {
    let schema_files = expand_globs(&config.cwd, &config.schema)?;
    let rel = logical(rel);
    let mut units = read_schema(&config.cwd, &schema_files)?;
    if !schema_files.contains(&rel) {
        units.extend(units_in_file(&config.cwd, &rel)?);
    }
    Ok(units)
}

fn read_schema(cwd: &Path, files: &[PathBuf]) -> Result<Vec<SourceUnit>, String> {
    files
        .par_iter()
        .map(|rel| read(cwd, rel).map(|content| SourceUnit::schema(rel.clone(), content)))
        .collect()
}

fn units_in_file(cwd: &Path, rel: &Path) -> Result<Vec<SourceUnit>, String> {
    match detect_kind(rel) {
        Some(FileKind::Document) => Ok(vec![SourceUnit::document(rel, read(cwd, rel)?)]),
        Some(FileKind::Script) => script_units(cwd, rel, &read(cwd, rel)?),
        None => {
            tracing::debug!(path = %rel.display(), "ignoring file with unknown extension");
            Ok(Vec::new())
        }
    }
}

fn script_units(cwd: &Path, rel: &Path, source: &str) -> Result<Vec<SourceUnit>, String> {
    let dir = rel.parent().unwrap_or_else(|| Path::new(""));
    let mut units = Vec::new();

    for call in scan_script(source) {
        match call {
            ScriptCall::Literal(text) if text.contains("${") => {
                tracing::warn!(
                    path = %rel.display(),
                    "skipping gql literal with ${{}} interpolation; move it to a .graphql file"
                );
            }
            ScriptCall::Literal(text) => units.push(SourceUnit::literal(rel, text)),
            ScriptCall::Load(fragment) => {
                let target = logical(&dir.join(&fragment));
                if escapes_root(&target) {
                    return Err(format!(
                        "{}: load(\"{fragment}\") points outside the project root",
                        rel.display()
                    ));
                }
                let content = read(cwd, &target)
                    .map_err(|e| format!("{}: load(\"{fragment}\"): {e}", rel.display()))?;
                units.push(SourceUnit::load_call(rel, fragment, target, content));
            }
        }
    }
    Ok(units)
}

fn read(cwd: &Path, rel: &Path) -> Result<String, String> {
    std::fs::read_to_string(cwd.join(rel))
        .map_err(|e| format!("failed to read {}: {e}", rel.display()))
}

/// Normalized, `/`-separated form of a project-relative path.
fn logical(path: &Path) -> PathBuf {
    PathBuf::from(to_slash(&normalize(path)))
}

/// Finds `gql(`...`)` and `load("...")` calls in script text, in order.
///
/// A lexical scan: calls must not be preceded by an identifier character or
/// a `.`, and the argument must be a single literal. A `load` argument must
/// name a `.graphql`, `.graphqls` or `.gql` file.
pub fn scan_script(source: &str) -> Vec<ScriptCall> {
    let mut calls = Vec::new();
    let mut i = 0;
    while i < source.len() {
        match call_at(source, i) {
            Some((call, end)) => {
                calls.push(call);
                i = end;
            }
            None => i += 1,
        }
    }
    calls
}

fn call_at(source: &str, i: usize) -> Option<(ScriptCall, usize)> {
    let bytes = source.as_bytes();
    if i > 0 && is_ident_byte(bytes[i - 1]) {
        return None;
    }
    let (name_len, is_load) = if bytes[i..].starts_with(b"gql") {
        (3, false)
    } else if bytes[i..].starts_with(b"load") {
        (4, true)
    } else {
        return None;
    };

    let mut j = skip_whitespace(bytes, i + name_len);
    if bytes.get(j) != Some(&b'(') {
        return None;
    }
    j = skip_whitespace(bytes, j + 1);
    let quote = *bytes.get(j)?;
    let quote_ok = if is_load {
        matches!(quote, b'"' | b'\'' | b'`')
    } else {
        quote == b'`'
    };
    if !quote_ok {
        return None;
    }

    let start = j + 1;
    let mut k = start;
    loop {
        match bytes.get(k)? {
            b'\\' => k += 2,
            &c if c == quote => break,
            b'\n' if quote != b'`' => return None,
            _ => k += 1,
        }
    }

    let close = skip_whitespace(bytes, k + 1);
    if bytes.get(close) != Some(&b')') {
        return None;
    }
    let text = source[start..k].to_string();
    let call = if is_load {
        // `load` is a common name; only document arguments are ours.
        if detect_kind(Path::new(&text)) != Some(FileKind::Document) {
            tracing::debug!(argument = %text, "ignoring load() of a non-GraphQL file");
            return None;
        }
        ScriptCall::Load(text)
    } else {
        ScriptCall::Literal(text)
    };
    Some((call, close + 1))
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b == b'.'
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    i
}
