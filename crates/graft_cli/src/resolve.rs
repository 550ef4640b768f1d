//! `graft resolve`: per-file build for bundler loaders.

use std::path::{Path, PathBuf};

use graft_codegen::CodegenContext;
use graft_common::{normalize, to_slash};

use crate::discover::discover_file;
use crate::pipeline::{load_project, orchestrator};
use crate::{GlobalArgs, ResolveArgs};

/// Runs the `graft resolve` command.
///
/// Builds the schema plus the given file, then prints the file's contexts
/// as a JSON array on stdout. Cached rows the file no longer produces are
/// pruned; other sources' rows are left untouched.
pub fn run(args: &ResolveArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_project(global)?;
    let rel = logical_path(&config.cwd, &std::env::current_dir()?, Path::new(&args.file))?;
    let units = discover_file(&config, &rel)?;

    let mut orch = orchestrator(&config);
    let contexts = orch.run_sources(std::slice::from_ref(&rel), &units)?;
    let own: Vec<&CodegenContext> = contexts
        .iter()
        .filter(|ctx| ctx.logical_path() == rel)
        .collect();

    let json = if args.compact {
        serde_json::to_string(&own)?
    } else {
        serde_json::to_string_pretty(&own)?
    };
    println!("{json}");
    Ok(0)
}

/// Maps a command-line file argument onto its logical path under `cwd`.
fn logical_path(
    cwd: &Path,
    current_dir: &Path,
    file: &Path,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let abs = normalize(&current_dir.join(file));
    match abs.strip_prefix(cwd) {
        Ok(rel) => Ok(PathBuf::from(to_slash(rel))),
        Err(_) => Err(format!(
            "{} is outside the project root {}",
            file.display(),
            cwd.display()
        )
        .into()),
    }
}
