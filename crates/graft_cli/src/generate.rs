//! `graft gen`: full incremental build of the project.

use graft_codegen::RunSummary;

use crate::discover::discover;
use crate::pipeline::{load_project, orchestrator};
use crate::GlobalArgs;

/// Runs the `graft gen` command.
///
/// Discovers every source, generates what is stale, removes artifacts of
/// deleted sources and prints a one-line summary. Returns exit code 0 on
/// success.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_project(global)?;
    let units = discover(&config)?;

    let mut orch = orchestrator(&config);
    orch.run_project(&units)?;

    if !global.quiet && !config.silent {
        eprintln!("{}", summary_line(&orch.summary()));
    }
    Ok(0)
}

fn summary_line(summary: &RunSummary) -> String {
    let mut line = format!(
        "   Generated {} artifact(s), {} up to date",
        summary.generated, summary.skipped
    );
    let removed = summary.pruned + summary.removed_sources;
    if removed > 0 {
        line.push_str(&format!(", {removed} stale removed"));
    }
    line
}
