//! graft CLI, the command-line front end of the graft codegen cache.
//!
//! Provides `graft init` for writing a starter `graft.toml`, `graft gen` for
//! a full incremental build of the project, and `graft resolve` for the
//! per-module build a bundler loader performs.

#![warn(missing_docs)]

mod backend;
mod discover;
mod generate;
mod init;
mod pipeline;
mod resolve;

use std::process;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// graft: incremental GraphQL code generation.
#[derive(Parser, Debug)]
#[command(name = "graft", version, about = "Incremental GraphQL codegen")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `graft.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a starter `graft.toml`.
    Init {
        /// Directory to initialize. Defaults to the current directory.
        dir: Option<String>,

        /// Overwrite an existing `graft.toml`.
        #[arg(short, long)]
        force: bool,
    },
    /// Generate artifacts for the whole project.
    Gen,
    /// Generate artifacts for one file and print its contexts as JSON.
    Resolve(ResolveArgs),
}

/// Arguments for the `graft resolve` subcommand.
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// A `.graphql` document or a script containing `gql`/`load` calls.
    pub file: String,

    /// Print compact JSON on one line.
    #[arg(long)]
    pub compact: bool,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    init_tracing(&global);

    let result = match cli.command {
        Command::Init { dir, force } => init::run(dir, force),
        Command::Gen => generate::run(&global),
        Command::Resolve(ref args) => resolve::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Log level selected by the global flags.
fn log_level(global: &GlobalArgs) -> Level {
    if global.quiet {
        Level::ERROR
    } else if global.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Installs the stderr log subscriber; stdout stays reserved for command output.
fn init_tracing(global: &GlobalArgs) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(global))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: a log subscriber was already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_init_default() {
        let cli = Cli::parse_from(["graft", "init"]);
        match cli.command {
            Command::Init { dir, force } => {
                assert!(dir.is_none());
                assert!(!force);
            }
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn parse_init_with_args() {
        let cli = Cli::parse_from(["graft", "init", "web", "--force"]);
        match cli.command {
            Command::Init { dir, force } => {
                assert_eq!(dir.as_deref(), Some("web"));
                assert!(force);
            }
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn parse_gen() {
        let cli = Cli::parse_from(["graft", "gen"]);
        assert!(matches!(cli.command, Command::Gen));
    }

    #[test]
    fn parse_resolve() {
        let cli = Cli::parse_from(["graft", "resolve", "src/app.tsx", "--compact"]);
        match cli.command {
            Command::Resolve(ref args) => {
                assert_eq!(args.file, "src/app.tsx");
                assert!(args.compact);
            }
            _ => panic!("expected Resolve command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["graft", "--quiet", "gen"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["graft", "gen", "--verbose"]);
        assert!(cli.verbose);
        assert!(!cli.quiet);
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from(["graft", "--config", "/path/to/graft.toml", "gen"]);
        assert_eq!(cli.config.as_deref(), Some("/path/to/graft.toml"));
    }

    #[test]
    fn resolve_requires_file() {
        assert!(Cli::try_parse_from(["graft", "resolve"]).is_err());
    }

    #[test]
    fn quiet_wins_over_verbose() {
        let global = GlobalArgs {
            quiet: true,
            verbose: true,
            config: None,
        };
        assert_eq!(log_level(&global), Level::ERROR);
        let global = GlobalArgs {
            quiet: false,
            verbose: true,
            config: None,
        };
        assert_eq!(log_level(&global), Level::DEBUG);
    }
}
