//! `graft init`: writes a starter `graft.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use graft_config::{
    CONFIG_FILE, DEFAULT_BACKEND_COMMAND, DEFAULT_CACHE_DIR, DEFAULT_GEN_DTS_DIR,
    DEFAULT_TYPE_INJECT_ENTRYPOINT,
};

/// Runs the `graft init` command.
///
/// Creates `dir` if needed. Returns exit code 0 on success.
pub fn run(dir: Option<String>, force: bool) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = match dir {
        Some(d) => {
            let dir = PathBuf::from(d);
            fs::create_dir_all(&dir)?;
            dir
        }
        None => std::env::current_dir()?,
    };

    let path = write_config(&project_dir, force)?;
    eprintln!("     Created {}", path.display());
    Ok(0)
}

/// Writes the starter configuration into `dir`, refusing to clobber an
/// existing file unless `force` is set.
fn write_config(dir: &Path, force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = dir.join(CONFIG_FILE);
    if path.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }
    fs::write(&path, starter_config())?;
    Ok(path)
}

fn starter_config() -> String {
    format!(
        r#"# Schema files. A single glob or a list of globs.
schema = "schema.graphqls"

# GraphQL documents and scripts containing gql(`...`) or load("...") calls.
documents = ["src/**/*.graphql", "src/**/*.tsx"]

# Plugins handed to the codegen backend.
plugins = ["typescript-operations", "typescript-react-apollo"]

# cache_dir = "{DEFAULT_CACHE_DIR}"
# gen_dts_dir = "{DEFAULT_GEN_DTS_DIR}"
# type_inject_entrypoint = "{DEFAULT_TYPE_INJECT_ENTRYPOINT}"

[generate_options]

[backend]
command = "{DEFAULT_BACKEND_COMMAND}"
args = []
"#
    )
}
