//! Codegen backend that runs an external command.
//!
//! The request is written to the command's stdin as JSON. The command
//! answers on stdout with either `{"outputs": [{"tsx": .., "dts": ..}]}` or
//! `{"errors": [{"message": .., "locations": [..]}]}`.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use graft_codegen::{BackendError, CodegenBackend, GenerateRequest, GeneratedOutput};
use graft_config::ResolvedConfig;
use serde::Deserialize;

/// Spawns one backend process per request.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    command: String,
    args: Vec<String>,
    cwd: PathBuf,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    outputs: Vec<GeneratedOutput>,
    #[serde(default)]
    errors: Vec<BackendError>,
}

impl CommandBackend {
    /// Creates a backend running `command args..` in `cwd`.
    pub fn new(command: impl Into<String>, args: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            args,
            cwd: cwd.into(),
        }
    }

    /// Creates the backend named by a configuration.
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new(
            config.backend.command.clone(),
            config.backend.args.clone(),
            config.cwd.clone(),
        )
    }
}

impl CodegenBackend for CommandBackend {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<Vec<GeneratedOutput>, BackendError> {
        let input = serde_json::to_vec(request)
            .map_err(|e| BackendError::new(format!("failed to encode codegen request: {e}")))?;

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BackendError::new(format!("failed to start `{}`: {e}", self.command)))?;

        // Stdin is written concurrently; a backend may fill stdout before
        // it has read the whole request.
        let writer = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || stdin.write_all(&input))
        });

        let output = child
            .wait_with_output()
            .map_err(|e| BackendError::new(format!("failed to wait for `{}`: {e}", self.command)))?;

        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Ok(Err(e)) => {
                    return Err(BackendError::new(format!(
                        "failed to write request to `{}`: {e}",
                        self.command
                    )));
                }
                Err(_) => return Err(BackendError::new("request writer thread panicked")),
            }
        }

        tracing::debug!(
            command = %self.command,
            source = %request.source_path.display(),
            status = %output.status,
            "backend finished"
        );
        parse_response(
            &self.command,
            output.status.success(),
            &output.stdout,
            &output.stderr,
        )
    }
}

/// Interprets a backend's exit status and output streams.
fn parse_response(
    command: &str,
    success: bool,
    stdout: &[u8],
    stderr: &[u8],
) -> Result<Vec<GeneratedOutput>, BackendError> {
    let stderr = String::from_utf8_lossy(stderr);
    let stderr = stderr.trim();

    match serde_json::from_slice::<Response>(stdout) {
        Ok(response) if !response.errors.is_empty() => Err(merge_errors(response.errors)),
        Ok(response) if success => Ok(response.outputs),
        Ok(_) => Err(BackendError::new(exit_message(command, stderr))),
        Err(e) if success => Err(BackendError::new(format!(
            "`{command}` produced invalid output: {e}"
        ))),
        Err(_) => Err(BackendError::new(exit_message(command, stderr))),
    }
}

fn exit_message(command: &str, stderr: &str) -> String {
    if stderr.is_empty() {
        format!("`{command}` exited with an error")
    } else {
        stderr.to_string()
    }
}

fn merge_errors(mut errors: Vec<BackendError>) -> BackendError {
    if errors.len() == 1 {
        return errors.remove(0);
    }
    BackendError {
        message: errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        locations: errors.into_iter().flat_map(|e| e.locations).collect(),
    }
}
