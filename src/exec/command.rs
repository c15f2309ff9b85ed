// src/exec/command.rs

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::errors::{PipelineError, Result};

/// Lines of captured output kept for error reports.
const OUTPUT_TAIL_LINES: usize = 40;

/// Result of a successful command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    /// Combined stdout/stderr tail.
    pub output: String,
}

/// Build a shell command appropriate for the platform.
fn shell(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

/// Run `cmd` through the shell in `cwd`, streaming its output into the log.
///
/// A non-zero exit is a [`PipelineError::SubprocessError`] carrying the tail
/// of the captured output.
pub async fn run_command(task: &str, cmd: &str, cwd: &Path) -> Result<CommandOutput> {
    info!(task = %task, cmd = %cmd, "starting command");

    let mut child = shell(cmd)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let stdout = child.stdout.take().map(|s| forward_lines(task, "stdout", s));
    let stderr = child.stderr.take().map(|s| forward_lines(task, "stderr", s));

    let status = child.wait().await?;

    let mut lines = Vec::new();
    for reader in [stdout, stderr].into_iter().flatten() {
        // A reader that panicked just loses its lines.
        if let Ok(mut captured) = reader.await {
            lines.append(&mut captured);
        }
    }
    let skip = lines.len().saturating_sub(OUTPUT_TAIL_LINES);
    let output = lines[skip..].join("\n");

    let code = status.code().unwrap_or(-1);
    info!(
        task = %task,
        exit_code = code,
        success = status.success(),
        "command exited"
    );

    if !status.success() {
        return Err(PipelineError::SubprocessError {
            cmd: cmd.to_string(),
            code,
            output,
        });
    }

    Ok(CommandOutput { code, output })
}

fn forward_lines<R>(task: &str, stream: &'static str, reader: R) -> JoinHandle<Vec<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let task = task.to_string();
    tokio::spawn(async move {
        let mut captured = Vec::new();
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if stream == "stdout" {
                info!(task = %task, "{}", line);
            } else {
                debug!(task = %task, "stderr: {}", line);
            }
            captured.push(line);
        }
        captured
    })
}
