// src/transform/tool.rs

//! External filter tools: file contents go in on stdin, the result comes out
//! on stdout.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use tracing::debug;

use crate::errors::{PipelineError, Result};

/// A shell command used as a `stdin -> stdout` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTool {
    command: String,
    env: Vec<(String, String)>,
}

impl ExternalTool {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            env: Vec::new(),
        }
    }

    /// `None` for blank commands, so optional config fields map cleanly.
    pub fn from_config(command: Option<&str>) -> Option<Self> {
        command
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(Self::new)
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Run the tool in `cwd` with `input` on stdin and return its stdout.
    pub fn pipe(&self, input: &[u8], cwd: &Path) -> Result<Vec<u8>> {
        debug!(cmd = %self.command, bytes = input.len(), "piping through external tool");

        let mut child = shell(&self.command)
            .current_dir(cwd)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Feed stdin from another thread so a chatty tool cannot deadlock us
        // on a full stdout pipe.
        let stdin = child.stdin.take();
        let payload = input.to_vec();
        let writer = thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                // A tool that exits early closes its stdin; its exit status
                // reports the real problem.
                let _ = stdin.write_all(&payload);
            }
        });

        let output = child.wait_with_output()?;
        let _ = writer.join();

        if !output.status.success() {
            return Err(PipelineError::SubprocessError {
                cmd: self.command.clone(),
                code: output.status.code().unwrap_or(-1),
                output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

/// Build a shell invocation appropriate for the platform.
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

/// Render a tool error for a per-file failure message.
pub fn describe_failure(err: &PipelineError) -> String {
    match err {
        PipelineError::SubprocessError { cmd, code, output } if !output.is_empty() => {
            format!("`{cmd}` exited with code {code}: {output}")
        }
        other => other.to_string(),
    }
}
