//! External IPC tool handling.
//!
//! parse_tool -> IpcTool { program, args }
//! IpcSender: the single "send one IPC message" capability.
//! ProcessSender: spawns the tool as a child process (tokio).
//!
use anyhow::{Context, Result, bail};
use shell_words::split as shell_split;
use std::fmt;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

use crate::utils::ContextExt;
use crate::{log_debug, log_trace};

/// Tool used when neither `--tool` nor `I3_FOCUS_TOOL` is set.
pub const DEFAULT_TOOL: &str = "i3-msg";

/// Environment fallback for `--tool`.
pub const TOOL_ENV: &str = "I3_FOCUS_TOOL";

/// A parsed representation of the IPC tool command line.
///
/// The message is always appended after `args` as one extra argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpcTool {
    pub original: String,
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for IpcTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.program)
        } else {
            write!(f, "{} {}", self.program, self.args.join(" "))
        }
    }
}

impl Default for IpcTool {
    fn default() -> Self {
        Self {
            original: DEFAULT_TOOL.to_string(),
            program: DEFAULT_TOOL.to_string(),
            args: Vec::new(),
        }
    }
}

/// Parse a `--tool` value with shell-style splitting.
///
/// - "i3-msg"                      -> program i3-msg
/// - "i3-msg -s /run/i3/ipc.sock"  -> program i3-msg, args [-s, /run/i3/ipc.sock]
/// - "swaymsg"                     -> program swaymsg
pub fn parse_tool(raw: &str) -> Result<IpcTool> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("IPC tool command is empty");
    }

    let parts = shell_split(trimmed).context("Failed to parse IPC tool command line")?;
    let Some((program, args)) = parts.split_first() else {
        bail!("No tokens produced when parsing IPC tool command");
    };
    if program.is_empty() {
        bail!("Empty program name in IPC tool command");
    }

    Ok(IpcTool {
        original: raw.to_string(),
        program: program.clone(),
        args: args.to_vec(),
    })
}

/// Resolve the tool: explicit flag > environment > default.
///
/// `env_value` is passed in rather than read here so callers decide where
/// the environment comes from.
pub fn resolve_tool(flag: Option<&str>, env_value: Option<&str>) -> Result<IpcTool> {
    if let Some(raw) = flag {
        return parse_tool(raw).with_context(|| format!("Invalid --tool value: '{raw}'"));
    }
    if let Some(raw) = env_value
        && !raw.trim().is_empty()
    {
        return parse_tool(raw).with_context(|| format!("Invalid {TOOL_ENV} value: '{raw}'"));
    }
    Ok(IpcTool::default())
}

/// Outcome of a launched IPC tool.
///
/// Launch success only; a non-zero `exit_code` is the tool's own business.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchReport {
    /// Child exit code (None when terminated by a signal)
    pub exit_code: Option<i32>,
    pub elapsed_ms: u128,
    /// Captured output (only when capture was requested)
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl LaunchReport {
    pub fn tool_succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Send exactly one IPC message to the window manager.
///
/// Err means the message could not be delivered to the tool at all.
pub trait IpcSender {
    fn send(&self, message: &str) -> Result<LaunchReport>;
}

/// Spawns the configured tool once per message.
#[derive(Debug, Clone)]
pub struct ProcessSender {
    tool: IpcTool,
    capture: bool,
}

impl ProcessSender {
    pub fn new(tool: IpcTool) -> Self {
        Self {
            tool,
            capture: false,
        }
    }

    /// Capture stdout/stderr instead of inheriting them.
    pub fn capture_output(mut self, capture: bool) -> Self {
        self.capture = capture;
        self
    }

    async fn send_async(&self, message: &str) -> Result<LaunchReport> {
        let started = Instant::now();
        let mut cmd = Command::new(&self.tool.program);
        cmd.args(&self.tool.args).arg(message).stdin(Stdio::null());

        log_trace!("spawning: {} {:?}", self.tool, message);

        let report = if self.capture {
            let output = cmd
                .output()
                .await
                .with_context(|| format!("Failed to launch IPC tool: '{}'", self.tool.original))?;
            LaunchReport {
                exit_code: output.status.code(),
                elapsed_ms: started.elapsed().as_millis(),
                stdout: Some(String::from_utf8_lossy(&output.stdout).into_owned()),
                stderr: Some(String::from_utf8_lossy(&output.stderr).into_owned()),
            }
        } else {
            let status = cmd
                .status()
                .await
                .with_context(|| format!("Failed to launch IPC tool: '{}'", self.tool.original))?;
            LaunchReport {
                exit_code: status.code(),
                elapsed_ms: started.elapsed().as_millis(),
                stdout: None,
                stderr: None,
            }
        };

        log_debug!(
            "{} exited with {:?} after {} ms",
            self.tool.program,
            report.exit_code,
            report.elapsed_ms
        );
        Ok(report)
    }
}

impl IpcSender for ProcessSender {
    fn send(&self, message: &str) -> Result<LaunchReport> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .ctx("Failed to create Tokio runtime")?;
        rt.block_on(self.send_async(message))
    }
}
