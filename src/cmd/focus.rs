/*!
`focus.rs`

Implements the single command of the `i3-focus` CLI: focus the first window
whose title matches SEARCH (case-insensitive).

Flow:
  - Build `[title="(?i)<SEARCH>"] focus` (see `query.rs`)
  - `--dry-run`: print the message, never touch the IPC tool
  - Otherwise: hand the message to an `IpcSender` exactly once

Which window wins when several titles match is decided by the window
manager. The tool's exit code and output are not interpreted; only a failed
launch is an error here.

JSON Success Output:
{
  "status": "ok",
  "search": "Terminal",
  "mode": "regex",
  "message": "[title=\"(?i)Terminal\"] focus",
  "tool": "i3-msg",
  "dry_run": false,
  "exit_code": 0,
  "elapsed_ms": 3,
  "stdout": "[{\"success\":true}]\n",
  "stderr": ""
}

JSON Error Output:
{
  "status": "error",
  "message": "...",
  "error": "Failed to launch IPC tool: 'i3-msg'"
}
*/

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cmd::query::{FocusQuery, MatchMode};
use crate::ipc::{IpcSender, LaunchReport};
use crate::log_debug;

#[derive(Args, Debug, Clone)]
pub struct FocusArgs {
    /// Case-insensitive title pattern (a regex fragment unless --literal)
    #[arg(value_name = "SEARCH")]
    pub search: String,

    /// Escape regex metacharacters and quotes so SEARCH matches as plain text
    #[arg(long)]
    pub literal: bool,

    /// Print the IPC message instead of sending it
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Output JSON (captures the IPC tool's output)
    #[arg(long)]
    pub json: bool,

    /// IPC tool command line (falls back to I3_FOCUS_TOOL, then i3-msg)
    #[arg(short = 'T', long = "tool", value_name = "CMD")]
    pub tool: Option<String>,
}

impl FocusArgs {
    pub fn mode(&self) -> MatchMode {
        if self.literal {
            MatchMode::Literal
        } else {
            MatchMode::Regex
        }
    }

    pub fn query(&self) -> FocusQuery {
        FocusQuery::new(self.search.clone(), self.mode())
    }
}

#[derive(Serialize, Debug)]
struct FocusReport<'a> {
    status: &'static str,
    search: &'a str,
    mode: String,
    message: &'a str,
    tool: &'a str,
    dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stderr: Option<String>,
}

impl<'a> FocusReport<'a> {
    fn new(query: &'a FocusQuery, message: &'a str, tool: &'a str, dry_run: bool) -> Self {
        Self {
            status: "ok",
            search: query.search(),
            mode: query.mode().to_string(),
            message,
            tool,
            dry_run,
            exit_code: None,
            elapsed_ms: None,
            stdout: None,
            stderr: None,
        }
    }

    fn with_launch(mut self, report: LaunchReport) -> Self {
        self.exit_code = report.exit_code;
        self.elapsed_ms = Some(u64::try_from(report.elapsed_ms).unwrap_or(u64::MAX));
        self.stdout = report.stdout;
        self.stderr = report.stderr;
        self
    }
}

#[derive(Serialize, Debug)]
struct FocusFailure<'a> {
    status: &'static str,
    message: &'a str,
    error: String,
}

impl<'a> FocusFailure<'a> {
    fn new(message: &'a str, err: &anyhow::Error) -> Self {
        Self {
            status: "error",
            message,
            error: format!("{err:#}"),
        }
    }
}

/// Entry point for the focus command.
///
/// `tool_label` only names the tool in output; `sender` does the work.
pub fn execute_focus(args: &FocusArgs, tool_label: &str, sender: &dyn IpcSender) -> Result<()> {
    let query = args.query();
    let message = query.message();
    log_debug!("search={:?} mode={} message={}", args.search, query.mode(), message);

    if args.dry_run {
        if args.json {
            print_json(&FocusReport::new(&query, &message, tool_label, true));
        } else {
            println!("{message}");
        }
        return Ok(());
    }

    match sender.send(&message) {
        Ok(report) => {
            if !report.tool_succeeded() {
                log_debug!("{tool_label} reported exit code {:?}", report.exit_code);
            }
            if args.json {
                print_json(&FocusReport::new(&query, &message, tool_label, false).with_launch(report));
            }
            Ok(())
        }
        Err(e) => {
            if args.json {
                print_json(&FocusFailure::new(&message, &e));
            }
            Err(e)
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => println!(r#"{{"status":"error","error":"serialize: {e}"}}"#),
    }
}
