use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::ffi::OsString;

mod cmd;
mod ipc;
mod utils;

use cmd::FocusArgs;
use ipc::{IpcSender, IpcTool, ProcessSender};

/// i3-focus - focus an i3 window by case-insensitive title match
///
///   i3-focus <SEARCH>
///
/// Sends `[title="(?i)<SEARCH>"] focus` to i3-msg. SEARCH is passed through
/// unescaped, so the window manager treats it as a regex fragment; use
/// --literal for a plain-text match.
///
/// A lone argument is always SEARCH, even `-bash` or `--help`. Options only
/// apply when followed by SEARCH (`i3-focus -v Terminal`); two or more bare
/// arguments are a usage error. Print this help with `i3-focus --help --`.
///
/// Global flags / env:
///   -v / -vv        Increase verbosity
///   -q / --quiet    Errors only
///   -T / --tool     IPC tool command line (or I3_FOCUS_TOOL env), e.g. "swaymsg"
///
/// Examples:
///   i3-focus Terminal
///   i3-focus 'fire.*fox'
///   i3-focus --literal 'notes (draft)'
///   i3-focus --tool swaymsg Firefox
///   i3-focus --dry-run --json Terminal
#[derive(Parser, Debug)]
#[command(name = "i3-focus", version, author, about = "Focus an i3 window by title")]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(flatten)]
    focus: FocusArgs,
}

/// Exit status for any usage error (wrong argument count, unknown flag).
const USAGE_EXIT: i32 = 1;

impl Cli {
    /// Defaults for everything but SEARCH.
    fn bare(search: String) -> Self {
        Self {
            verbose: 0,
            quiet: false,
            focus: FocusArgs {
                search,
                literal: false,
                dry_run: false,
                json: false,
                tool: None,
            },
        }
    }
}

/// Parse an explicit argument list (argv[0] included).
///
/// One user argument is taken as SEARCH verbatim and never read as a flag.
/// Anything else goes through clap, which requires exactly one SEARCH after
/// the options and rejects zero or several.
fn parse_cli<I, T>(argv: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
    if let [_, search] = argv.as_slice() {
        return match search.to_str() {
            Some(s) => Ok(Cli::bare(s.to_string())),
            None => Err(Cli::command().error(
                ErrorKind::InvalidUtf8,
                "SEARCH must be valid UTF-8",
            )),
        };
    }
    Cli::try_parse_from(argv)
}

/// Map a clap error to an exit status: help/version are not failures.
fn parse_error_exit(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => USAGE_EXIT,
    }
}

/// Run one invocation.
///
/// `env_tool` is the I3_FOCUS_TOOL value; `connect` builds the sender and is
/// only called once the arguments are valid.
fn run<I, T, S, F>(argv: I, env_tool: Option<&str>, connect: F) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    S: IpcSender,
    F: FnOnce(IpcTool, bool) -> S,
{
    let cli = match parse_cli(argv) {
        Ok(cli) => cli,
        Err(e) => {
            // Prints usage (stderr for errors, stdout for help/version).
            let _ = e.print();
            return parse_error_exit(&e);
        }
    };

    utils::init_logging(utils::derive_level(cli.verbose, cli.quiet));

    let tool = match ipc::resolve_tool(cli.focus.tool.as_deref(), env_tool) {
        Ok(t) => t,
        Err(e) => {
            log_error!("{e:#}");
            return 1;
        }
    };
    log_trace!("resolved IPC tool: {tool}");

    let label = tool.to_string();
    let sender = connect(tool, cli.focus.json);
    match cmd::execute_focus(&cli.focus, &label, &sender) {
        Ok(()) => 0,
        Err(e) => {
            log_error!("{e:#}");
            1
        }
    }
}

fn main() {
    let env_tool = std::env::var(ipc::TOOL_ENV).ok();
    let code = run(std::env::args_os(), env_tool.as_deref(), |tool, capture| {
        ProcessSender::new(tool).capture_output(capture)
    });
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::LaunchReport;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<(String, String)>>>;

    /// Records (tool, message) pairs instead of spawning anything.
    struct Recorder {
        tool: IpcTool,
        log: Log,
    }

    impl IpcSender for Recorder {
        fn send(&self, message: &str) -> anyhow::Result<LaunchReport> {
            self.log
                .borrow_mut()
                .push((self.tool.to_string(), message.to_string()));
            Ok(LaunchReport {
                exit_code: Some(0),
                ..Default::default()
            })
        }
    }

    struct Failing;

    impl IpcSender for Failing {
        fn send(&self, _message: &str) -> anyhow::Result<LaunchReport> {
            anyhow::bail!("Failed to launch IPC tool: 'i3-msg'")
        }
    }

    fn invoke(argv: &[&str], env_tool: Option<&str>) -> (i32, Vec<(String, String)>, usize) {
        let log: Log = Rc::default();
        let connects = Rc::new(RefCell::new(0usize));
        let code = {
            let log = log.clone();
            let connects = connects.clone();
            run(argv.iter().copied(), env_tool, move |tool, _capture| {
                *connects.borrow_mut() += 1;
                Recorder { tool, log }
            })
        };
        let sent = log.borrow().clone();
        let connects = *connects.borrow();
        (code, sent, connects)
    }

    #[test]
    fn single_argument_focuses() {
        let (code, sent, _) = invoke(&["i3-focus", "Terminal"], None);
        assert_eq!(code, 0);
        assert_eq!(
            sent,
            vec![("i3-msg".to_string(), r#"[title="(?i)Terminal"] focus"#.to_string())]
        );
    }

    #[test]
    fn no_arguments_is_usage_error() {
        let (code, sent, connects) = invoke(&["i3-focus"], None);
        assert_eq!(code, 1);
        assert!(sent.is_empty());
        assert_eq!(connects, 0, "tool never set up");
    }

    #[test]
    fn two_arguments_is_usage_error() {
        let (code, sent, connects) = invoke(&["i3-focus", "a", "b"], None);
        assert_eq!(code, 1);
        assert!(sent.is_empty());
        assert_eq!(connects, 0);
    }

    #[test]
    fn metacharacters_pass_through() {
        let (code, sent, _) = invoke(&["i3-focus", "Fire*fox"], None);
        assert_eq!(code, 0);
        assert_eq!(sent[0].1, r#"[title="(?i)Fire*fox"] focus"#);
    }

    #[test]
    fn repeated_runs_issue_same_query() {
        let (_, first, _) = invoke(&["i3-focus", "Terminal"], None);
        let (_, second, _) = invoke(&["i3-focus", "Terminal"], None);
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn lone_flag_like_argument_is_search() {
        for arg in ["-bash", "--help", "-v", "-q", "--json", "--dry-run", "--", "-T"] {
            let (code, sent, _) = invoke(&["i3-focus", arg], None);
            assert_eq!(code, 0, "{arg}");
            assert_eq!(sent.len(), 1, "{arg}");
            assert_eq!(sent[0].1, format!(r#"[title="(?i){arg}"] focus"#));
        }
    }

    #[test]
    fn lone_argument_still_honours_tool_env() {
        let (_, sent, _) = invoke(&["i3-focus", "Terminal"], Some("swaymsg"));
        assert_eq!(sent[0].0, "swaymsg");
    }

    #[cfg(unix)]
    #[test]
    fn lone_non_utf8_argument_is_usage_error() {
        use std::os::unix::ffi::OsStrExt;
        let bad = std::ffi::OsStr::from_bytes(b"Term\xffinal").to_os_string();
        let argv = vec![OsString::from("i3-focus"), bad];
        let log: Log = Rc::default();
        let code = run(argv, None, |tool, _| Recorder { tool, log: log.clone() });
        assert_eq!(code, 1);
        assert!(log.borrow().is_empty());

        let argv = [OsString::from("i3-focus"), std::ffi::OsStr::from_bytes(b"\xff").into()];
        let err = parse_cli(argv).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidUtf8);
    }

    #[test]
    fn two_bare_arguments_even_with_options_are_rejected() {
        let (code, sent, _) = invoke(&["i3-focus", "-v", "a", "b"], None);
        assert_eq!(code, 1);
        assert!(sent.is_empty());
    }

    #[test]
    fn help_needs_a_second_argument() {
        let err = parse_cli(["i3-focus", "--help", "--"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn dash_prefixed_search_after_separator() {
        let (code, sent, _) = invoke(&["i3-focus", "--", "-bash"], None);
        assert_eq!(code, 0);
        assert_eq!(sent[0].1, r#"[title="(?i)-bash"] focus"#);
    }

    #[test]
    fn tool_flag_and_env_fallback() {
        let (_, sent, _) = invoke(&["i3-focus", "--tool", "swaymsg", "x"], Some("i3-msg -s /s"));
        assert_eq!(sent[0].0, "swaymsg");

        let (_, sent, _) = invoke(&["i3-focus", "x"], Some("i3-msg -s /s"));
        assert_eq!(sent[0].0, "i3-msg -s /s");
    }

    #[test]
    fn bad_tool_exits_without_sending() {
        let (code, sent, connects) = invoke(&["i3-focus", "--tool", "  ", "x"], None);
        assert_eq!(code, 1);
        assert!(sent.is_empty());
        assert_eq!(connects, 0);
    }

    #[test]
    fn dry_run_does_not_send() {
        let (code, sent, _) = invoke(&["i3-focus", "--dry-run", "Terminal"], None);
        assert_eq!(code, 0);
        assert!(sent.is_empty());
    }

    #[test]
    fn launch_failure_exits_one() {
        let code = run(["i3-focus", "Terminal"], None, |_, _| Failing);
        assert_eq!(code, 1);
    }

    #[test]
    fn help_and_version_exit_zero() {
        let err = parse_cli(["i3-focus", "-v", "--help"]).unwrap_err();
        assert_eq!(parse_error_exit(&err), 0);
        let err = parse_cli(["i3-focus", "--version", "--"]).unwrap_err();
        assert_eq!(parse_error_exit(&err), 0);
    }

    #[test]
    fn clap_parses_flags() {
        let cli = parse_cli(["i3-focus", "-vv", "--literal", "--json", "-T", "swaymsg", "Term"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.focus.literal);
        assert!(cli.focus.json);
        assert_eq!(cli.focus.tool.as_deref(), Some("swaymsg"));
        assert_eq!(cli.focus.search, "Term");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
