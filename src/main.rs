//! cc-guardrails: PreToolUse hook for Claude Code.
//!
//! Reads one hook envelope as JSON from stdin and writes exactly one
//! decision document to stdout, then exits 0. Bad input is allowed, never
//! reported as a failure to the host.
//!
//! Usage:
//!   cc-guardrails [--tool <Read|Write|Edit|Bash>] [--check <name>] [--dump-config]
//!
//!   --tool         tool kind to assume when the envelope has no `tool_name`
//!   --check        run only the named checker (e.g. `read-protection`)
//!   --dump-config  print the merged configuration as TOML and exit

use std::io::Read;

use cc_guardrails::checks;
use cc_guardrails::config::Config;
use cc_guardrails::eval::{Decision, Dispatcher};
use cc_guardrails::logging;
use cc_guardrails::parse::{ToolKind, Workspace};

#[derive(Debug, Default, PartialEq)]
struct Args {
    tool: Option<ToolKind>,
    check: Option<String>,
    dump_config: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Args {
    let mut parsed = Args::default();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--tool" => match iter.next() {
                Some(name) => {
                    parsed.tool = ToolKind::from_tool_name(&name);
                    if parsed.tool.is_none() {
                        log::warn!("unknown --tool {name}; ignored");
                    }
                }
                None => log::warn!("--tool needs a value"),
            },
            "--check" => match iter.next() {
                Some(name) => parsed.check = Some(name),
                None => log::warn!("--check needs a value"),
            },
            "--dump-config" => parsed.dump_config = true,
            other => log::warn!("unknown argument {other}; ignored"),
        }
    }
    parsed
}

fn main() {
    logging::init();
    let args = parse_args(std::env::args().skip(1));

    let config = Config::load_user();
    let workspace = Workspace::from_env(&config.settings.project_dir_env);
    let config = config.with_project_overlay(workspace.root());

    if args.dump_config {
        match config.to_toml() {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => eprintln!("cc-guardrails: failed to render config: {e}"),
        }
        return;
    }

    let dispatcher = match &args.check {
        Some(name) => Dispatcher::single(name, &config).unwrap_or_else(|| {
            log::warn!("unknown checker {name}; allowing everything");
            Dispatcher::empty()
        }),
        None => Dispatcher::from_config(&config),
    };

    let hint = args.tool.or_else(|| {
        args.check
            .as_deref()
            .and_then(checks::family_of)
            .map(|family| family.default_kind())
    });

    let mut input = String::new();
    let decision = match std::io::stdin().read_to_string(&mut input) {
        Ok(_) => dispatcher.dispatch(&input, hint, &workspace),
        Err(e) => {
            log::warn!("fail-open: failed to read stdin: {e}");
            let decision = Decision::allow();
            logging::log_decision(hint, None, &decision);
            decision
        }
    };

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = decision.emit(&mut stdout) {
        log::error!("failed to write decision: {e}");
    }
}
