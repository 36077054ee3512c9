//! cc-guardrails: a PreToolUse hook for Claude Code that enforces project governance.
//!
//! The hook receives one tool invocation (a file read, a file write/edit, or
//! a shell command) and answers with exactly one decision:
//! `{"decision":"allow"}` or `{"decision":"block","reason":"..."}`.
//! Invocations are routed by tool kind to independent checkers built from
//! configuration; anything the hook cannot understand is allowed.
//!
//! # Architecture
//!
//! - **[`parse`]** — Hook envelope decoding, path normalization, command tokenizing.
//! - **[`eval`]** — Dispatcher, decision type and emitter, per-invocation context.
//! - **[`checks`]** — Policy checkers: architecture-first, read protection,
//!   write-path containment, SQL governance, slug validation.
//! - **[`config`]** — Configuration loading: embedded defaults + user/project overlay merge.
//! - **[`logging`]** — File logging to `~/.local/share/cc-guardrails/guardrails.log`.

/// Policy checker trait and per-family implementations.
pub mod checks;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Evaluation engine: dispatcher, decision type, check context.
pub mod eval;
/// File-based logging.
pub mod logging;
/// Hook input parsing: envelope decoding, path normalization, tokenizing.
pub mod parse;

use eval::Decision;
use parse::Workspace;

/// Build the dispatcher from default config and evaluate a raw hook envelope.
///
/// This is the main entry point for tests and simple usage.
/// For CLI usage with overlays or a single checker, build the dispatcher directly.
pub fn evaluate(input: &str, workspace: &Workspace) -> Decision {
    let config = config::Config::default_config();
    let dispatcher = eval::Dispatcher::from_config(&config);
    dispatcher.dispatch(input, None, workspace)
}
