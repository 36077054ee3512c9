use std::path::{Path, PathBuf};

use log::LevelFilter;

use crate::eval::Decision;
use crate::parse::ToolKind;

/// Env var selecting the log level (`off`, `error`, ... `trace`).
pub const LOG_LEVEL_ENV: &str = "CC_GUARDRAILS_LOG";

/// Log directory, relative to `$HOME`.
const LOG_DIR: &str = ".local/share/cc-guardrails";

/// Parse a level name, defaulting to `info` when unset or unrecognized.
pub fn level_from(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Where the log file lives for a given home directory.
pub fn log_path(home: &Path) -> PathBuf {
    home.join(LOG_DIR).join("guardrails.log")
}

/// Route `log` output to ~/.local/share/cc-guardrails/guardrails.log.
/// Best-effort: failures are silently ignored (logging must never block the hook).
/// Stdout is reserved for the decision document, so nothing is ever logged there.
pub fn init() {
    let level = level_from(std::env::var(LOG_LEVEL_ENV).ok().as_deref());
    if level == LevelFilter::Off {
        return;
    }
    let Some(home) = std::env::var_os("HOME") else {
        return;
    };
    let path = log_path(Path::new(&home));
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    else {
        return;
    };

    let config = simplelog::ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();
    let _ = simplelog::WriteLogger::init(level, config, file);
}

/// One tab-separated record: kind, outcome, target, reason.
///
/// Fields the invocation never got as far as producing are written as `-`.
pub fn decision_line(kind: Option<ToolKind>, target: Option<&str>, decision: &Decision) -> String {
    let target: String = target.unwrap_or("-").chars().take(200).collect();
    format!(
        "{}\t{}\t{}\t{}",
        kind.map_or("-", ToolKind::as_str),
        decision.outcome().as_str(),
        target.replace(['\n', '\t'], " "),
        decision.reason().unwrap_or("-"),
    )
}

/// Record one emitted decision at info.
pub fn log_decision(kind: Option<ToolKind>, target: Option<&str>, decision: &Decision) {
    log::info!("{}", decision_line(kind, target, decision));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_defaults_to_info() {
        assert_eq!(level_from(None), LevelFilter::Info);
        assert_eq!(level_from(Some("loud")), LevelFilter::Info);
    }

    #[test]
    fn level_parses_names() {
        assert_eq!(level_from(Some("debug")), LevelFilter::Debug);
        assert_eq!(level_from(Some(" OFF ")), LevelFilter::Off);
        assert_eq!(level_from(Some("warn")), LevelFilter::Warn);
    }

    #[test]
    fn log_path_under_home() {
        assert_eq!(
            log_path(Path::new("/home/dev")),
            PathBuf::from("/home/dev/.local/share/cc-guardrails/guardrails.log")
        );
    }

    #[test]
    fn line_for_block() {
        let d = Decision::block(crate::eval::Family::ReadProtection, "AIOS", "no");
        assert_eq!(
            decision_line(Some(ToolKind::Read), Some(".env"), &d),
            "Read\tblock\t.env\t[AIOS Read Protection] no"
        );
    }

    #[test]
    fn line_for_fail_open() {
        assert_eq!(
            decision_line(None, None, &Decision::allow()),
            "-\tallow\t-\t-"
        );
    }

    #[test]
    fn line_target_is_flattened_and_truncated() {
        let long = format!("echo a\tb\n{}", "x".repeat(300));
        let line = decision_line(Some(ToolKind::Command), Some(&long), &Decision::allow());
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[2].chars().count(), 200);
        assert!(fields[2].starts_with("echo a b "));
    }
}
