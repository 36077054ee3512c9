use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// User overlay location, relative to `$HOME`.
const USER_OVERLAY: &str = ".config/cc-guardrails/config.toml";

/// Project overlay location, relative to the project root.
const PROJECT_OVERLAY: &str = ".claude/guardrails.toml";

/// Errors raised while reading a configuration overlay.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub architecture: ArchitectureConfig,
    #[serde(default)]
    pub read_protection: ReadProtectionConfig,
    #[serde(default)]
    pub write_path: WritePathConfig,
    #[serde(default)]
    pub sql: SqlConfig,
    #[serde(default)]
    pub slug: SlugConfig,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Settings {
    /// Prefix of every block reason tag, e.g. `AIOS` → `[AIOS Read Protection]`.
    #[serde(default)]
    pub governance_tag: String,
    /// Env var naming the project root. Unset → current directory.
    #[serde(default)]
    pub project_dir_env: String,
}

/// Checker names per tool family, in registration order.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct DispatchConfig {
    #[serde(default)]
    pub read: Vec<String>,
    #[serde(default)]
    pub write: Vec<String>,
    #[serde(default)]
    pub command: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ArchitectureConfig {
    #[serde(default)]
    pub protected_prefixes: Vec<String>,
    /// Directory (relative to the project root) holding approved plans.
    #[serde(default)]
    pub plans_dir: String,
    #[serde(default)]
    pub plan_extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ReadProtectionConfig {
    /// Basenames that are always readable, checked before any pattern.
    #[serde(default)]
    pub allow_basenames: Vec<String>,
    #[serde(default)]
    pub basename_prefixes: Vec<String>,
    /// Matched against the whole (lowercased) path, not just the basename.
    #[serde(default)]
    pub path_contains: Vec<String>,
    #[serde(default)]
    pub basename_contains: Vec<String>,
    #[serde(default)]
    pub basename_suffixes: Vec<String>,
    #[serde(default)]
    pub basename_exact: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct WritePathConfig {
    /// Extra write roots besides the project root. `~` is expanded.
    #[serde(default)]
    pub extra_roots: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct SqlConfig {
    /// Commands mentioning this tool together with `file_exec_flag` run SQL from a file.
    #[serde(default)]
    pub file_exec_command: String,
    #[serde(default)]
    pub file_exec_flag: String,
    #[serde(default)]
    pub safe_prefixes: Vec<String>,
    #[serde(default)]
    pub safe_substrings: Vec<String>,
    /// Where migrations belong; only used in the block reason.
    #[serde(default)]
    pub migrations_dir: String,
    /// Case-insensitive regexes, evaluated in order.
    #[serde(default)]
    pub ddl_patterns: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct SlugConfig {
    #[serde(default)]
    pub creation_keywords: Vec<String>,
    #[serde(default)]
    pub slug_flags: Vec<String>,
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub grammar_hint: String,
}

// ── Overlay types (user/project config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    dispatch: DispatchOverlay,
    #[serde(default)]
    architecture: ArchitectureOverlay,
    #[serde(default)]
    read_protection: ReadProtectionOverlay,
    #[serde(default)]
    write_path: WritePathOverlay,
    #[serde(default)]
    sql: SqlOverlay,
    #[serde(default)]
    slug: SlugOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    governance_tag: Option<String>,
    project_dir_env: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct DispatchOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    read: Vec<String>,
    #[serde(default)]
    write: Vec<String>,
    #[serde(default)]
    command: Vec<String>,
    #[serde(default)]
    remove_read: Vec<String>,
    #[serde(default)]
    remove_write: Vec<String>,
    #[serde(default)]
    remove_command: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ArchitectureOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    protected_prefixes: Vec<String>,
    plans_dir: Option<String>,
    #[serde(default)]
    plan_extensions: Vec<String>,
    #[serde(default)]
    remove_protected_prefixes: Vec<String>,
    #[serde(default)]
    remove_plan_extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ReadProtectionOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    allow_basenames: Vec<String>,
    #[serde(default)]
    basename_prefixes: Vec<String>,
    #[serde(default)]
    path_contains: Vec<String>,
    #[serde(default)]
    basename_contains: Vec<String>,
    #[serde(default)]
    basename_suffixes: Vec<String>,
    #[serde(default)]
    basename_exact: Vec<String>,
    #[serde(default)]
    remove_allow_basenames: Vec<String>,
    #[serde(default)]
    remove_basename_prefixes: Vec<String>,
    #[serde(default)]
    remove_path_contains: Vec<String>,
    #[serde(default)]
    remove_basename_contains: Vec<String>,
    #[serde(default)]
    remove_basename_suffixes: Vec<String>,
    #[serde(default)]
    remove_basename_exact: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct WritePathOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    extra_roots: Vec<String>,
    #[serde(default)]
    remove_extra_roots: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct SqlOverlay {
    #[serde(default)]
    replace: bool,
    file_exec_command: Option<String>,
    file_exec_flag: Option<String>,
    #[serde(default)]
    safe_prefixes: Vec<String>,
    #[serde(default)]
    safe_substrings: Vec<String>,
    migrations_dir: Option<String>,
    #[serde(default)]
    ddl_patterns: Vec<String>,
    #[serde(default)]
    remove_safe_prefixes: Vec<String>,
    #[serde(default)]
    remove_safe_substrings: Vec<String>,
    #[serde(default)]
    remove_ddl_patterns: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct SlugOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    creation_keywords: Vec<String>,
    #[serde(default)]
    slug_flags: Vec<String>,
    pattern: Option<String>,
    grammar_hint: Option<String>,
    #[serde(default)]
    remove_creation_keywords: Vec<String>,
    #[serde(default)]
    remove_slug_flags: Vec<String>,
}

// ── Merge logic ──

/// Merge an overlay list into a default list.
/// In replace mode: overlay list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

fn merge_scalar(base: &mut String, value: Option<String>) {
    if let Some(v) = value {
        *base = v;
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/cc-guardrails/config.toml (if exists)
    ///
    /// The project overlay is applied separately with
    /// [`Config::with_project_overlay`] once the project root is known, since
    /// the user overlay may change which env var names that root.
    pub fn load_user() -> Self {
        let mut config = Self::default_config();
        if let Some(home) = std::env::var_os("HOME") {
            config.merge_file(&Path::new(&home).join(USER_OVERLAY));
        }
        config
    }

    /// Merge `<project>/.claude/guardrails.toml` (if exists).
    pub fn with_project_overlay(mut self, project_root: &Path) -> Self {
        self.merge_file(&project_root.join(PROJECT_OVERLAY));
        self
    }

    /// A broken overlay is logged and skipped; the hook keeps running on
    /// whatever merged cleanly.
    fn merge_file(&mut self, path: &Path) {
        match Self::load_overlay(path) {
            Ok(Some(overlay)) => {
                log::debug!("applying config overlay {}", path.display());
                self.apply_overlay(overlay);
            }
            Ok(None) => {}
            Err(e) => log::warn!("ignoring config overlay: {e}"),
        }
    }

    /// Read an overlay file. A missing file is not an error.
    fn load_overlay(path: &Path) -> Result<Option<ConfigOverlay>, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&content)
            .map(Some)
            .map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        // Settings: scalar overrides
        let s = overlay.settings;
        merge_scalar(&mut self.settings.governance_tag, s.governance_tag);
        merge_scalar(&mut self.settings.project_dir_env, s.project_dir_env);

        // Dispatch
        let d = overlay.dispatch;
        merge_list(&mut self.dispatch.read, d.read, &d.remove_read, d.replace);
        merge_list(&mut self.dispatch.write, d.write, &d.remove_write, d.replace);
        merge_list(
            &mut self.dispatch.command,
            d.command,
            &d.remove_command,
            d.replace,
        );

        // Architecture
        let a = overlay.architecture;
        merge_list(
            &mut self.architecture.protected_prefixes,
            a.protected_prefixes,
            &a.remove_protected_prefixes,
            a.replace,
        );
        merge_list(
            &mut self.architecture.plan_extensions,
            a.plan_extensions,
            &a.remove_plan_extensions,
            a.replace,
        );
        merge_scalar(&mut self.architecture.plans_dir, a.plans_dir);

        // Read protection
        let r = overlay.read_protection;
        let rp = &mut self.read_protection;
        merge_list(
            &mut rp.allow_basenames,
            r.allow_basenames,
            &r.remove_allow_basenames,
            r.replace,
        );
        merge_list(
            &mut rp.basename_prefixes,
            r.basename_prefixes,
            &r.remove_basename_prefixes,
            r.replace,
        );
        merge_list(
            &mut rp.path_contains,
            r.path_contains,
            &r.remove_path_contains,
            r.replace,
        );
        merge_list(
            &mut rp.basename_contains,
            r.basename_contains,
            &r.remove_basename_contains,
            r.replace,
        );
        merge_list(
            &mut rp.basename_suffixes,
            r.basename_suffixes,
            &r.remove_basename_suffixes,
            r.replace,
        );
        merge_list(
            &mut rp.basename_exact,
            r.basename_exact,
            &r.remove_basename_exact,
            r.replace,
        );

        // Write path
        let w = overlay.write_path;
        merge_list(
            &mut self.write_path.extra_roots,
            w.extra_roots,
            &w.remove_extra_roots,
            w.replace,
        );

        // SQL
        let q = overlay.sql;
        merge_list(
            &mut self.sql.safe_prefixes,
            q.safe_prefixes,
            &q.remove_safe_prefixes,
            q.replace,
        );
        merge_list(
            &mut self.sql.safe_substrings,
            q.safe_substrings,
            &q.remove_safe_substrings,
            q.replace,
        );
        merge_list(
            &mut self.sql.ddl_patterns,
            q.ddl_patterns,
            &q.remove_ddl_patterns,
            q.replace,
        );
        merge_scalar(&mut self.sql.file_exec_command, q.file_exec_command);
        merge_scalar(&mut self.sql.file_exec_flag, q.file_exec_flag);
        merge_scalar(&mut self.sql.migrations_dir, q.migrations_dir);

        // Slug
        let g = overlay.slug;
        merge_list(
            &mut self.slug.creation_keywords,
            g.creation_keywords,
            &g.remove_creation_keywords,
            g.replace,
        );
        merge_list(
            &mut self.slug.slug_flags,
            g.slug_flags,
            &g.remove_slug_flags,
            g.replace,
        );
        merge_scalar(&mut self.slug.pattern, g.pattern);
        merge_scalar(&mut self.slug.grammar_hint, g.grammar_hint);
    }

    /// Render the merged configuration as TOML (for `--dump-config`).
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    pub(crate) fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config = Config::default_config();
        assert!(!config.dispatch.read.is_empty());
        assert!(!config.dispatch.write.is_empty());
        assert!(!config.dispatch.command.is_empty());
        assert!(!config.architecture.protected_prefixes.is_empty());
        assert!(!config.sql.ddl_patterns.is_empty());
        assert!(!config.slug.creation_keywords.is_empty());
    }

    #[test]
    fn default_config_has_expected_rules() {
        let config = Config::default_config();
        assert_eq!(config.settings.project_dir_env, "CLAUDE_PROJECT_DIR");
        assert_eq!(config.architecture.plans_dir, "docs/approved-plans");
        assert!(
            config
                .architecture
                .protected_prefixes
                .contains(&"supabase/migrations/".to_string())
        );
        assert!(
            config
                .read_protection
                .allow_basenames
                .contains(&".env.example".to_string())
        );
        assert_eq!(config.write_path.extra_roots, vec!["~/.claude"]);
        assert_eq!(config.slug.pattern, "^[a-z][a-z0-9-]*$");
    }

    #[test]
    fn default_dispatch_order() {
        let config = Config::default_config();
        assert_eq!(config.dispatch.write, vec!["architecture-first", "write-path"]);
        assert_eq!(
            config.dispatch.command,
            vec!["sql-governance", "slug-validation"]
        );
    }

    #[test]
    fn default_ddl_patterns_compile() {
        let config = Config::default_config();
        for pattern in &config.sql.ddl_patterns {
            assert!(regex::Regex::new(pattern).is_ok(), "pattern: {pattern}");
        }
    }

    // ── Merge semantics ──

    #[test]
    fn overlay_extends_protected_prefixes() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [architecture]
            protected_prefixes = ["db/schema/"]
        "#,
        );
        assert!(
            config
                .architecture
                .protected_prefixes
                .contains(&"supabase/functions/".to_string())
        );
        assert!(
            config
                .architecture
                .protected_prefixes
                .contains(&"db/schema/".to_string())
        );
    }

    #[test]
    fn overlay_removes_read_pattern() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [read_protection]
            remove_basename_suffixes = [".pem"]
        "#,
        );
        assert!(config.read_protection.basename_suffixes.is_empty());
        assert!(!config.read_protection.basename_prefixes.is_empty());
    }

    #[test]
    fn overlay_replace_sql_patterns() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [sql]
            replace = true
            ddl_patterns = ['\bDROP\s+DATABASE\b']
        "#,
        );
        assert_eq!(config.sql.ddl_patterns, vec![r"\bDROP\s+DATABASE\b"]);
        assert!(config.sql.safe_prefixes.is_empty());
        // Scalars are not lists; replace leaves them alone
        assert_eq!(config.sql.file_exec_command, "psql");
    }

    #[test]
    fn overlay_scalar_overrides() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [settings]
            governance_tag = "ACME"

            [architecture]
            plans_dir = "plans"
        "#,
        );
        assert_eq!(config.settings.governance_tag, "ACME");
        assert_eq!(config.architecture.plans_dir, "plans");
        // Omitted scalar unchanged
        assert_eq!(config.settings.project_dir_env, "CLAUDE_PROJECT_DIR");
    }

    #[test]
    fn overlay_reorders_dispatch_with_replace() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [dispatch]
            replace = true
            command = ["slug-validation"]
        "#,
        );
        assert_eq!(config.dispatch.command, vec!["slug-validation"]);
        assert!(config.dispatch.read.is_empty());
    }

    #[test]
    fn overlay_no_duplicates() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [slug]
            creation_keywords = ["create-agent"]
        "#,
        );
        let count = config
            .slug
            .creation_keywords
            .iter()
            .filter(|s| *s == "create-agent")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn empty_overlay_changes_nothing() {
        let original = Config::default_config();
        let mut config = Config::default_config();
        config.apply_overlay_str("");
        assert_eq!(config.sql.ddl_patterns, original.sql.ddl_patterns);
        assert_eq!(config.dispatch.write, original.dispatch.write);
    }

    #[test]
    fn load_overlay_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_overlay(&dir.path().join("nope.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn load_overlay_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[sql\nddl_patterns = 1").unwrap();
        let err = Config::load_overlay(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn load_applies_project_overlay() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".claude")).unwrap();
        std::fs::write(
            dir.path().join(PROJECT_OVERLAY),
            "[architecture]\nplans_dir = \"design/approved\"\n",
        )
        .unwrap();
        let config = Config::default_config().with_project_overlay(dir.path());
        assert_eq!(config.architecture.plans_dir, "design/approved");
    }

    #[test]
    fn broken_project_overlay_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".claude")).unwrap();
        std::fs::write(dir.path().join(PROJECT_OVERLAY), "not = [valid").unwrap();
        let config = Config::default_config().with_project_overlay(dir.path());
        assert_eq!(config.architecture.plans_dir, "docs/approved-plans");
    }

    #[test]
    fn dump_round_trips() {
        let config = Config::default_config();
        let rendered = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.sql.ddl_patterns, config.sql.ddl_patterns);
    }
}
