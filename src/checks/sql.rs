use regex::{Regex, RegexBuilder};

use crate::checks::PolicyCheck;
use crate::config::Config;
use crate::eval::{CheckContext, Decision, Family};
use crate::parse::ToolFamily;

pub const NAME: &str = "sql-governance";

/// Blocks inline DDL in shell commands.
///
/// SQL run from a file (`psql -f`) and the supabase CLI are always let
/// through; everything else is scanned against the DDL pattern list.
pub struct SqlGovernanceCheck {
    file_exec_command: String,
    file_exec_flag: String,
    safe_prefixes: Vec<String>,
    safe_substrings: Vec<String>,
    migrations_dir: String,
    patterns: Vec<Regex>,
    governance: String,
}

/// Compile case-insensitive patterns, dropping (and logging) invalid ones.
fn compile_patterns(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match RegexBuilder::new(p).case_insensitive(true).build() {
            Ok(re) => Some(re),
            Err(e) => {
                log::warn!("ignoring invalid DDL pattern {p:?}: {e}");
                None
            }
        })
        .collect()
}

fn non_empty(items: &[String]) -> Vec<String> {
    items.iter().filter(|s| !s.is_empty()).cloned().collect()
}

impl SqlGovernanceCheck {
    pub fn from_config(config: &Config) -> Self {
        let q = &config.sql;
        Self {
            file_exec_command: q.file_exec_command.clone(),
            file_exec_flag: q.file_exec_flag.clone(),
            safe_prefixes: non_empty(&q.safe_prefixes),
            safe_substrings: non_empty(&q.safe_substrings),
            migrations_dir: q.migrations_dir.clone(),
            patterns: compile_patterns(&q.ddl_patterns),
            governance: config.settings.governance_tag.clone(),
        }
    }

    /// File-based execution or an allow-listed CLI.
    fn is_safe_invocation(&self, command: &str) -> bool {
        let file_exec = !self.file_exec_command.is_empty()
            && !self.file_exec_flag.is_empty()
            && command.contains(self.file_exec_command.as_str())
            && command.contains(self.file_exec_flag.as_str());
        if file_exec {
            return true;
        }

        let trimmed = command.trim();
        self.safe_prefixes
            .iter()
            .any(|p| trimmed.starts_with(p.as_str()))
            || self
                .safe_substrings
                .iter()
                .any(|s| command.contains(s.as_str()))
    }
}

impl PolicyCheck for SqlGovernanceCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    fn family(&self) -> ToolFamily {
        ToolFamily::Command
    }

    fn evaluate(&self, ctx: &CheckContext) -> Decision {
        let Some(command) = ctx.command() else {
            return Decision::allow();
        };
        if self.is_safe_invocation(command) {
            return Decision::allow();
        }

        let Some(found) = self.patterns.iter().find_map(|re| re.find(command)) else {
            return Decision::allow();
        };
        let matched = found.as_str().split_whitespace().collect::<Vec<_>>().join(" ");

        Decision::block(
            Family::SqlGovernance,
            &self.governance,
            &format!(
                "Inline DDL detected in bash command ('{matched}'). \
                 Write your SQL to a migration file in {} first, \
                 then execute via '{} {} <file>' or 'supabase db push'. \
                 Inline DDL is blocked to ensure all schema changes are tracked and reviewable.",
                self.migrations_dir, self.file_exec_command, self.file_exec_flag
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Outcome;
    use crate::parse::{InvocationRequest, ToolKind, Workspace};

    fn decide_with(config: &Config, command: &str) -> Decision {
        let check = SqlGovernanceCheck::from_config(config);
        let ws = Workspace::new("/proj");
        let mut arguments = serde_json::Map::new();
        arguments.insert("command".into(), command.into());
        let request = InvocationRequest {
            tool_kind: ToolKind::Command,
            arguments,
        };
        let ctx = CheckContext::from_request(&request, &ws).unwrap();
        check.evaluate(&ctx)
    }

    fn decide(command: &str) -> Decision {
        decide_with(&Config::default_config(), command)
    }

    fn outcome(command: &str) -> Outcome {
        decide(command).outcome()
    }

    #[test]
    fn inline_create_table_blocked() {
        assert_eq!(
            outcome(r#"psql "$DATABASE_URL" -c "CREATE TABLE cases (id uuid)""#),
            Outcome::Block
        );
    }

    #[test]
    fn every_default_ddl_form_blocked() {
        for sql in [
            "create table t (id int)",
            "ALTER TABLE t ADD COLUMN x int",
            "drop table t",
            "CREATE INDEX idx ON t (x)",
            "DROP INDEX idx",
            "create schema app",
            "DROP SCHEMA app CASCADE",
            "TRUNCATE t",
            "CREATE OR REPLACE FUNCTION f() RETURNS int",
            "drop function f",
        ] {
            let cmd = format!("echo '{sql}' | sqlite3 db.sqlite");
            assert_eq!(outcome(&cmd), Outcome::Block, "sql: {sql}");
        }
    }

    #[test]
    fn whitespace_between_keywords() {
        assert_eq!(outcome("mysql -e 'CREATE\t\tTABLE x(i int)'"), Outcome::Block);
    }

    #[test]
    fn word_boundaries_respected() {
        assert_eq!(outcome("grep -r TRUNCATED logs/"), Outcome::Allow);
        assert_eq!(outcome("echo RECREATE TABLES"), Outcome::Allow);
    }

    #[test]
    fn psql_file_execution_allowed() {
        assert_eq!(
            outcome("psql -f supabase/migrations/001.sql # CREATE TABLE"),
            Outcome::Allow
        );
    }

    #[test]
    fn supabase_cli_allowed() {
        assert_eq!(outcome("  supabase db execute 'DROP TABLE x'"), Outcome::Allow);
        assert_eq!(
            outcome("cd app && npx supabase db query 'ALTER TABLE x'"),
            Outcome::Allow
        );
    }

    #[test]
    fn plain_commands_allowed() {
        assert_eq!(outcome("npm run build"), Outcome::Allow);
        assert_eq!(outcome("psql -c 'SELECT 1'"), Outcome::Allow);
    }

    #[test]
    fn reason_names_match_and_remediation() {
        let d = decide("psql -c 'drop   table cases'");
        let reason = d.reason().unwrap();
        assert!(reason.starts_with("[AIOS SQL Governance]"));
        assert!(reason.contains("('drop table')"));
        assert!(reason.contains("supabase/migrations/"));
        assert!(reason.contains("'psql -f <file>'"));
    }

    #[test]
    fn first_declared_pattern_reported() {
        // ALTER TABLE appears first in the text, but CREATE TABLE is declared first
        let d = decide("psql -c 'ALTER TABLE a; CREATE TABLE b (i int)'");
        assert!(d.reason().unwrap().contains("'CREATE TABLE'"));
    }

    #[test]
    fn invalid_overlay_pattern_dropped() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [sql]
            ddl_patterns = ['(unclosed', '\bVACUUM\b']
        "#,
        );
        assert_eq!(outcome("echo hi"), Outcome::Allow);
        assert_eq!(
            decide_with(&config, "psql -c 'vacuum full'").outcome(),
            Outcome::Block
        );
    }
}
