//! Policy checkers: one module per rule family.
//!
//! Each checker is built once from configuration and then evaluated as a
//! pure function of the invocation context. Checkers never block without
//! having matched their own rule set.

/// Writes under protected prefixes need an approved plan document.
pub mod architecture;
/// Reads of env files, credentials, and key material.
pub mod read;
/// Inline schema-mutating SQL in shell commands.
pub mod sql;
/// Slug grammar for agent/squad creation commands.
pub mod slug;
/// Writes must resolve inside the project root.
pub mod write_path;

use crate::config::Config;
use crate::eval::{CheckContext, Decision};
use crate::parse::ToolFamily;

/// Trait for policy checkers.
///
/// Each implementation evaluates one rule family against a normalized
/// invocation and returns the resulting decision.
pub trait PolicyCheck: Send + Sync {
    /// Registration name, as used in `[dispatch]` lists and `--check`.
    fn name(&self) -> &'static str;

    /// Tool family this checker is registered for.
    fn family(&self) -> ToolFamily;

    /// Evaluate the invocation and return a decision.
    fn evaluate(&self, ctx: &CheckContext) -> Decision;
}

/// All checker names with their families.
pub const CHECKS: &[(&str, ToolFamily)] = &[
    (architecture::NAME, ToolFamily::Write),
    (write_path::NAME, ToolFamily::Write),
    (read::NAME, ToolFamily::Read),
    (sql::NAME, ToolFamily::Command),
    (slug::NAME, ToolFamily::Command),
];

/// Family of a checker by name.
pub fn family_of(name: &str) -> Option<ToolFamily> {
    CHECKS.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

/// Build a checker by name. `None` for unknown names.
pub fn build(name: &str, config: &Config) -> Option<Box<dyn PolicyCheck>> {
    let check: Box<dyn PolicyCheck> = match name {
        architecture::NAME => Box::new(architecture::ArchitectureFirstCheck::from_config(config)),
        write_path::NAME => Box::new(write_path::WritePathCheck::from_config(config)),
        read::NAME => Box::new(read::ReadProtectionCheck::from_config(config)),
        sql::NAME => Box::new(sql::SqlGovernanceCheck::from_config(config)),
        slug::NAME => Box::new(slug::SlugValidationCheck::from_config(config)),
        _ => return None,
    };
    Some(check)
}
