use std::path::Path;

use crate::checks::PolicyCheck;
use crate::config::Config;
use crate::eval::{CheckContext, Decision, Family};
use crate::parse::{ToolFamily, basename};

pub const NAME: &str = "architecture-first";

/// Blocks writes under protected prefixes until an approved plan exists.
///
/// Plan approval is a presence check only: any entry in the plans
/// directory whose name ends in a plan extension counts.
pub struct ArchitectureFirstCheck {
    protected_prefixes: Vec<String>,
    plans_dir: String,
    plan_extensions: Vec<String>,
    governance: String,
}

impl ArchitectureFirstCheck {
    pub fn from_config(config: &Config) -> Self {
        let a = &config.architecture;
        Self {
            protected_prefixes: a
                .protected_prefixes
                .iter()
                .filter(|p| !p.is_empty())
                .cloned()
                .collect(),
            plans_dir: a.plans_dir.clone(),
            plan_extensions: a.plan_extensions.clone(),
            governance: config.settings.governance_tag.clone(),
        }
    }

    fn is_protected(&self, relative: &str) -> bool {
        self.protected_prefixes
            .iter()
            .any(|prefix| relative.starts_with(prefix.as_str()))
    }

    fn has_approved_plan(&self, root: &Path) -> bool {
        let Ok(entries) = std::fs::read_dir(root.join(&self.plans_dir)) else {
            return false;
        };
        entries.filter_map(Result::ok).any(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            self.plan_extensions
                .iter()
                .any(|ext| name.ends_with(ext.as_str()))
        })
    }
}

impl PolicyCheck for ArchitectureFirstCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    fn family(&self) -> ToolFamily {
        ToolFamily::Write
    }

    fn evaluate(&self, ctx: &CheckContext) -> Decision {
        let Some(path) = ctx.path() else {
            return Decision::allow();
        };
        let relative = &path.relative_to_root;

        if !self.is_protected(relative) {
            return Decision::allow();
        }
        if self.has_approved_plan(ctx.workspace.root()) {
            log::debug!("{relative} is protected but an approved plan exists");
            return Decision::allow();
        }

        let plans_dir = self.plans_dir.trim_end_matches('/');
        Decision::block(
            Family::ArchitectureFirst,
            &self.governance,
            &format!(
                "Cannot write to {relative} without an approved plan document. \
                 Create a plan doc in {plans_dir}/ first (e.g., migration-{}.md), then retry. \
                 This ensures database changes are reviewed before implementation.",
                basename(relative)
            ),
        )
    }
}
