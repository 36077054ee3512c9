use std::path::{Path, PathBuf};

use crate::checks::PolicyCheck;
use crate::config::Config;
use crate::eval::{CheckContext, Decision, Family};
use crate::parse::ToolFamily;
use crate::parse::path::resolve_physical;

pub const NAME: &str = "write-path";

/// Blocks writes whose resolved target leaves the project root.
///
/// Extra roots (the agent's own config directory by default) are accepted
/// as well, but only for paths strictly beneath them.
pub struct WritePathCheck {
    extra_roots: Vec<PathBuf>,
    governance: String,
}

impl WritePathCheck {
    pub fn from_config(config: &Config) -> Self {
        Self::with_home(config, std::env::var("HOME").ok().as_deref())
    }

    /// Build with `~` in extra roots expanded against `home`.
    ///
    /// Without a home, `~`-relative roots stay relative and are skipped.
    pub fn with_home(config: &Config, home: Option<&str>) -> Self {
        let extra_roots = config
            .write_path
            .extra_roots
            .iter()
            .filter_map(|root| expand_root(root, home))
            .collect();
        Self {
            extra_roots,
            governance: config.settings.governance_tag.clone(),
        }
    }

    /// Replace the extra roots, e.g. to avoid depending on `$HOME`.
    pub fn with_extra_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.extra_roots = roots.iter().map(|r| resolve_physical(r)).collect();
        self
    }

    fn in_extra_root(&self, resolved: &Path) -> bool {
        self.extra_roots
            .iter()
            .any(|root| resolved != root && resolved.starts_with(root))
    }
}

fn expand_root(root: &str, home: Option<&str>) -> Option<PathBuf> {
    let expanded = shellexpand::tilde_with_context(root, || home);
    let path = Path::new(expanded.as_ref());
    if !path.is_absolute() {
        log::warn!("ignoring non-absolute write root: {root}");
        return None;
    }
    Some(resolve_physical(path))
}

impl PolicyCheck for WritePathCheck {
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
        let resolved = &path.absolute_resolved;

        if ctx.workspace.contains(resolved) || self.in_extra_root(resolved) {
            return Decision::allow();
        }

        Decision::block(
            Family::WritePath,
            &self.governance,
            &format!(
                "Write target resolves outside the project directory. \
                 Target: {} -> {}. Project root: {}. \
                 All writes must be within the project root.",
                path.raw,
                resolved.display(),
                ctx.workspace.resolved_root().display()
            ),
        )
    }
}
