use crate::checks::PolicyCheck;
use crate::config::Config;
use crate::eval::{CheckContext, Decision, Family};
use crate::parse::{ToolFamily, basename};

pub const NAME: &str = "read-protection";

/// Which part of the path a pattern looks at.
///
/// Most patterns only see the basename; `path_contains` sees the whole
/// path, so `config/credentials/app.json` is caught but `secret/notes.md`
/// is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Basename,
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchKind {
    Prefix,
    Contains,
    Suffix,
    Exact,
}

/// One row of the sensitive-file table.
#[derive(Debug, Clone)]
struct SensitivePattern {
    scope: Scope,
    kind: MatchKind,
    /// Lowercased.
    needle: String,
}

impl SensitivePattern {
    fn matches(&self, basename: &str, path: &str) -> bool {
        let haystack = match self.scope {
            Scope::Basename => basename,
            Scope::Path => path,
        };
        match self.kind {
            MatchKind::Prefix => haystack.starts_with(&self.needle),
            MatchKind::Contains => haystack.contains(&self.needle),
            MatchKind::Suffix => haystack.ends_with(&self.needle),
            MatchKind::Exact => haystack == self.needle,
        }
    }

    fn describe(&self) -> String {
        let subject = match self.scope {
            Scope::Basename => "name",
            Scope::Path => "path",
        };
        match self.kind {
            MatchKind::Prefix => format!("{subject} starts with '{}'", self.needle),
            MatchKind::Contains => format!("{subject} contains '{}'", self.needle),
            MatchKind::Suffix => format!("{subject} ends with '{}'", self.needle),
            MatchKind::Exact => format!("key file '{}'", self.needle),
        }
    }
}

/// Blocks reads of env files, credentials, secrets and private keys.
pub struct ReadProtectionCheck {
    allow_basenames: Vec<String>,
    /// Evaluated in order; the first match names the block reason.
    patterns: Vec<SensitivePattern>,
    governance: String,
}

impl ReadProtectionCheck {
    pub fn from_config(config: &Config) -> Self {
        let r = &config.read_protection;
        let table: [(&[String], Scope, MatchKind); 5] = [
            (r.basename_prefixes.as_slice(), Scope::Basename, MatchKind::Prefix),
            (r.path_contains.as_slice(), Scope::Path, MatchKind::Contains),
            (r.basename_contains.as_slice(), Scope::Basename, MatchKind::Contains),
            (r.basename_suffixes.as_slice(), Scope::Basename, MatchKind::Suffix),
            (r.basename_exact.as_slice(), Scope::Basename, MatchKind::Exact),
        ];

        let patterns = table
            .into_iter()
            .flat_map(|(needles, scope, kind)| {
                needles
                    .iter()
                    .filter(|n| !n.is_empty())
                    .map(move |n| SensitivePattern {
                        scope,
                        kind,
                        needle: n.to_lowercase(),
                    })
            })
            .collect();

        Self {
            allow_basenames: r.allow_basenames.iter().map(|b| b.to_lowercase()).collect(),
            patterns,
            governance: config.settings.governance_tag.clone(),
        }
    }

    fn first_match(&self, basename: &str, path: &str) -> Option<&SensitivePattern> {
        self.patterns.iter().find(|p| p.matches(basename, path))
    }
}

impl PolicyCheck for ReadProtectionCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    fn family(&self) -> ToolFamily {
        ToolFamily::Read
    }

    fn evaluate(&self, ctx: &CheckContext) -> Decision {
        let Some(path) = ctx.path() else {
            return Decision::allow();
        };
        let path_lower = path.raw.to_lowercase();
        let name = basename(&path_lower);

        if self.allow_basenames.iter().any(|b| b == name) {
            return Decision::allow();
        }

        match self.first_match(name, &path_lower) {
            Some(pattern) => Decision::block(
                Family::ReadProtection,
                &self.governance,
                &format!(
                    "Blocked read of sensitive file: {name} ({}). \
                     If you need this file, ask the user to provide the contents directly.",
                    pattern.describe()
                ),
            ),
            None => Decision::allow(),
        }
    }
}
