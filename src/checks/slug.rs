use regex::Regex;

use crate::checks::PolicyCheck;
use crate::config::Config;
use crate::eval::{CheckContext, Decision, Family};
use crate::parse::{ToolFamily, flag_values, tokenize};

pub const NAME: &str = "slug-validation";

/// Grammar used when the configured one does not compile.
const DEFAULT_SLUG_PATTERN: &str = "^[a-z][a-z0-9-]*$";

/// Validates `--slug`/`--name`/`-n` values on agent and squad creation commands.
pub struct SlugValidationCheck {
    creation_keywords: Vec<String>,
    slug_flags: Vec<String>,
    pattern: Regex,
    grammar_hint: String,
    governance: String,
}

fn compile_slug_pattern(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| {
        log::warn!("invalid slug pattern {pattern:?}, using default: {e}");
        Regex::new(DEFAULT_SLUG_PATTERN).expect("default slug pattern must compile")
    })
}

impl SlugValidationCheck {
    pub fn from_config(config: &Config) -> Self {
        let s = &config.slug;
        Self {
            creation_keywords: s
                .creation_keywords
                .iter()
                .filter(|k| !k.is_empty())
                .cloned()
                .collect(),
            slug_flags: s.slug_flags.clone(),
            pattern: compile_slug_pattern(&s.pattern),
            grammar_hint: s.grammar_hint.clone(),
            governance: config.settings.governance_tag.clone(),
        }
    }

    fn is_creation(&self, command: &str) -> bool {
        self.creation_keywords
            .iter()
            .any(|k| command.contains(k.as_str()))
    }
}

impl PolicyCheck for SlugValidationCheck {
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
        if !self.is_creation(command) {
            return Decision::allow();
        }

        let words = tokenize(command);
        let invalid = flag_values(&words, &self.slug_flags)
            .into_iter()
            .find(|slug| !self.pattern.is_match(slug));

        match invalid {
            Some(slug) => Decision::block(
                Family::SlugValidation,
                &self.governance,
                &format!("Invalid slug '{slug}'. {}", self.grammar_hint),
            ),
            None => Decision::allow(),
        }
    }
}
