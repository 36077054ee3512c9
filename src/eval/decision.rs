use std::io::Write;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Allow,
    Block,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Allow => "allow",
            Outcome::Block => "block",
        }
    }
}

/// Which rule family produced a block; names the tag on the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    ArchitectureFirst,
    ReadProtection,
    WritePath,
    SqlGovernance,
    SlugValidation,
}

impl Family {
    pub fn label(self) -> &'static str {
        match self {
            Family::ArchitectureFirst => "Architecture First",
            Family::ReadProtection => "Read Protection",
            Family::WritePath => "Write Path Validation",
            Family::SqlGovernance => "SQL Governance",
            Family::SlugValidation => "Slug Validation",
        }
    }

    /// `[<governance> <label>]`, or `[<label>]` without a governance tag.
    pub fn tag(self, governance: &str) -> String {
        if governance.is_empty() {
            format!("[{}]", self.label())
        } else {
            format!("[{governance} {}]", self.label())
        }
    }
}

/// The single answer returned to the host for one invocation.
///
/// A block always carries a tagged, non-empty, single-line reason; the
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    #[serde(rename = "decision")]
    outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            outcome: Outcome::Allow,
            reason: None,
        }
    }

    pub fn block(family: Family, governance: &str, message: &str) -> Self {
        let message = message.replace(['\r', '\n'], " ");
        let reason = format!("{} {}", family.tag(governance), message.trim());
        Self {
            outcome: Outcome::Block,
            reason: Some(reason.trim_end().to_string()),
        }
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn is_block(&self) -> bool {
        self.outcome == Outcome::Block
    }

    /// `{"decision":"allow"}` or `{"decision":"block","reason":"..."}`.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            log::error!("failed to serialize decision: {e}");
            r#"{"decision":"allow"}"#.to_string()
        })
    }

    /// Write the decision document as one line.
    pub fn emit<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{}", self.to_json())?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_json() {
        assert_eq!(Decision::allow().to_json(), r#"{"decision":"allow"}"#);
    }

    #[test]
    fn block_json() {
        let d = Decision::block(Family::SlugValidation, "AIOS", "Invalid slug 'X'.");
        assert_eq!(
            d.to_json(),
            r#"{"decision":"block","reason":"[AIOS Slug Validation] Invalid slug 'X'."}"#
        );
    }

    #[test]
    fn block_reason_is_single_line() {
        let d = Decision::block(Family::WritePath, "AIOS", "line one\nline two");
        assert_eq!(
            d.reason(),
            Some("[AIOS Write Path Validation] line one line two")
        );
    }

    #[test]
    fn block_reason_never_empty() {
        let d = Decision::block(Family::ReadProtection, "", "");
        assert_eq!(d.reason(), Some("[Read Protection]"));
        assert!(d.is_block());
    }

    #[test]
    fn emit_writes_one_line() {
        let mut buf = Vec::new();
        Decision::allow().emit(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{\"decision\":\"allow\"}\n");
    }
}
