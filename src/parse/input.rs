//! Hook envelope decoding: raw stdin JSON → [`InvocationRequest`].

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Which kind of tool the agent is about to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Read,
    Write,
    Edit,
    Command,
}

/// Tool kinds grouped by the checkers that apply to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolFamily {
    Read,
    Write,
    Command,
}

impl ToolKind {
    /// Map the host's `tool_name` onto a kind. Unknown tools have no checkers.
    pub fn from_tool_name(name: &str) -> Option<Self> {
        match name {
            "Read" => Some(ToolKind::Read),
            "Write" => Some(ToolKind::Write),
            "Edit" | "MultiEdit" => Some(ToolKind::Edit),
            "Bash" => Some(ToolKind::Command),
            _ => None,
        }
    }

    pub fn family(self) -> ToolFamily {
        match self {
            ToolKind::Read => ToolFamily::Read,
            ToolKind::Write | ToolKind::Edit => ToolFamily::Write,
            ToolKind::Command => ToolFamily::Command,
        }
    }

    /// The `tool_input` field holding what this kind of tool acts on.
    pub fn target_key(self) -> &'static str {
        match self {
            ToolKind::Command => "command",
            _ => "file_path",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ToolKind::Read => "Read",
            ToolKind::Write => "Write",
            ToolKind::Edit => "Edit",
            ToolKind::Command => "Bash",
        }
    }
}

impl ToolFamily {
    /// Representative kind, used when only a checker family is known.
    pub fn default_kind(self) -> ToolKind {
        match self {
            ToolFamily::Read => ToolKind::Read,
            ToolFamily::Write => ToolKind::Write,
            ToolFamily::Command => ToolKind::Command,
        }
    }
}

/// Why an envelope could not be turned into a request.
///
/// Every variant is fail-open: the dispatcher answers Allow.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("malformed hook input: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("hook input is not a JSON object")]
    NotAnObject,
    #[error("hook input has no tool_input object")]
    MissingToolInput,
    #[error("no checkers registered for tool {0}")]
    UnsupportedTool(String),
    #[error("tool_input names neither a file_path nor a command")]
    MissingTarget,
}

#[derive(Deserialize)]
struct HookInput {
    tool_name: Option<String>,
    tool_input: Option<Value>,
}

/// A decoded tool invocation. Built once per dispatch, never mutated.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub tool_kind: ToolKind,
    pub arguments: Map<String, Value>,
}

impl InvocationRequest {
    /// A non-empty string argument.
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// The file path or command this invocation acts on, if present.
    pub fn target(&self) -> Option<&str> {
        self.str_arg(self.tool_kind.target_key())
    }
}

/// Decode a hook envelope.
///
/// The tool kind comes from `tool_name` when the host sends it, otherwise
/// from `hint` (CLI selection), otherwise from whichever target field is
/// present: `command` means a shell command, `file_path` a write.
pub fn parse_request(raw: &str, hint: Option<ToolKind>) -> Result<InvocationRequest, InputError> {
    let value: Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(InputError::NotAnObject);
    }
    let input: HookInput = serde_json::from_value(value)?;

    let Some(Value::Object(arguments)) = input.tool_input else {
        return Err(InputError::MissingToolInput);
    };

    let tool_kind = match input.tool_name.as_deref() {
        Some(name) => {
            ToolKind::from_tool_name(name).ok_or_else(|| InputError::UnsupportedTool(name.into()))?
        }
        None => hint
            .or_else(|| infer_kind(&arguments))
            .ok_or(InputError::MissingTarget)?,
    };

    Ok(InvocationRequest {
        tool_kind,
        arguments,
    })
}

fn infer_kind(arguments: &Map<String, Value>) -> Option<ToolKind> {
    if arguments.contains_key("command") {
        Some(ToolKind::Command)
    } else if arguments.contains_key("file_path") {
        Some(ToolKind::Write)
    } else {
        None
    }
}
