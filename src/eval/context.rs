use crate::parse::{InvocationRequest, NormalizedPath, ToolKind, Workspace};

/// What a checker inspects: a normalized path or a raw command string.
#[derive(Debug, Clone)]
pub enum Target<'a> {
    Path(NormalizedPath),
    Command(&'a str),
}

/// Context for evaluating a single invocation.
#[derive(Debug)]
pub struct CheckContext<'a> {
    pub kind: ToolKind,
    pub workspace: &'a Workspace,
    pub target: Target<'a>,
}

impl<'a> CheckContext<'a> {
    /// Normalize a request's target. `None` when there is nothing to evaluate.
    pub fn from_request(request: &'a InvocationRequest, workspace: &'a Workspace) -> Option<Self> {
        let raw = request.target()?;
        let target = match request.tool_kind {
            ToolKind::Command => Target::Command(raw),
            ToolKind::Read | ToolKind::Write | ToolKind::Edit => {
                Target::Path(NormalizedPath::new(raw, workspace))
            }
        };
        Some(Self {
            kind: request.tool_kind,
            workspace,
            target,
        })
    }

    pub fn path(&self) -> Option<&NormalizedPath> {
        match &self.target {
            Target::Path(p) => Some(p),
            Target::Command(_) => None,
        }
    }

    pub fn command(&self) -> Option<&str> {
        match self.target {
            Target::Command(c) => Some(c),
            Target::Path(_) => None,
        }
    }

    /// The raw target text, for logging.
    pub fn raw(&self) -> &str {
        match &self.target {
            Target::Path(p) => &p.raw,
            Target::Command(c) => c,
        }
    }
}
