pub mod context;
pub mod decision;

pub use context::{CheckContext, Target};
pub use decision::{Decision, Family, Outcome};

use crate::checks::{self, PolicyCheck};
use crate::config::Config;
use crate::logging;
use crate::parse::{self, InputError, InvocationRequest, ToolFamily, ToolKind, Workspace};

/// Where a dispatch currently is. Only used for tracing; every path is a
/// single pass that ends in [`Stage::Emitted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Parsing,
    Normalizing,
    Checking,
    Emitted,
}

fn enter(stage: Stage) {
    log::debug!("stage -> {stage:?}");
}

/// Checkers registered per tool family, in registration order.
pub struct Dispatcher {
    read: Vec<Box<dyn PolicyCheck>>,
    write: Vec<Box<dyn PolicyCheck>>,
    command: Vec<Box<dyn PolicyCheck>>,
}

impl Dispatcher {
    /// Build every checker named in `[dispatch]`.
    pub fn from_config(config: &Config) -> Self {
        let d = &config.dispatch;
        Self {
            read: Self::register(&d.read, ToolFamily::Read, config),
            write: Self::register(&d.write, ToolFamily::Write, config),
            command: Self::register(&d.command, ToolFamily::Command, config),
        }
    }

    /// A dispatcher running just one checker, regardless of `[dispatch]`.
    ///
    /// `None` when no checker has that name.
    pub fn single(name: &str, config: &Config) -> Option<Self> {
        let check = checks::build(name, config)?;
        let mut dispatcher = Self::empty();
        dispatcher.family_mut(check.family()).push(check);
        Some(dispatcher)
    }

    /// No checkers: every invocation is allowed.
    pub fn empty() -> Self {
        Self {
            read: Vec::new(),
            write: Vec::new(),
            command: Vec::new(),
        }
    }

    fn register(names: &[String], family: ToolFamily, config: &Config) -> Vec<Box<dyn PolicyCheck>> {
        let mut registered: Vec<Box<dyn PolicyCheck>> = Vec::new();
        for name in names {
            match checks::build(name, config) {
                Some(check) if check.family() == family => registered.push(check),
                Some(check) => log::warn!(
                    "checker {name} belongs to {:?}, not {family:?}; skipped",
                    check.family()
                ),
                None => log::warn!("unknown checker {name}; skipped"),
            }
        }
        registered
    }

    fn family_mut(&mut self, family: ToolFamily) -> &mut Vec<Box<dyn PolicyCheck>> {
        match family {
            ToolFamily::Read => &mut self.read,
            ToolFamily::Write => &mut self.write,
            ToolFamily::Command => &mut self.command,
        }
    }

    /// Checkers that apply to a family, in order.
    pub fn checks_for(&self, family: ToolFamily) -> &[Box<dyn PolicyCheck>] {
        match family {
            ToolFamily::Read => &self.read,
            ToolFamily::Write => &self.write,
            ToolFamily::Command => &self.command,
        }
    }

    /// Decode a raw hook envelope and evaluate it.
    ///
    /// Never fails: anything that cannot be decoded is allowed. Every
    /// returned decision has been logged exactly once.
    pub fn dispatch(&self, raw: &str, hint: Option<ToolKind>, workspace: &Workspace) -> Decision {
        enter(Stage::Idle);
        enter(Stage::Parsing);
        match parse::parse_request(raw, hint) {
            Ok(request) => self.evaluate(&request, workspace),
            Err(e) => {
                match &e {
                    InputError::Malformed(_) | InputError::NotAnObject | InputError::MissingToolInput => {
                        log::warn!("fail-open: {e}")
                    }
                    InputError::UnsupportedTool(_) | InputError::MissingTarget => {
                        log::debug!("allow: {e}")
                    }
                }
                let decision = Decision::allow();
                enter(Stage::Emitted);
                logging::log_decision(hint, None, &decision);
                decision
            }
        }
    }

    /// Evaluate an already-decoded request.
    ///
    /// Only the checkers of the request's own family run; the first block
    /// ends evaluation.
    pub fn evaluate(&self, request: &InvocationRequest, workspace: &Workspace) -> Decision {
        enter(Stage::Normalizing);
        let Some(ctx) = CheckContext::from_request(request, workspace) else {
            log::debug!(
                "allow: {} invocation without {}",
                request.tool_kind.as_str(),
                request.tool_kind.target_key()
            );
            let decision = Decision::allow();
            enter(Stage::Emitted);
            logging::log_decision(Some(request.tool_kind), None, &decision);
            return decision;
        };

        enter(Stage::Checking);
        let mut decision = Decision::allow();
        for check in self.checks_for(request.tool_kind.family()) {
            let result = check.evaluate(&ctx);
            log::debug!("{} -> {}", check.name(), result.outcome().as_str());
            if result.is_block() {
                decision = result;
                break;
            }
        }

        enter(Stage::Emitted);
        logging::log_decision(Some(ctx.kind), Some(ctx.raw()), &decision);
        decision
    }
}
