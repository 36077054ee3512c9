//! Path normalization against the project root.
//!
//! Two views of every target path are produced: a physically resolved
//! absolute path (symlinks followed, `..` applied) for containment checks,
//! and a slash-separated root-relative form for prefix matching.

use std::path::{Component, Path, PathBuf};

/// The project a hook invocation runs in.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Absolute, lexically normalized root as configured.
    root: PathBuf,
    /// `root` with symlinks resolved.
    resolved_root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = normalize_lexical(&absolutize(&root.into()));
        let resolved_root = resolve_physical(&root);
        Self {
            root,
            resolved_root,
        }
    }

    /// Root from the named environment variable, falling back to the cwd.
    pub fn from_env(var: &str) -> Self {
        let from_var = if var.is_empty() {
            None
        } else {
            std::env::var_os(var).filter(|v| !v.is_empty())
        };
        let root = from_var
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolved_root(&self) -> &Path {
        &self.resolved_root
    }

    /// Whether a resolved path is the root itself or lies beneath it.
    pub fn contains(&self, resolved: &Path) -> bool {
        resolved.starts_with(&self.resolved_root)
    }
}

/// A target path in the forms the checkers need. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    /// Exactly as the agent sent it.
    pub raw: String,
    /// Absolute with symlinks and `..` resolved as far as the filesystem allows.
    pub absolute_resolved: PathBuf,
    /// Relative to the project root, `/`-separated.
    pub relative_to_root: String,
}

impl NormalizedPath {
    pub fn new(raw: &str, workspace: &Workspace) -> Self {
        let raw_path = Path::new(raw);
        let absolute = if raw_path.is_absolute() {
            raw_path.to_path_buf()
        } else {
            workspace.root().join(raw_path)
        };

        let absolute_resolved = resolve_physical(&absolute);

        let relative = if raw_path.is_absolute() {
            let lexical = relative_to(&normalize_lexical(raw_path), workspace.root());
            // A symlinked root: the canonical spelling of a file inside it
            // only lines up after both sides are resolved.
            let physical = || {
                relative_to(&absolute_resolved, workspace.resolved_root())
                    .filter(|rel| !escapes(rel))
            };
            match lexical {
                Some(rel) if !escapes(&rel) => rel.to_string_lossy().into_owned(),
                Some(rel) => physical().unwrap_or(rel).to_string_lossy().into_owned(),
                // Different filesystem roots: match on the raw path instead
                None => physical()
                    .map(|rel| rel.to_string_lossy().into_owned())
                    .unwrap_or_else(|| raw.to_string()),
            }
        } else {
            let normalized = normalize_lexical(raw_path);
            if normalized.as_os_str().is_empty() {
                ".".to_string()
            } else {
                normalized.to_string_lossy().into_owned()
            }
        };

        Self {
            raw: raw.to_string(),
            absolute_resolved,
            relative_to_root: relative.replace('\\', "/"),
        }
    }
}

fn escapes(rel: &Path) -> bool {
    matches!(rel.components().next(), Some(Component::ParentDir))
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Fold `.` and `..` without touching the filesystem.
///
/// Leading `..` on relative paths is kept; `..` at the root is dropped.
pub fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            _ => out.push(comp),
        }
    }
    out.iter().collect()
}

/// Resolve symlinks and `..` component by component.
///
/// Each existing prefix is canonicalized, so a symlink is followed before
/// any `..` that comes after it. Missing or broken components are appended
/// lexically instead of failing.
pub fn resolve_physical(path: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::Prefix(_) | Component::RootDir => resolved.push(comp.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                resolved.push(name);
                if let Ok(canonical) = std::fs::canonicalize(&resolved) {
                    resolved = canonical;
                }
            }
        }
    }
    resolved
}

/// Lexical relative path from `base` to `path`, both absolute and normalized.
///
/// `None` when the two share no root (e.g. different drive prefixes).
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    let path_comps: Vec<Component> = path.components().collect();
    let base_comps: Vec<Component> = base.components().collect();

    let rooted = |c: &Component| matches!(c, Component::Prefix(_) | Component::RootDir);
    let path_root: Vec<&Component> = path_comps.iter().take_while(|c| rooted(c)).collect();
    let base_root: Vec<&Component> = base_comps.iter().take_while(|c| rooted(c)).collect();
    if path_root != base_root {
        return None;
    }

    let common = path_comps
        .iter()
        .zip(base_comps.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base_comps.len() {
        rel.push("..");
    }
    for comp in &path_comps[common..] {
        rel.push(comp.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    Some(rel)
}
