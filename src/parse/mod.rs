pub mod input;
pub mod path;
pub mod tokenize;

pub use input::{InputError, InvocationRequest, ToolFamily, ToolKind, parse_request};
pub use path::{NormalizedPath, Workspace};
pub use tokenize::{basename, flag_values, tokenize};
