//! Model-level error type.
//!
//! # Responsibility
//! - Report invalid constructor/rename input and filesystem failures raised
//!   while binding a `Photo` to its backing file.
//!
//! # Invariants
//! - Lookup misses and duplicate conflicts are never reported through this
//!   type; those surface as `Option`/`bool` results on the model APIs.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug)]
pub enum ModelError {
    /// A required string field was empty or whitespace-only.
    InvalidArgument { field: &'static str },
    /// The photo file is missing or its attributes cannot be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ModelError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument { field } => write!(f, "{field} must not be blank"),
            Self::Io { path, source } => {
                write!(f, "photo file `{}` is not accessible: {source}", path.display())
            }
        }
    }
}

impl Error for ModelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidArgument { .. } => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}
