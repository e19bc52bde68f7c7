//! Photo tag value type.
//!
//! # Invariants
//! - `name` and `value` are trimmed and non-blank.
//! - Equality and hashing ignore case on both fields.
//! - Tags are immutable after construction.

use super::error::ModelResult;
use super::{fold_case, require_name};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// A `(name, value)` label attached to a photo, e.g. `location=NYC`.
#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    name: String,
    value: String,
}

impl Tag {
    pub fn new(name: &str, value: &str) -> ModelResult<Self> {
        Ok(Self {
            name: require_name(name, "tag name")?,
            value: require_name(value, "tag value")?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        fold_case(&self.name) == fold_case(&other.name)
            && fold_case(&self.value) == fold_case(&other.value)
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        fold_case(&self.name).hash(state);
        fold_case(&self.value).hash(state);
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}
