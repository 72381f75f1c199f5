//! Category definitions as loaded from the registry.

use serde::{Deserialize, Serialize};

/// A configured subject area.
///
/// Identity is `id`; the registry guarantees uniqueness within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub query: String,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            query: query.into(),
        }
    }
}
