use std::fmt;

use serde::{Deserialize, Serialize};

/// What a reconciliation pass does with one plan item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Create,
    Update,
    Delete,
}

impl DiffKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            DiffKind::Create => "+",
            DiffKind::Update => "~",
            DiffKind::Delete => "-",
        }
    }
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            DiffKind::Create => "create",
            DiffKind::Update => "update",
            DiffKind::Delete => "delete",
        };
        f.write_str(verb)
    }
}
