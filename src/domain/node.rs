//! Named entries of the decision tree: the `Node` capability and terminal `Leaf`s

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum number of description characters shown next to a name.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 100;

/// Anything shown to the operator by name and optional description.
pub trait Node {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// `name`, or `name (description)` with the description cut to
    /// [`DESCRIPTION_PREVIEW_CHARS`] characters.
    fn label(&self) -> String {
        let description = self.description();
        if description.is_empty() {
            return self.name().to_string();
        }
        let preview: String = description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
        format!("{} ({})", self.name(), preview)
    }
}

/// A terminal choice. Leaves are never descended into and carry no weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Leaf {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

impl Node for Leaf {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
