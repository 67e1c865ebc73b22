//! Shared core types used across client targets and commands.

use serde::{Deserialize, Serialize};

/// Which copy of a client's configuration a server is added to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetScope {
    /// The user's personal configuration (e.g. `~/.claude.json`).
    User,
    /// The current project's configuration (e.g. `./.mcp.json`).
    Project,
}

impl TargetScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetScope::User => "user",
            TargetScope::Project => "project",
        }
    }
}
