//! Definition schema for servers.json / groups.json
//!
//! The definitions file maps server name to definition:
//!
//! ```json
//! {
//!   "github": {
//!     "command": "npx",
//!     "args": ["-y", "@modelcontextprotocol/server-github"],
//!     "env": { "GITHUB_TOKEN": "${GITHUB_TOKEN}" },
//!     "required_env": ["GITHUB_TOKEN"],
//!     "description": "GitHub API access"
//!   }
//! }
//! ```
//!
//! The groups file maps group name to an ordered list of server names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How to launch one external server process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDefinition {
    /// Map key in the definitions file; not serialized inside the entry.
    #[serde(skip)]
    pub name: String,

    /// Executable name or path
    #[serde(default)]
    pub command: String,

    /// Literal argument vector
    #[serde(default)]
    pub args: Vec<String>,

    /// Variable name -> template (`${NAME}` references or literal text)
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Variables that must be non-empty before the server can be used
    #[serde(default, alias = "requiredEnv")]
    pub required_env: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServerDefinition {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.env.insert(key.into(), template.into());
        self
    }

    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required_env.push(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Structural check run before a definition is used.
    pub fn validate(&self) -> Result<(), String> {
        if self.command.trim().is_empty() {
            return Err("missing 'command'".to_string());
        }
        if self.required_env.iter().any(|n| n.trim().is_empty()) {
            return Err("'required_env' contains an empty name".to_string());
        }
        Ok(())
    }

    /// Required names that have no template in `env`.
    pub fn required_without_template(&self) -> Vec<&str> {
        self.required_env
            .iter()
            .filter(|name| !self.env.contains_key(name.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// The same definition with `env` replaced by resolved values.
    pub fn with_resolved_env(&self, resolved: BTreeMap<String, String>) -> Self {
        Self {
            env: resolved,
            ..self.clone()
        }
    }
}

/// A named, ordered list of server names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupDefinition {
    pub name: String,
    pub members: Vec<String>,
}

/// Raw shape of the definitions file.
pub type DefinitionsFile = BTreeMap<String, ServerDefinition>;

/// Raw shape of the groups file.
pub type GroupsFile = BTreeMap<String, Vec<String>>;
