//! Client targets that server definitions can be merged into.
//!
//! Each target knows where its config file lives for a scope, which container
//! key it stores servers under, and how an entry is shaped:
//!
//! | Target  | Container    | User scope           | Project scope        |
//! |---------|--------------|----------------------|----------------------|
//! | claude  | `mcpServers` | `~/.claude.json`     | `.mcp.json`          |
//! | cursor  | `mcpServers` | `~/.cursor/mcp.json` | `.cursor/mcp.json`   |
//! | vscode  | `servers`    | (unsupported)        | `.vscode/mcp.json`   |
//! | *.json  | `servers`    | the given path       | the given path       |

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};

use crate::config::ServerDefinition;
use crate::config::managed_json::{MCP_SERVERS_KEY, MergeReport, SERVERS_KEY, merge_server_entry};
use crate::error::{DeckError, MergeError};
use crate::types::TargetScope;

/// Directories a target path is resolved against.
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub home_dir: PathBuf,
    pub project_root: PathBuf,
}

impl ClientContext {
    pub fn new(home_dir: PathBuf, project_root: PathBuf) -> Self {
        Self {
            home_dir,
            project_root,
        }
    }
}

/// A destination for `add`, selected once from the CLI argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientTarget {
    ClaudeCode,
    Cursor,
    VsCode,
    /// Any `*.json` file; receives the full definition under `servers`.
    JsonFile(PathBuf),
}

impl ClientTarget {
    /// Keywords accepted in place of a path.
    pub const KEYWORDS: [&'static str; 3] = ["claude", "cursor", "vscode"];

    pub fn parse(input: &str) -> Result<Self, DeckError> {
        match input.to_ascii_lowercase().as_str() {
            "claude" | "claude-code" => Ok(ClientTarget::ClaudeCode),
            "cursor" => Ok(ClientTarget::Cursor),
            "vscode" | "code" => Ok(ClientTarget::VsCode),
            lower if lower.ends_with(".json") => Ok(ClientTarget::JsonFile(PathBuf::from(input))),
            _ => Err(DeckError::Validation {
                name: input.to_string(),
                message: format!(
                    "unknown target; expected one of {} or a path ending in .json",
                    Self::KEYWORDS.join(", ")
                ),
            }),
        }
    }

    pub fn container_key(&self) -> &'static str {
        match self {
            ClientTarget::ClaudeCode | ClientTarget::Cursor => MCP_SERVERS_KEY,
            ClientTarget::VsCode | ClientTarget::JsonFile(_) => SERVERS_KEY,
        }
    }

    /// Scope used when neither `--user` nor `--project` is given.
    pub fn default_scope(&self) -> TargetScope {
        match self {
            ClientTarget::ClaudeCode | ClientTarget::Cursor => TargetScope::User,
            ClientTarget::VsCode | ClientTarget::JsonFile(_) => TargetScope::Project,
        }
    }

    /// Config file for this target at `scope` (or the default scope).
    pub fn config_path(
        &self,
        ctx: &ClientContext,
        scope: Option<TargetScope>,
    ) -> Result<PathBuf, DeckError> {
        let scope = scope.unwrap_or_else(|| self.default_scope());
        let path = match (self, scope) {
            (ClientTarget::ClaudeCode, TargetScope::User) => ctx.home_dir.join(".claude.json"),
            (ClientTarget::ClaudeCode, TargetScope::Project) => ctx.project_root.join(".mcp.json"),
            (ClientTarget::Cursor, TargetScope::User) => ctx.home_dir.join(".cursor/mcp.json"),
            (ClientTarget::Cursor, TargetScope::Project) => {
                ctx.project_root.join(".cursor/mcp.json")
            }
            (ClientTarget::VsCode, TargetScope::User) => {
                return Err(DeckError::Validation {
                    name: self.to_string(),
                    message: "user-level MCP configuration is managed through VS Code profile settings; use --project".to_string(),
                });
            }
            (ClientTarget::VsCode, TargetScope::Project) => {
                ctx.project_root.join(".vscode/mcp.json")
            }
            (ClientTarget::JsonFile(path), _) => absolutize(&ctx.project_root, path),
        };
        Ok(path)
    }

    /// Shape a resolved definition the way this target's file expects it.
    pub fn render_entry(&self, server: &ServerDefinition) -> Result<Value, MergeError> {
        match self {
            ClientTarget::ClaudeCode | ClientTarget::Cursor => Ok(json!({
                "command": server.command,
                "args": server.args,
                "env": server.env,
            })),
            // VS Code format: { "type": "stdio", "command": "...", "args": [...], "env": {...} }
            ClientTarget::VsCode => {
                let mut obj = Map::new();
                obj.insert("type".to_string(), json!("stdio"));
                obj.insert("command".to_string(), json!(server.command));
                if !server.args.is_empty() {
                    obj.insert("args".to_string(), json!(server.args));
                }
                if !server.env.is_empty() {
                    obj.insert("env".to_string(), json!(server.env));
                }
                Ok(Value::Object(obj))
            }
            ClientTarget::JsonFile(_) => Ok(serde_json::to_value(server)?),
        }
    }

    /// Merge a resolved server into this target's config file.
    pub fn merge(
        &self,
        ctx: &ClientContext,
        scope: Option<TargetScope>,
        server: &ServerDefinition,
        overwrite: bool,
    ) -> Result<MergeReport, DeckError> {
        let path = self.config_path(ctx, scope)?;
        let entry = self.render_entry(server)?;
        let report =
            merge_server_entry(&path, self.container_key(), &server.name, entry, overwrite)?;
        Ok(report)
    }
}

impl fmt::Display for ClientTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientTarget::ClaudeCode => write!(f, "claude"),
            ClientTarget::Cursor => write!(f, "cursor"),
            ClientTarget::VsCode => write!(f, "vscode"),
            ClientTarget::JsonFile(path) => write!(f, "{}", path.display()),
        }
    }
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
