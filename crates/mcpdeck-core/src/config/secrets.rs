//! Local `KEY=value` store for previously entered environment values.
//!
//! The file is consulted to fill gaps in the process environment but is never
//! required to exist. Comments and unrelated lines survive a save.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::DeckError;
use crate::fs::write_atomic;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry { key: String, value: String },
    Other(String),
}

#[derive(Debug, Clone)]
pub struct SecretsStore {
    path: PathBuf,
    lines: Vec<Line>,
}

impl SecretsStore {
    /// Load the store; a missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, DeckError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(DeckError::io(path, e)),
        };
        Ok(Self {
            path: path.to_path_buf(),
            lines: content.lines().map(parse_line).collect(),
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        // Later assignments win, matching shell `source` semantics.
        self.lines.iter().rev().find_map(|line| match line {
            Line::Entry { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let mut replaced = false;
        for line in self.lines.iter_mut().rev() {
            if let Line::Entry { key: k, value: v } = line
                && *k == key
            {
                *v = value.clone();
                replaced = true;
                break;
            }
        }
        if !replaced {
            self.lines.push(Line::Entry { key, value });
        }
    }

    /// All entries; later duplicates override earlier ones.
    pub fn entries(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for line in &self.lines {
            if let Line::Entry { key, value } = line {
                map.insert(key.clone(), value.clone());
            }
        }
        map
    }

    /// Persist atomically with owner-only permissions.
    pub fn save(&self) -> Result<(), DeckError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| DeckError::io(parent, e))?;
        }

        let mut content = String::new();
        for line in &self.lines {
            match line {
                Line::Entry { key, value } => {
                    content.push_str(key);
                    content.push('=');
                    content.push_str(&quote_value(value));
                }
                Line::Other(raw) => content.push_str(raw),
            }
            content.push('\n');
        }

        write_atomic(&self.path, content.as_bytes()).map_err(|e| DeckError::io(&self.path, e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(
                &self.path,
                std::fs::Permissions::from_mode(crate::fs::atomic::PRIVATE_MODE),
            )
            .map_err(|e| DeckError::io(&self.path, e))?;
        }
        tracing::info!("Saved secrets to {}", self.path.display());
        Ok(())
    }
}

fn parse_line(raw: &str) -> Line {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Line::Other(raw.to_string());
    }
    let body = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let Some((key, value)) = body.split_once('=') else {
        return Line::Other(raw.to_string());
    };
    let key = key.trim();
    if !is_identifier(key) {
        tracing::warn!("Ignoring malformed secrets line for key '{}'", key);
        return Line::Other(raw.to_string());
    }
    Line::Entry {
        key: key.to_string(),
        value: unquote(value.trim()).to_string(),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2
            && let Some(inner) = value
                .strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

fn quote_value(value: &str) -> String {
    let needs_quotes = value.trim() != value
        || value.contains('#')
        || value.starts_with('"')
        || value.starts_with('\'');
    if needs_quotes {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}
