//! Merge a server entry into a third-party JSON config file.
//!
//! The target file is classified before merging:
//!
//! | State                                   | Action                                         |
//! |-----------------------------------------|------------------------------------------------|
//! | absent or blank                         | start from `{ <container>: {} }`               |
//! | object with the container               | merge                                          |
//! | object with only the legacy container   | move legacy entries to the container, merge    |
//! | object whose container is not an object | back up, replace the container, merge          |
//! | anything else                           | back up, salvage the container or reset, merge |
//!
//! The result is written to a sibling temp file, parsed back, and renamed over
//! the target. The original is never modified in place. A symlinked target is
//! followed, so the file it points to is updated and the link survives.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::MergeError;
use crate::fs::write_atomic_checked;

/// Container key used by VS Code and plain JSON targets.
pub const SERVERS_KEY: &str = "servers";
/// Container key used by Claude Code and Cursor.
pub const MCP_SERVERS_KEY: &str = "mcpServers";

/// The other well-known container key, migrated from when the expected one is missing.
pub fn legacy_container_key(container_key: &str) -> Option<&'static str> {
    match container_key {
        SERVERS_KEY => Some(MCP_SERVERS_KEY),
        MCP_SERVERS_KEY => Some(SERVERS_KEY),
        _ => None,
    }
}

/// How a malformed target was recovered. Never an error on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// Unparsable; the container object was extracted from the backup text.
    Salvaged { backup: PathBuf },
    /// Unparsable; the document was reset to an empty container.
    Reset { backup: PathBuf },
    /// Parsed, but the container was not an object and was replaced.
    ContainerReplaced { backup: PathBuf },
}

impl Recovery {
    pub fn backup(&self) -> &Path {
        match self {
            Recovery::Salvaged { backup }
            | Recovery::Reset { backup }
            | Recovery::ContainerReplaced { backup } => backup,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MergeReport {
    pub path: PathBuf,
    /// The target was absent, blank, or deleted by `overwrite`.
    pub created: bool,
    /// A prior entry with the same server name was replaced.
    pub replaced_existing: bool,
    /// Legacy container key whose entries were moved.
    pub migrated_from: Option<String>,
    pub recovery: Option<Recovery>,
    /// The committed document.
    pub document: Map<String, Value>,
}

/// Insert `entry` as `document[container_key][server_name]` in the file at `path`.
///
/// With `overwrite`, an existing file is deleted first and all prior content
/// is discarded.
pub fn merge_server_entry(
    path: &Path,
    container_key: &str,
    server_name: &str,
    entry: Value,
    overwrite: bool,
) -> Result<MergeReport, MergeError> {
    let requested = path;
    let resolved = follow_symlink(path)?;
    let path = resolved.as_path();
    if path != requested {
        tracing::debug!("{} links to {}", requested.display(), path.display());
    }

    if overwrite && path.exists() {
        std::fs::remove_file(path).map_err(|source| MergeError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Removed {} before merge (overwrite)", path.display());
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|source| MergeError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let existing = read_existing(path)?;
    let created = existing
        .as_ref()
        .is_none_or(|bytes| bytes.iter().all(u8::is_ascii_whitespace));

    let mut recovery = None;
    let mut migrated_from = None;
    let mut root = match existing {
        None => Map::new(),
        Some(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Map::new(),
        Some(bytes) => match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                let backup = backup_target(path)?;
                let text = String::from_utf8_lossy(&bytes);
                match salvage_container(&text, container_key) {
                    Some((found_key, container)) => {
                        tracing::warn!(
                            "{} is not valid JSON; salvaged '{}' (backup: {})",
                            path.display(),
                            found_key,
                            backup.display()
                        );
                        if found_key != container_key {
                            migrated_from = Some(found_key);
                        }
                        recovery = Some(Recovery::Salvaged { backup });
                        let mut map = Map::new();
                        map.insert(container_key.to_string(), Value::Object(container));
                        map
                    }
                    None => {
                        tracing::warn!(
                            "{} is not valid JSON; reset to an empty '{}' (backup: {})",
                            path.display(),
                            container_key,
                            backup.display()
                        );
                        recovery = Some(Recovery::Reset { backup });
                        Map::new()
                    }
                }
            }
        },
    };

    match root.get(container_key).map(Value::is_object) {
        Some(true) => {}
        Some(false) => {
            let backup = backup_target(path)?;
            tracing::warn!(
                "'{}' in {} is not an object; replacing it (backup: {})",
                container_key,
                path.display(),
                backup.display()
            );
            recovery = Some(Recovery::ContainerReplaced { backup });
            root.insert(container_key.to_string(), Value::Object(Map::new()));
        }
        None => {
            let legacy = legacy_container_key(container_key)
                .filter(|legacy| matches!(root.get(*legacy), Some(Value::Object(_))));
            match legacy.and_then(|legacy| root.remove(legacy).map(|v| (legacy, v))) {
                Some((legacy, entries)) => {
                    tracing::info!(
                        "Migrating '{}' to '{}' in {}",
                        legacy,
                        container_key,
                        path.display()
                    );
                    migrated_from = Some(legacy.to_string());
                    root.insert(container_key.to_string(), entries);
                }
                None => {
                    root.insert(container_key.to_string(), Value::Object(Map::new()));
                }
            }
        }
    }

    let replaced_existing = match root.get_mut(container_key) {
        Some(Value::Object(container)) => container.insert(server_name.to_string(), entry).is_some(),
        // Guaranteed to be an object by the classification above.
        _ => false,
    };

    commit(path, &root)?;
    tracing::info!(
        "Wrote '{}' to {} under '{}'",
        server_name,
        path.display(),
        container_key
    );

    Ok(MergeReport {
        path: requested.to_path_buf(),
        created,
        replaced_existing,
        migrated_from,
        recovery,
        document: root,
    })
}

/// The file a symlink ultimately points to; any other path as given.
fn follow_symlink(path: &Path) -> Result<PathBuf, MergeError> {
    let is_link = std::fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false);
    if !is_link {
        return Ok(path.to_path_buf());
    }

    match std::fs::canonicalize(path) {
        Ok(target) => Ok(target),
        // Dangling link: write where it points.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let link = std::fs::read_link(path).map_err(|source| MergeError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(path.parent().map(|dir| dir.join(&link)).unwrap_or(link))
        }
        Err(source) => Err(MergeError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, MergeError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(MergeError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Copy the target to `<path>.bak.<YYYYMMDDHHMMSS>`.
fn backup_target(path: &Path) -> Result<PathBuf, MergeError> {
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "target".to_string());

    let mut backup = path.with_file_name(format!("{file_name}.bak.{stamp}"));
    let mut attempt = 1;
    while backup.exists() {
        backup = path.with_file_name(format!("{file_name}.bak.{stamp}-{attempt}"));
        attempt += 1;
    }

    std::fs::copy(path, &backup).map_err(|source| MergeError::Backup {
        path: path.to_path_buf(),
        backup: backup.clone(),
        source,
    })?;
    Ok(backup)
}

/// Find `"<key>": { ... }` in unparsable text and parse that object alone.
///
/// The expected key is tried first, then its legacy counterpart.
fn salvage_container(text: &str, container_key: &str) -> Option<(String, Map<String, Value>)> {
    let keys = std::iter::once(container_key).chain(legacy_container_key(container_key));
    for key in keys {
        let needle = format!("\"{key}\"");
        for (idx, _) in text.match_indices(&needle) {
            let rest = text[idx + needle.len()..].trim_start();
            let Some(rest) = rest.strip_prefix(':').map(str::trim_start) else {
                continue;
            };
            if !rest.starts_with('{') {
                continue;
            }
            if let Some(end) = balanced_object_end(rest)
                && let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&rest[..end])
            {
                return Some((key.to_string(), map));
            }
        }
    }
    None
}

/// Byte offset just past the `}` closing the object that `text` starts with.
fn balanced_object_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Serialize, write to a temp sibling, parse it back, rename over `path`.
fn commit(path: &Path, root: &Map<String, Value>) -> Result<(), MergeError> {
    let mut bytes = serde_json::to_vec_pretty(root)?;
    bytes.push(b'\n');

    write_atomic_checked(
        path,
        &bytes,
        |failed, source| MergeError::Write {
            path: failed.to_path_buf(),
            source,
        },
        |tmp_path| {
            let written = std::fs::read(tmp_path).map_err(|source| MergeError::Read {
                path: tmp_path.to_path_buf(),
                source,
            })?;
            serde_json::from_slice::<Value>(&written)
                .map(|_| ())
                .map_err(|e| MergeError::Verify {
                    path: tmp_path.to_path_buf(),
                    message: e.to_string(),
                })
        },
    )
}
