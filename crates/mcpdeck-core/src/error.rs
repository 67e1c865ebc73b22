//! Error taxonomy for mcpdeck operations.
//!
//! `DeckError` is what commands return when a caller needs to react to the
//! kind of failure (exit status, retry prompt, diagnostic). Lower-level
//! plumbing uses `anyhow` and is wrapped at the command boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by mcpdeck commands.
#[derive(Error, Debug)]
pub enum DeckError {
    /// Unknown server or group name.
    #[error("No server or group named '{name}'")]
    NotFound { name: String },

    /// A definition is structurally unusable (e.g. missing command).
    #[error("Invalid definition '{name}': {message}")]
    Validation { name: String, message: String },

    /// Required variables are unset and were not supplied.
    #[error("Server '{server}' is missing required environment variables: {}", names.join(", "))]
    MissingEnvironment { server: String, names: Vec<String> },

    /// File could not be read, written, or created.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A definitions or groups file failed to parse.
    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// The config merger failed.
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// The executable named by a definition is not installed.
    #[error("Command '{tool}' was not found on PATH")]
    ExternalToolMissing { tool: String },
}

impl DeckError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DeckError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures of the config merger. Each is reported distinctly and never retried.
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Failed to read target {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write target {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to back up {} to {}: {source}", path.display(), backup.display())]
    Backup {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize merged document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Written document {} did not parse back as JSON: {message}", path.display())]
    Verify { path: PathBuf, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_environment_lists_all_names() {
        let err = DeckError::MissingEnvironment {
            server: "github".to_string(),
            names: vec!["TOKEN".to_string(), "ORG".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Server 'github' is missing required environment variables: TOKEN, ORG"
        );
    }

    #[test]
    fn merge_error_converts_into_deck_error() {
        let err: DeckError = MergeError::Verify {
            path: PathBuf::from("/tmp/x.json"),
            message: "eof".to_string(),
        }
        .into();
        assert!(matches!(err, DeckError::Merge(MergeError::Verify { .. })));
    }
}
