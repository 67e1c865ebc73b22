//! Default locations for definition, group and secrets files.

use std::path::{Path, PathBuf};

const DEFINITION_EXTENSIONS: [&str; 4] = ["json", "yaml", "yml", "toml"];

/// Locate `<stem>.<ext>` in `config_dir`, trying each supported extension.
///
/// Falls back to `<stem>.json` when none exists so error messages name a
/// concrete file.
pub fn find_definition_file(config_dir: &Path, stem: &str) -> PathBuf {
    DEFINITION_EXTENSIONS
        .iter()
        .map(|ext| config_dir.join(format!("{stem}.{ext}")))
        .find(|path| path.is_file())
        .unwrap_or_else(|| config_dir.join(format!("{stem}.json")))
}

pub fn default_servers_path(config_dir: &Path) -> PathBuf {
    find_definition_file(config_dir, "servers")
}

pub fn default_groups_path(config_dir: &Path) -> PathBuf {
    find_definition_file(config_dir, "groups")
}

pub fn default_secrets_path(config_dir: &Path) -> PathBuf {
    config_dir.join("secrets.env")
}

/// Directory for background launch logs and pid files.
pub fn log_dir(state_dir: &Path) -> PathBuf {
    state_dir.join("logs")
}
