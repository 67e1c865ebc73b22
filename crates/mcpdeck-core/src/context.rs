//! Paths and shared services handed to every command.

use std::path::{Path, PathBuf};

use crate::client::ClientContext;
use crate::config::paths;
use crate::config::{DefinitionStore, SecretsStore};
use crate::env::Environment;
use crate::error::DeckError;

/// Paths and services shared by every command.
///
/// The CLI creates this once from defaults plus flag/env overrides; tests
/// build it from temp directories.
#[derive(Debug, Clone)]
pub struct AppContext {
    home_dir: PathBuf,
    project_root: PathBuf,
    state_dir: PathBuf,
    servers_path: PathBuf,
    groups_path: PathBuf,
    secrets_path: PathBuf,
}

impl AppContext {
    /// Create a context with every file under `config_dir`.
    pub fn new(
        home_dir: PathBuf,
        project_root: PathBuf,
        config_dir: PathBuf,
        state_dir: PathBuf,
    ) -> Self {
        Self {
            servers_path: paths::default_servers_path(&config_dir),
            groups_path: paths::default_groups_path(&config_dir),
            secrets_path: paths::default_secrets_path(&config_dir),
            home_dir,
            project_root,
            state_dir,
        }
    }

    /// Create a context from system directories.
    pub fn with_defaults() -> anyhow::Result<Self> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        let project_root = std::env::current_dir()?;
        let config_dir = dirs::config_dir()
            .map(|p| p.join("mcpdeck"))
            .unwrap_or_else(|| home_dir.join(".config").join("mcpdeck"));
        let state_dir = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .map(|p| p.join("mcpdeck"))
            .unwrap_or_else(|| home_dir.join(".local").join("state").join("mcpdeck"));

        Ok(Self::new(home_dir, project_root, config_dir, state_dir))
    }

    pub fn with_servers_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.servers_path = path;
        }
        self
    }

    pub fn with_groups_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.groups_path = path;
        }
        self
    }

    pub fn with_secrets_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.secrets_path = path;
        }
        self
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn servers_path(&self) -> &Path {
        &self.servers_path
    }

    pub fn groups_path(&self) -> &Path {
        &self.groups_path
    }

    pub fn secrets_path(&self) -> &Path {
        &self.secrets_path
    }

    pub fn log_dir(&self) -> PathBuf {
        paths::log_dir(&self.state_dir)
    }

    /// Get a ClientContext for target path resolution.
    pub fn client_context(&self) -> ClientContext {
        ClientContext::new(self.home_dir.clone(), self.project_root.clone())
    }

    pub fn load_store(&self) -> Result<DefinitionStore, DeckError> {
        DefinitionStore::load(&self.servers_path, Some(&self.groups_path))
    }

    pub fn secrets(&self) -> Result<SecretsStore, DeckError> {
        SecretsStore::load(&self.secrets_path)
    }

    /// Snapshot the process environment, filling gaps from the secrets file.
    pub fn environment(&self) -> Result<Environment, DeckError> {
        let mut environment = Environment::capture();
        let secrets = self.secrets()?.entries();
        environment.fill_missing(&secrets);
        tracing::debug!(
            vars = environment.len(),
            secrets = secrets.len(),
            "Captured environment"
        );
        Ok(environment)
    }
}
