//! mcpdeck Core Library
//!
//! Domain logic for reading server definitions, resolving their environment
//! templates, launching them, and merging them into client configuration files.

pub mod client;
pub mod commands;
pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod fs;
pub mod runtime;
pub mod types;

/// Types most callers need
pub mod prelude {
    // Definitions
    pub use crate::config::{DefinitionStore, GroupDefinition, ServerDefinition, Target};

    // Environment
    pub use crate::env::{Environment, Resolution, resolve};

    // Merging
    pub use crate::client::ClientTarget;
    pub use crate::config::managed_json::{MergeReport, Recovery, merge_server_entry};

    // Launching
    pub use crate::runtime::{LaunchMode, LaunchOutcome, RunnerSpec};

    // Errors and shared types
    pub use crate::context::AppContext;
    pub use crate::error::{DeckError, MergeError};
    pub use crate::types::TargetScope;
}
