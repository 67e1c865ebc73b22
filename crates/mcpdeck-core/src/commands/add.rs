//! `add`: merge resolved definitions into a client config file.

use std::path::PathBuf;

use crate::client::ClientTarget;
use crate::config::{DefinitionStore, MergeReport, Target};
use crate::context::AppContext;
use crate::env::Environment;
use crate::error::DeckError;
use crate::types::TargetScope;

use super::prepare::{EnvPrompter, prepare_server};

#[derive(Debug, Clone)]
pub struct AddOptions {
    pub name: String,
    pub target: ClientTarget,
    pub scope: Option<TargetScope>,
    pub overwrite: bool,
}

impl AddOptions {
    pub fn new(name: impl Into<String>, target: ClientTarget) -> Self {
        Self {
            name: name.into(),
            target,
            scope: None,
            overwrite: false,
        }
    }

    pub fn with_scope(mut self, scope: TargetScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

#[derive(Debug)]
pub struct MemberAdd {
    pub name: String,
    pub result: Result<MergeReport, DeckError>,
}

#[derive(Debug)]
pub struct AddReport {
    pub name: String,
    pub target: ClientTarget,
    pub path: PathBuf,
    pub is_group: bool,
    pub members: Vec<MemberAdd>,
}

impl AddReport {
    pub fn succeeded(&self) -> bool {
        self.members.iter().all(|m| m.result.is_ok())
    }
}

pub struct AddCommand<'a> {
    ctx: &'a AppContext,
    store: &'a DefinitionStore,
}

impl<'a> AddCommand<'a> {
    pub fn new(ctx: &'a AppContext, store: &'a DefinitionStore) -> Self {
        Self { ctx, store }
    }

    /// Add a server, or each member of a group, to the target.
    ///
    /// `overwrite` clears the target only before the first member so a group
    /// ends up with all of its members. A single server's failure is returned
    /// as `Err`; group members fail independently.
    pub fn execute(
        &self,
        options: &AddOptions,
        environment: &mut Environment,
        prompter: &mut dyn EnvPrompter,
    ) -> Result<AddReport, DeckError> {
        let client_ctx = self.ctx.client_context();
        let path = options.target.config_path(&client_ctx, options.scope)?;
        let target = self.store.lookup(&options.name)?;
        let names = self.store.expand(target);
        let is_group = matches!(target, Target::Group(_));
        tracing::debug!(
            "Adding '{}' to {} ({} scope) at {}",
            target.name(),
            options.target,
            options.scope.unwrap_or_else(|| options.target.default_scope()).as_str(),
            path.display()
        );

        let mut members = Vec::with_capacity(names.len());
        let mut overwrite = options.overwrite;
        for name in names {
            let result = prepare_server(self.store, name, environment, prompter).and_then(
                |prepared| {
                    options
                        .target
                        .merge(&client_ctx, options.scope, &prepared.server, overwrite)
                },
            );
            let result = match result {
                Err(err) if !is_group => return Err(err),
                other => other,
            };

            match &result {
                Ok(report) => {
                    overwrite = false;
                    if let Some(recovery) = &report.recovery {
                        tracing::warn!(
                            "Recovered malformed {} (backup at {})",
                            report.path.display(),
                            recovery.backup().display()
                        );
                    }
                }
                Err(err) => tracing::warn!("Failed to add '{}': {}", name, err),
            }

            members.push(MemberAdd {
                name: name.to_string(),
                result,
            });
        }

        Ok(AddReport {
            name: options.name.clone(),
            target: options.target.clone(),
            path,
            is_group,
            members,
        })
    }
}
