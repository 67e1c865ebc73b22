//! `setup`: ask for missing variables once and keep them in the secrets file.

use crate::config::{DefinitionStore, Target};
use crate::context::AppContext;
use crate::env::{Environment, missing_inputs, resolve};
use crate::error::DeckError;

use super::prepare::EnvPrompter;

#[derive(Debug, Default)]
pub struct SetupReport {
    pub name: String,
    /// Variables written to the secrets file.
    pub saved: Vec<String>,
    /// Servers that still have unresolved variables, with those names.
    pub incomplete: Vec<(String, Vec<String>)>,
    /// Servers that could not be checked at all.
    pub failed: Vec<(String, DeckError)>,
}

impl SetupReport {
    pub fn is_complete(&self) -> bool {
        self.incomplete.is_empty() && self.failed.is_empty()
    }
}

pub struct SetupCommand<'a> {
    ctx: &'a AppContext,
    store: &'a DefinitionStore,
}

impl<'a> SetupCommand<'a> {
    pub fn new(ctx: &'a AppContext, store: &'a DefinitionStore) -> Self {
        Self { ctx, store }
    }

    pub fn execute(
        &self,
        name: &str,
        environment: &mut Environment,
        prompter: &mut dyn EnvPrompter,
    ) -> Result<SetupReport, DeckError> {
        let target = self.store.lookup(name)?;
        let is_group = matches!(target, Target::Group(_));
        let mut secrets = self.ctx.secrets()?;
        let mut report = SetupReport {
            name: name.to_string(),
            ..Default::default()
        };

        for member in self.store.expand(target) {
            let server = match self.store.validated_server(member) {
                Ok(server) => server,
                Err(err) if !is_group => return Err(err),
                Err(err) => {
                    tracing::warn!("Skipping '{}': {}", member, err);
                    report.failed.push((member.to_string(), err));
                    continue;
                }
            };

            let resolution = resolve(&server.env, &server.required_env, environment);
            if resolution.is_complete() {
                tracing::debug!("'{}' needs nothing", member);
                continue;
            }

            for variable in missing_inputs(&server.env, &resolution.unresolved, environment) {
                if let Some(value) = prompter.ask(member, &variable).filter(|v| !v.is_empty()) {
                    secrets.set(variable.clone(), value.clone());
                    environment.set(variable.clone(), value);
                    report.saved.push(variable);
                }
            }

            let resolution = resolve(&server.env, &server.required_env, environment);
            if !resolution.is_complete() {
                report
                    .incomplete
                    .push((member.to_string(), resolution.unresolved));
            }
        }

        if !report.saved.is_empty() {
            secrets.save()?;
        }
        Ok(report)
    }
}
