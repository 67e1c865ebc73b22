//! Turn a stored definition into a resolved one, asking for gaps if allowed.

use crate::config::{DefinitionStore, ServerDefinition};
use crate::env::{Environment, missing_inputs, resolve};
use crate::error::DeckError;

/// Source of values for variables that are still missing after resolution.
///
/// Returning `None` means the user declined or no value could be read.
pub trait EnvPrompter {
    fn ask(&mut self, server: &str, variable: &str) -> Option<String>;
}

/// Never supplies a value; used for non-interactive runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl EnvPrompter for NoPrompt {
    fn ask(&mut self, _server: &str, _variable: &str) -> Option<String> {
        None
    }
}

/// A definition whose `env` holds final values.
#[derive(Debug, Clone)]
pub struct PreparedServer {
    pub server: ServerDefinition,
}

/// Validate, resolve and, if needed, prompt for one server.
///
/// Supplied values are written into `environment` so later servers in the
/// same invocation reuse them.
pub fn prepare_server(
    store: &DefinitionStore,
    name: &str,
    environment: &mut Environment,
    prompter: &mut dyn EnvPrompter,
) -> Result<PreparedServer, DeckError> {
    let server = store.validated_server(name)?;

    let mut resolution = resolve(&server.env, &server.required_env, environment);
    let mut supplied = 0usize;

    if !resolution.is_complete() {
        tracing::debug!(
            "'{}' has unresolved variables: {}",
            name,
            resolution.unresolved.join(", ")
        );
        for variable in missing_inputs(&server.env, &resolution.unresolved, environment) {
            if let Some(value) = prompter.ask(name, &variable).filter(|v| !v.is_empty()) {
                tracing::debug!("'{}' received a value for {}", name, variable);
                environment.set(variable, value);
                supplied += 1;
            }
        }
        if supplied > 0 {
            resolution = resolve(&server.env, &server.required_env, environment);
        }
    }

    if !resolution.is_complete() {
        return Err(DeckError::MissingEnvironment {
            server: name.to_string(),
            names: resolution.unresolved,
        });
    }

    Ok(PreparedServer {
        server: server.with_resolved_env(resolution.resolved),
    })
}
