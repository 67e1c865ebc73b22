//! `run`: resolve a server or group and launch it.

use std::time::Duration;

use crate::config::{DefinitionStore, Target};
use crate::context::AppContext;
use crate::env::Environment;
use crate::error::DeckError;
use crate::runtime::{LaunchMode, LaunchOutcome, RunnerSpec, launch};

use super::prepare::{EnvPrompter, prepare_server};

/// Pause between group members so a large group does not spawn everything at once.
pub const GROUP_LAUNCH_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub name: String,
    pub background: bool,
}

impl RunOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            background: false,
        }
    }

    pub fn with_background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }
}

#[derive(Debug)]
pub struct MemberRun {
    pub name: String,
    pub result: Result<LaunchOutcome, DeckError>,
}

#[derive(Debug)]
pub struct RunReport {
    pub name: String,
    pub is_group: bool,
    pub members: Vec<MemberRun>,
}

impl RunReport {
    /// Child exit code for a single foreground run; otherwise 0 only if every member started.
    pub fn exit_code(&self) -> i32 {
        if !self.is_group
            && let Some(MemberRun {
                result: Ok(LaunchOutcome::Exited { code }),
                ..
            }) = self.members.first()
        {
            return *code;
        }
        if self.members.iter().all(|m| m.result.is_ok()) {
            0
        } else {
            1
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &MemberRun> {
        self.members.iter().filter(|m| m.result.is_err())
    }
}

pub struct RunCommand<'a> {
    ctx: &'a AppContext,
    store: &'a DefinitionStore,
    launch_delay: Duration,
}

impl<'a> RunCommand<'a> {
    pub fn new(ctx: &'a AppContext, store: &'a DefinitionStore) -> Self {
        Self {
            ctx,
            store,
            launch_delay: GROUP_LAUNCH_DELAY,
        }
    }

    pub fn with_launch_delay(mut self, delay: Duration) -> Self {
        self.launch_delay = delay;
        self
    }

    /// Launch a server, or every member of a group.
    ///
    /// A single server's failure is returned as `Err`. Group members are
    /// launched detached, one after another, and each failure is recorded
    /// without stopping the rest.
    pub fn execute(
        &self,
        options: &RunOptions,
        environment: &mut Environment,
        prompter: &mut dyn EnvPrompter,
    ) -> Result<RunReport, DeckError> {
        let background = LaunchMode::Background {
            log_dir: self.ctx.log_dir(),
        };

        match self.store.lookup(&options.name)? {
            Target::Server(server) => {
                let mode = if options.background {
                    background
                } else {
                    LaunchMode::Foreground
                };
                let outcome = self.launch_one(&server.name, environment, prompter, &mode)?;
                Ok(RunReport {
                    name: options.name.clone(),
                    is_group: false,
                    members: vec![MemberRun {
                        name: server.name.clone(),
                        result: Ok(outcome),
                    }],
                })
            }
            Target::Group(group) => {
                if !options.background {
                    tracing::info!(
                        "Group '{}' members are launched in the background",
                        group.name
                    );
                }
                let mut members = Vec::with_capacity(group.members.len());
                for (idx, member) in group.members.iter().enumerate() {
                    if idx > 0 && !self.launch_delay.is_zero() {
                        std::thread::sleep(self.launch_delay);
                    }
                    let result = self.launch_one(member, environment, prompter, &background);
                    if let Err(err) = &result {
                        tracing::warn!("Failed to start '{}': {}", member, err);
                    }
                    members.push(MemberRun {
                        name: member.clone(),
                        result,
                    });
                }
                Ok(RunReport {
                    name: options.name.clone(),
                    is_group: true,
                    members,
                })
            }
        }
    }

    fn launch_one(
        &self,
        name: &str,
        environment: &mut Environment,
        prompter: &mut dyn EnvPrompter,
        mode: &LaunchMode,
    ) -> Result<LaunchOutcome, DeckError> {
        let prepared = prepare_server(self.store, name, environment, prompter)?;
        let spec = RunnerSpec::from_definition(&prepared.server, prepared.server.env.clone());
        launch(&spec, environment, mode)
    }
}
