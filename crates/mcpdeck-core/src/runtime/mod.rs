//! Launching resolved server definitions.
//!
//! A `RunnerSpec` holds what is actually executed: the command, its literal
//! argument vector and the resolved environment. It is launched either in the
//! foreground (blocking, exit code propagated) or detached into its own
//! session with output captured to a log file.
//!
//! There is no retry, health check or supervision after launch.

mod detach;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use crate::config::ServerDefinition;
use crate::env::Environment;
use crate::error::DeckError;

pub use detach::{LogFiles, create_log_files};

/// A fully resolved server, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerSpec {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl RunnerSpec {
    pub fn from_definition(server: &ServerDefinition, resolved: BTreeMap<String, String>) -> Self {
        Self {
            name: server.name.clone(),
            command: server.command.clone(),
            args: server.args.clone(),
            env: resolved,
        }
    }

    /// Shell-quoted command line for display only; never executed through a shell.
    pub fn command_line(&self) -> String {
        format_command_line(&self.command, &self.args)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchMode {
    /// Block until the process exits.
    Foreground,
    /// Detach and write `<name>-<timestamp>.log` / `.pid` into `log_dir`.
    Background { log_dir: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Exited {
        code: i32,
    },
    Detached {
        pid: u32,
        log_path: PathBuf,
        pid_path: PathBuf,
    },
}

/// Launch `spec` with `environment` as the base environment.
///
/// The child sees exactly the snapshot with the resolved variables layered
/// on top; the live process environment is not consulted.
pub fn launch(
    spec: &RunnerSpec,
    environment: &Environment,
    mode: &LaunchMode,
) -> Result<LaunchOutcome, DeckError> {
    let mut cmd = build_command(spec, environment);

    match mode {
        LaunchMode::Foreground => {
            tracing::info!("Running '{}': {}", spec.name, spec.command_line());
            let status = cmd.status().map_err(|e| spawn_error(spec, e))?;
            let code = exit_code(status);
            tracing::debug!("'{}' exited with {}", spec.name, code);
            Ok(LaunchOutcome::Exited { code })
        }
        LaunchMode::Background { log_dir } => {
            let logs = create_log_files(log_dir, &spec.name)?;
            let stdout = logs
                .log_file
                .try_clone()
                .map_err(|e| DeckError::io(&logs.log_path, e))?;
            cmd.stdin(std::process::Stdio::null())
                .stdout(stdout)
                .stderr(logs.log_file);
            detach::new_session(&mut cmd);

            let child = cmd.spawn().map_err(|e| spawn_error(spec, e))?;
            let pid = child.id();
            std::fs::write(&logs.pid_path, format!("{pid}\n"))
                .map_err(|e| DeckError::io(&logs.pid_path, e))?;

            tracing::info!(
                "Started '{}' in background (pid {}, log {})",
                spec.name,
                pid,
                logs.log_path.display()
            );
            Ok(LaunchOutcome::Detached {
                pid,
                log_path: logs.log_path,
                pid_path: logs.pid_path,
            })
        }
    }
}

fn build_command(spec: &RunnerSpec, environment: &Environment) -> Command {
    let mut cmd = Command::new(&spec.command);
    cmd.args(&spec.args);
    cmd.env_clear().envs(environment.vars()).envs(&spec.env);
    cmd
}

fn spawn_error(spec: &RunnerSpec, error: std::io::Error) -> DeckError {
    if error.kind() == std::io::ErrorKind::NotFound {
        DeckError::ExternalToolMissing {
            tool: spec.command.clone(),
        }
    } else {
        DeckError::io(&spec.command, error)
    }
}

/// Exit code, or 128 + signal number when killed by a signal.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Join a command and its arguments with POSIX-style quoting.
pub fn format_command_line(command: &str, args: &[String]) -> String {
    std::iter::once(command)
        .chain(args.iter().map(String::as_str))
        .map(shell_quote)
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=@%+,".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
