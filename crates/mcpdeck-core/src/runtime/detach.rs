//! Log capture and session detachment for background launches.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::DeckError;

/// An opened, freshly created log file and the pid file path next to it.
#[derive(Debug)]
pub struct LogFiles {
    pub log_file: File,
    pub log_path: PathBuf,
    pub pid_path: PathBuf,
}

/// Create `<log_dir>/<name>-<YYYYMMDD-HHMMSS>-<millis>.log` exclusively.
///
/// A numeric suffix is appended when the name is already taken.
pub fn create_log_files(log_dir: &Path, name: &str) -> Result<LogFiles, DeckError> {
    std::fs::create_dir_all(log_dir).map_err(|e| DeckError::io(log_dir, e))?;

    let now = chrono::Local::now();
    let stem = format!(
        "{}-{}-{:03}",
        sanitize(name),
        now.format("%Y%m%d-%H%M%S"),
        now.timestamp_subsec_millis()
    );

    let mut attempt = 0u32;
    loop {
        let base = if attempt == 0 {
            stem.clone()
        } else {
            format!("{stem}-{attempt}")
        };
        let log_path = log_dir.join(format!("{base}.log"));
        match File::options().write(true).create_new(true).open(&log_path) {
            Ok(log_file) => {
                return Ok(LogFiles {
                    log_file,
                    pid_path: log_dir.join(format!("{base}.pid")),
                    log_path,
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && attempt < 100 => {
                attempt += 1;
            }
            Err(e) => return Err(DeckError::io(&log_path, e)),
        }
    }
}

/// Start the child in a new session so a terminal hangup does not reach it.
#[cfg(unix)]
pub(super) fn new_session(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;

    // SAFETY: setsid is async-signal-safe and touches no parent state.
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(not(unix))]
pub(super) fn new_session(_cmd: &mut Command) {}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
