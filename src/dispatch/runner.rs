use std::process::Command;

use super::command::DispatchCommand;
use super::error::DispatchError;

/// Outcome of one dispatched subprocess
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    Success,
    Failed(i32),
    Signaled(i32),
}

impl DispatchStatus {
    pub fn success(&self) -> bool {
        matches!(self, DispatchStatus::Success)
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            DispatchStatus::Success => Some(0),
            DispatchStatus::Failed(code) => Some(*code),
            DispatchStatus::Signaled(_) => None,
        }
    }
}

/// Seam between the campaign loop and the operating system. The driver
/// blocks on each call before moving to the next day.
pub trait CommandRunner {
    fn run(&self, command: &DispatchCommand) -> Result<DispatchStatus, DispatchError>;
}

/// Spawns the command and waits for it to finish, with stdout and
/// stderr inherited from the driver.
pub struct ShellRunner;

impl ShellRunner {
    fn convert_exit_status(status: std::process::ExitStatus) -> DispatchStatus {
        if status.success() {
            DispatchStatus::Success
        } else if let Some(code) = status.code() {
            DispatchStatus::Failed(code)
        } else {
            Self::parse_signal_status(status)
        }
    }

    #[cfg(unix)]
    fn parse_signal_status(status: std::process::ExitStatus) -> DispatchStatus {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            DispatchStatus::Signaled(signal)
        } else {
            DispatchStatus::Failed(1)
        }
    }

    #[cfg(not(unix))]
    fn parse_signal_status(_status: std::process::ExitStatus) -> DispatchStatus {
        DispatchStatus::Failed(1)
    }

    fn map_spawn_error(error: std::io::Error, program: &str) -> DispatchError {
        if error.kind() == std::io::ErrorKind::NotFound {
            DispatchError::CommandNotFound(program.to_string())
        } else {
            DispatchError::Io(error)
        }
    }

    fn log_result(status: &DispatchStatus, command: &DispatchCommand) {
        match status {
            DispatchStatus::Success => {
                tracing::debug!("Subprocess completed: {}", command.command_line());
            }
            DispatchStatus::Failed(code) => {
                tracing::warn!(
                    "Subprocess exited with code {}: {}",
                    code,
                    command.command_line()
                );
            }
            DispatchStatus::Signaled(signal) => {
                tracing::warn!(
                    "Subprocess terminated by signal {}: {}",
                    signal,
                    command.command_line()
                );
            }
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &DispatchCommand) -> Result<DispatchStatus, DispatchError> {
        tracing::debug!("Dispatching subprocess: {}", command.command_line());

        let status = Command::new(command.program())
            .args(command.args())
            .status()
            .map_err(|e| Self::map_spawn_error(e, command.program()))?;

        let status = Self::convert_exit_status(status);
        Self::log_result(&status, command);

        Ok(status)
    }
}

/// Prints each command line instead of spawning it
pub struct DryRunner;

impl CommandRunner for DryRunner {
    fn run(&self, command: &DispatchCommand) -> Result<DispatchStatus, DispatchError> {
        println!("[dry-run] {}", command.command_line());
        Ok(DispatchStatus::Success)
    }
}

/// Test double that records every dispatched command and replays a
/// scripted sequence of statuses, defaulting to success.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingRunner {
    calls: std::sync::Mutex<Vec<DispatchCommand>>,
    statuses: std::sync::Mutex<std::collections::VecDeque<DispatchStatus>>,
}

#[cfg(test)]
impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = DispatchStatus>,
    {
        let runner = Self::new();
        runner.statuses.lock().unwrap().extend(statuses);
        runner
    }

    pub fn calls(&self) -> Vec<DispatchCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[cfg(test)]
impl CommandRunner for RecordingRunner {
    fn run(&self, command: &DispatchCommand) -> Result<DispatchStatus, DispatchError> {
        self.calls.lock().unwrap().push(command.clone());
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(DispatchStatus::Success);
        Ok(status)
    }
}
