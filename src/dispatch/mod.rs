pub mod command;
pub mod error;
pub mod runner;

pub use command::{DispatchCommand, QueueSpec};
pub use error::DispatchError;
pub use runner::{CommandRunner, DispatchStatus, DryRunner, ShellRunner};

#[cfg(test)]
pub use runner::RecordingRunner;
