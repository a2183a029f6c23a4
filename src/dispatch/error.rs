#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
