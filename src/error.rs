use thiserror::Error;

pub type Result<T, E = DiceError> = std::result::Result<T, E>;

/// The broad category of a [`DiceError`], for callers that want to branch on
/// the kind of failure rather than its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidState,
    Configuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    /// Bad die type, roll mode, capacity, count, modifier or record.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The operation is not possible in the current state, e.g. no active key.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Test conditions that can never be satisfied consistently.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl DiceError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DiceError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            DiceError::InvalidState(_) => ErrorKind::InvalidState,
            DiceError::Configuration(_) => ErrorKind::Configuration,
        }
    }
}
