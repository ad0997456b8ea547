use thiserror::Error;

/// Contract violations. Valid play never produces these; an `Err` means the
/// caller broke a documented precondition.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("coordinates out of range")]
    OutOfRange,
    #[error("invalid field configuration")]
    InvalidConfig,
}

pub type Result<T> = core::result::Result<T, GameError>;
