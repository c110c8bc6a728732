use thiserror::Error;

/// Configuration and data-selection failures.
///
/// Tensor arithmetic itself reports through [`candle_core::Error`]; this
/// type wraps it so that callers mixing both only handle one error.
#[derive(Error, Debug)]
pub enum UsplitError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid channels {channels:?}: data has {available} channel(s)")]
    InvalidChannelSelection {
        channels: [usize; 3],
        available: usize,
    },

    #[error("invalid datasplit: {0}")]
    InvalidSplitKind(String),

    #[error(transparent)]
    Candle(#[from] candle_core::Error),
}

pub type Result<T> = std::result::Result<T, UsplitError>;
