pub mod error;
pub mod likelihood;
pub mod parameter_net;

pub use error::{Result, UsplitError};

pub use candle_core;
pub use candle_nn;
