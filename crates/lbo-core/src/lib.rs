pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "lbo")]
pub mod lbo;

pub use error::LboError;
pub use types::*;

/// Standard result type for all LBO operations
pub type LboResult<T> = Result<T, LboError>;
