pub mod error;
pub mod real_estate;
pub mod time_value;
pub mod types;

pub use error::ProFormaError;
pub use types::*;

/// Standard result type for all pro-forma operations
pub type ProFormaResult<T> = Result<T, ProFormaError>;
