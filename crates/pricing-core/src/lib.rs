pub mod error;
pub mod types;

#[cfg(feature = "pricing")]
pub mod pricing;

#[cfg(feature = "catalog")]
pub mod catalog;

#[cfg(feature = "market")]
pub mod market;

#[cfg(feature = "sales_extract")]
pub mod sales_extract;

pub use error::PricingError;
pub use types::*;

/// Standard result type for all pricing operations
pub type PricingResult<T> = Result<T, PricingError>;
