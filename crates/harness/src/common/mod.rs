//! Common utilities and types shared by the harness components.
//!
//! 1. **Addresses:** Wrapping and alignment rules for bus addresses.
//! 2. **Constants:** Default warmup window, file word size and field counts.
//! 3. **Errors:** The harness error enum and its exit-status mapping.

/// Bus address helpers.
pub mod addr;

/// Constants used throughout the harness.
pub mod constants;

/// Error types and exit statuses.
pub mod error;

pub use addr::BusAddr;
pub use error::{HarnessError, Result};
