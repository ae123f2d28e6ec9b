//! Bus-side components.
//!
//! This module organizes everything between the core's memory pins and the memory image:
//! the core pin interface, the per-cycle bus adapter, and the memory with its latency model.

/// Per-cycle bus adapter servicing the core's memory requests.
pub mod interconnect;

/// Memory image and fixed-latency response pipeline.
pub mod memory;

/// Pin-level core model interface.
pub mod traits;

pub use interconnect::{BusAdapter, BusResponse, BusTransaction};
pub use memory::MemoryImage;
pub use traits::{CoreModel, PinSnapshot};
