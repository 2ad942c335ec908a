//! Core type definitions for procsig
//!
//! Fundamental types used throughout the crate: address wrappers,
//! memory regions, byte signatures, scan outcomes and error types.

mod address;
mod error;
mod region;
mod scan;
mod signature;

pub use address::Address;
pub use error::{SigError, SigResult};
pub use region::{MemoryRegion, Protection};
pub use scan::ScanOutcome;
pub use signature::Signature;

// Common type aliases
pub type ProcessId = u32;
