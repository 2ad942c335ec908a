//! Core module containing fundamental types for procsig

pub mod types;

pub use types::{
    Address, MemoryRegion, ProcessId, Protection, ScanOutcome, SigError, SigResult, Signature,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
