//! Signature scanning and raw memory access
//!
//! The last two stages of the pipeline: scan bytes for an AOB
//! signature (sequentially, lazily, or in parallel) and read or write
//! typed values at resolved addresses through explicit unsafe
//! capabilities.

pub mod accessor;
pub mod parallel;
pub mod scanner;

pub use accessor::{EntryPoint, FieldRef};
pub use parallel::ParallelScanner;
pub use scanner::{find, find_all, matches, Matches, Scanner};
