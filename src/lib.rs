//! procsig: process introspection and byte-signature scanning
//!
//! A strict pipeline over a running process: locate it by name,
//! resolve a mapped module to its memory region, scan the region for
//! an AOB signature, then read or write typed values at resolved
//! addresses.
//!
//! ```no_run
//! use procsig::platform;
//! use procsig::process::{ModuleResolver, ProcessLocator};
//! use procsig::memory::Scanner;
//! use procsig::Signature;
//!
//! # fn main() -> procsig::SigResult<()> {
//! let source = platform::native();
//! let pid = ProcessLocator::new(&source).find_by_name("python3")?;
//! let region = ModuleResolver::new(&source).resolve(pid, Some("libc"))?;
//! let sig: Signature = "48 8B ?? ?? 89".parse()?;
//! let outcome = Scanner::new(&source).scan_region(pid, &region, &sig)?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! Platform specifics are confined to [`platform`]; everything above
//! it works against the [`platform::ProcessSource`] trait.

pub mod config;
pub mod core;
pub mod memory;
pub mod platform;
pub mod process;
pub mod timing;

// Re-export main types from the core module
pub use core::types::{
    Address, MemoryRegion, ProcessId, Protection, ScanOutcome, SigError, SigResult, Signature,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_module_accessible() {
        assert_eq!(core::VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_address_reexport() {
        let addr = Address::new(0x1000);
        assert_eq!(addr.as_usize(), 0x1000);
        assert!(Address::null().is_null());
    }

    #[test]
    fn test_signature_reexport() {
        let sig: Signature = "AA ?? BB".parse().unwrap();
        assert_eq!(sig.len(), 3);
    }

    #[test]
    fn test_error_reexport() {
        let error = SigError::ProcessNotFound("python3".to_string());
        assert!(error.to_string().contains("Process not found"));
    }
}
