//! Platform abstraction for process and memory enumeration
//!
//! All OS-specific work lives behind the [`ProcessSource`] trait so the
//! locator, resolver and scanner stay platform-agnostic. Two backends
//! exist: a procfs backend for Linux and a ToolHelp32/VirtualQueryEx
//! backend for Windows.

use crate::core::types::{Address, MemoryRegion, ProcessId, SigResult};

#[cfg(target_os = "linux")]
pub mod procfs;
#[cfg(target_os = "linux")]
pub use procfs::ProcfsSource;

#[cfg(windows)]
pub mod win;
#[cfg(windows)]
pub use win::WinSource;

#[cfg(not(any(target_os = "linux", windows)))]
compile_error!("procsig supports the procfs (Linux) and ToolHelp32 (Windows) backends only");

/// Per-OS source of process identifiers, status records, memory maps
/// and raw memory.
///
/// Enumeration is best-effort: a pid returned by [`processes`] may
/// have exited by the time its status or map is queried, and
/// individual reads may fail with permission errors. Callers decide
/// whether such failures are skippable (see `SigError::is_skippable`).
///
/// [`processes`]: ProcessSource::processes
pub trait ProcessSource {
    /// Enumerates all process identifiers visible to the caller
    fn processes(&self) -> SigResult<Vec<ProcessId>>;

    /// Returns the free-form textual status record for a process
    fn status_text(&self, pid: ProcessId) -> SigResult<String>;

    /// Returns the ordered memory mapping listing for a process
    fn memory_map(&self, pid: ProcessId) -> SigResult<Vec<MemoryRegion>>;

    /// Reads up to `buf.len()` bytes of process memory at `address`,
    /// returning the number of bytes actually read
    fn read_memory(&self, pid: ProcessId, address: Address, buf: &mut [u8]) -> SigResult<usize>;
}

/// Returns the native backend for the current platform
#[cfg(target_os = "linux")]
pub fn native() -> ProcfsSource {
    ProcfsSource::new()
}

/// Returns the native backend for the current platform
#[cfg(windows)]
pub fn native() -> WinSource {
    WinSource::new()
}
