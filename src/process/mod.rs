//! Process location and module resolution
//!
//! The first two stages of the pipeline: find a process id by name,
//! then resolve a named module (or the first executable mapping) to
//! its memory region. Both are one-shot, syscall-bound queries; cache
//! the results rather than calling them in a loop.

pub mod locator;
pub mod modules;

pub use locator::ProcessLocator;
pub use modules::ModuleResolver;
