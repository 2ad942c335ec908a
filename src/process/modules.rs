//! Module resolution over per-process mapping listings

use crate::core::types::{MemoryRegion, ProcessId, SigError, SigResult};
use crate::platform::ProcessSource;
use tracing::debug;

/// Resolves named modules to their mapped regions.
///
/// A returned region describes the process's address space at the
/// time of the query; the process may remap concurrently, so treat
/// the result as best-effort and re-resolve after failures.
pub struct ModuleResolver<'s, S> {
    source: &'s S,
}

impl<'s, S: ProcessSource> ModuleResolver<'s, S> {
    /// Creates a resolver over a platform source
    pub fn new(source: &'s S) -> Self {
        ModuleResolver { source }
    }

    /// Returns the full parsed mapping listing for a process
    pub fn modules(&self, pid: ProcessId) -> SigResult<Vec<MemoryRegion>> {
        self.source.memory_map(pid)
    }

    /// Resolves a module to its first mapped region.
    ///
    /// With `module = None` the first executable mapping wins (the
    /// process image's text segment in practice). With `Some(name)`
    /// the first mapping whose backing path contains `name` wins.
    /// This is substring matching, with the same false-positive
    /// hazard as process lookup.
    pub fn resolve(&self, pid: ProcessId, module: Option<&str>) -> SigResult<MemoryRegion> {
        let regions = self.source.memory_map(pid)?;

        let found = match module {
            None => regions.into_iter().find(|r| r.protection.execute),
            Some(name) => regions.into_iter().find(|r| r.path_contains(name)),
        };

        match found {
            Some(region) => {
                debug!(pid, module = module.unwrap_or("<first executable>"), %region, "resolved module");
                Ok(region)
            }
            None => Err(SigError::ModuleNotFound(
                module.unwrap_or("<first executable>").to_string(),
            )),
        }
    }

    /// Resolves a module and returns its base address only
    pub fn base_address(
        &self,
        pid: ProcessId,
        module: Option<&str>,
    ) -> SigResult<crate::core::types::Address> {
        Ok(self.resolve(pid, module)?.base)
    }
}
