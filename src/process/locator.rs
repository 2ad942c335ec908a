//! Process lookup by name over platform status records

use crate::core::types::{ProcessId, SigError, SigResult};
use crate::platform::ProcessSource;
use tracing::debug;

/// Locates running processes by inspecting their status records.
///
/// Enumeration is best-effort: candidates whose status cannot be read
/// (permission denied, already exited) are skipped, never fatal.
pub struct ProcessLocator<'s, S> {
    source: &'s S,
}

impl<'s, S: ProcessSource> ProcessLocator<'s, S> {
    /// Creates a locator over a platform source
    pub fn new(source: &'s S) -> Self {
        ProcessLocator { source }
    }

    /// Returns the first process whose status record contains `name`.
    ///
    /// The comparison is a substring search over the whole free-form
    /// status text. That makes "python" match "python3", but it can
    /// also produce false positives: any process whose status text
    /// merely mentions the search string (for example in an
    /// environment-derived field) will match. Callers needing
    /// precision should use [`find_by_exact_name`], which compares
    /// the labelled `Name:` field exactly.
    ///
    /// [`find_by_exact_name`]: ProcessLocator::find_by_exact_name
    pub fn find_by_name(&self, name: &str) -> SigResult<ProcessId> {
        self.find_first(name, |status| status.contains(name))
    }

    /// Returns every process whose status record contains `name`,
    /// in enumeration order
    pub fn find_all_by_name(&self, name: &str) -> SigResult<Vec<ProcessId>> {
        let mut found = Vec::new();
        for pid in self.source.processes()? {
            match self.source.status_text(pid) {
                Ok(status) if status.contains(name) => found.push(pid),
                Ok(_) => {}
                Err(err) if err.is_skippable() => {
                    debug!(pid, error = %err, "skipping unreadable candidate");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(found)
    }

    /// Returns the first process whose `Name:` status field equals
    /// `name` exactly
    pub fn find_by_exact_name(&self, name: &str) -> SigResult<ProcessId> {
        self.find_first(name, |status| status_name(status) == Some(name))
    }

    fn find_first(&self, name: &str, matches: impl Fn(&str) -> bool) -> SigResult<ProcessId> {
        for pid in self.source.processes()? {
            match self.source.status_text(pid) {
                Ok(status) if matches(&status) => {
                    debug!(pid, name, "matched process");
                    return Ok(pid);
                }
                Ok(_) => {}
                Err(err) if err.is_skippable() => {
                    debug!(pid, error = %err, "skipping unreadable candidate");
                }
                Err(err) => return Err(err),
            }
        }
        Err(SigError::ProcessNotFound(name.to_string()))
    }
}

/// Extracts the value of the labelled `Name:` field from a status record
fn status_name(status: &str) -> Option<&str> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("Name:"))
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Address, MemoryRegion};
    use std::collections::BTreeMap;

    struct FakeSource {
        records: BTreeMap<ProcessId, Result<String, ()>>,
    }

    impl FakeSource {
        fn new(entries: &[(ProcessId, &str)]) -> Self {
            FakeSource {
                records: entries
                    .iter()
                    .map(|(pid, status)| (*pid, Ok(status.to_string())))
                    .collect(),
            }
        }

        fn with_unreadable(mut self, pid: ProcessId) -> Self {
            self.records.insert(pid, Err(()));
            self
        }
    }

    impl ProcessSource for FakeSource {
        fn processes(&self) -> SigResult<Vec<ProcessId>> {
            Ok(self.records.keys().copied().collect())
        }

        fn status_text(&self, pid: ProcessId) -> SigResult<String> {
            match self.records.get(&pid) {
                Some(Ok(status)) => Ok(status.clone()),
                Some(Err(())) => Err(SigError::permission_denied(pid, "eperm")),
                None => Err(SigError::ProcessNotFound(pid.to_string())),
            }
        }

        fn memory_map(&self, _pid: ProcessId) -> SigResult<Vec<MemoryRegion>> {
            Ok(Vec::new())
        }

        fn read_memory(
            &self,
            _pid: ProcessId,
            _address: Address,
            _buf: &mut [u8],
        ) -> SigResult<usize> {
            Ok(0)
        }
    }

    #[test]
    fn test_find_by_name_substring() {
        let source = FakeSource::new(&[
            (100, "Name:\tbash\nPid:\t100\n"),
            (200, "Name:\tpython3\nPid:\t200\n"),
            (300, "Name:\tsshd\nPid:\t300\n"),
        ]);
        let locator = ProcessLocator::new(&source);
        assert_eq!(locator.find_by_name("python").unwrap(), 200);
    }

    #[test]
    fn test_find_by_name_no_match() {
        let source = FakeSource::new(&[(100, "Name:\tbash\n")]);
        let locator = ProcessLocator::new(&source);
        let err = locator.find_by_name("python").unwrap_err();
        assert!(matches!(err, SigError::ProcessNotFound(name) if name == "python"));
    }

    #[test]
    fn test_unreadable_candidates_are_skipped() {
        let source = FakeSource::new(&[
            (100, "Name:\tbash\n"),
            (300, "Name:\tpython3\n"),
        ])
        .with_unreadable(200);
        let locator = ProcessLocator::new(&source);
        assert_eq!(locator.find_by_name("python").unwrap(), 300);
    }

    #[test]
    fn test_find_all_by_name() {
        let source = FakeSource::new(&[
            (100, "Name:\tpython3\n"),
            (200, "Name:\tbash\n"),
            (300, "Name:\tpython3.10\n"),
        ]);
        let locator = ProcessLocator::new(&source);
        assert_eq!(locator.find_all_by_name("python").unwrap(), vec![100, 300]);
    }

    #[test]
    fn test_exact_name_matching() {
        let source = FakeSource::new(&[
            (100, "Name:\tpython3\nCmdLine:\tpython\n"),
            (200, "Name:\tpython\n"),
        ]);
        let locator = ProcessLocator::new(&source);
        // Substring picks the first mention anywhere in the record
        assert_eq!(locator.find_by_name("python").unwrap(), 100);
        // Exact matching compares only the labelled Name field
        assert_eq!(locator.find_by_exact_name("python").unwrap(), 200);
        assert!(locator.find_by_exact_name("pyth").is_err());
    }

    #[test]
    fn test_status_name_extraction() {
        assert_eq!(status_name("Name:\tpython3\nPid:\t1\n"), Some("python3"));
        assert_eq!(status_name("Pid:\t1\n"), None);
    }
}
