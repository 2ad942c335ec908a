//! Linux procfs backend
//!
//! Reads `/proc/<pid>/status`, `/proc/<pid>/maps` and
//! `/proc/<pid>/mem`. Every maps line is tokenized into whole fields
//! and validated as a complete record before any field is consumed;
//! a structurally malformed line is a `MapParse` error, never a
//! silent misparse.

use crate::core::types::{
    Address, MemoryRegion, ProcessId, Protection, SigError, SigResult,
};
use crate::platform::ProcessSource;
use std::fs::{self, File};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Process source backed by the proc pseudo-filesystem
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    root: PathBuf,
}

impl ProcfsSource {
    /// Creates a source rooted at `/proc`
    pub fn new() -> Self {
        ProcfsSource {
            root: PathBuf::from("/proc"),
        }
    }

    /// Creates a source rooted at an arbitrary directory. Tests use
    /// this to run the full pipeline against a synthetic proc tree.
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        ProcfsSource {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn pid_path(&self, pid: ProcessId, entry: &str) -> PathBuf {
        self.root.join(pid.to_string()).join(entry)
    }
}

impl Default for ProcfsSource {
    fn default() -> Self {
        ProcfsSource::new()
    }
}

impl ProcessSource for ProcfsSource {
    fn processes(&self) -> SigResult<Vec<ProcessId>> {
        let mut pids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            // Entries that vanish mid-enumeration are skipped
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    debug!(error = %err, "skipping unreadable proc entry");
                    continue;
                }
            };
            if let Some(pid) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<ProcessId>().ok())
            {
                pids.push(pid);
            }
        }
        pids.sort_unstable();
        Ok(pids)
    }

    fn status_text(&self, pid: ProcessId) -> SigResult<String> {
        Ok(fs::read_to_string(self.pid_path(pid, "status"))?)
    }

    fn memory_map(&self, pid: ProcessId) -> SigResult<Vec<MemoryRegion>> {
        let listing = fs::read_to_string(self.pid_path(pid, "maps"))?;
        parse_maps(&listing)
    }

    fn read_memory(&self, pid: ProcessId, address: Address, buf: &mut [u8]) -> SigResult<usize> {
        let file = File::open(self.pid_path(pid, "mem"))?;
        let read = file.read_at(buf, address.as_usize() as u64)?;
        Ok(read)
    }
}

/// Parses a complete maps listing into validated regions
pub fn parse_maps(listing: &str) -> SigResult<Vec<MemoryRegion>> {
    listing
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| parse_maps_line(line, index + 1))
        .collect()
}

/// Parses one maps record:
///
/// ```text
/// 55a1b2c00000-55a1b2c21000 r-xp 00002000 fd:01 1048613  /usr/bin/python3.10
/// ```
///
/// The record is split into its five mandatory fields plus the
/// optional path before anything is interpreted, so a truncated or
/// garbled line fails as a whole instead of being scanned past.
fn parse_maps_line(line: &str, lineno: usize) -> SigResult<MemoryRegion> {
    let mut fields = line.split_whitespace();

    let range = fields
        .next()
        .ok_or_else(|| SigError::map_parse(lineno, "empty record"))?;
    let perms = fields
        .next()
        .ok_or_else(|| SigError::map_parse(lineno, "missing permission field"))?;
    let offset = fields
        .next()
        .ok_or_else(|| SigError::map_parse(lineno, "missing offset field"))?;
    let _device = fields
        .next()
        .ok_or_else(|| SigError::map_parse(lineno, "missing device field"))?;
    let inode = fields
        .next()
        .ok_or_else(|| SigError::map_parse(lineno, "missing inode field"))?;

    // The backing path may itself contain spaces, so it is taken as
    // the raw remainder of the line rather than the next token.
    let path = fields.next().map(|first| {
        let start = first.as_ptr() as usize - line.as_ptr() as usize;
        PathBuf::from(line[start..].trim_end())
    });

    let (start, end) = range
        .split_once('-')
        .ok_or_else(|| SigError::map_parse(lineno, format!("invalid range '{range}'")))?;
    let start = usize::from_str_radix(start, 16)
        .map_err(|_| SigError::map_parse(lineno, format!("invalid start address '{start}'")))?;
    let end = usize::from_str_radix(end, 16)
        .map_err(|_| SigError::map_parse(lineno, format!("invalid end address '{end}'")))?;
    if end <= start {
        return Err(SigError::map_parse(
            lineno,
            format!("range end 0x{end:x} not past start 0x{start:x}"),
        ));
    }

    let protection = Protection::parse(perms)
        .ok_or_else(|| SigError::map_parse(lineno, format!("invalid permissions '{perms}'")))?;

    usize::from_str_radix(offset, 16)
        .map_err(|_| SigError::map_parse(lineno, format!("invalid offset '{offset}'")))?;
    inode
        .parse::<u64>()
        .map_err(|_| SigError::map_parse(lineno, format!("invalid inode '{inode}'")))?;

    MemoryRegion::new(Address::new(start), end - start, protection, path)
        .map_err(|err| SigError::map_parse(lineno, err.to_string()))
}
