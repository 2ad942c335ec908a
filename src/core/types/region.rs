//! Memory region and protection descriptors

use super::address::Address;
use super::error::{SigError, SigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Page protection flags for a mapped region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Protection {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
    /// Mapping is shared between processes (procfs 's' flag)
    pub shared: bool,
}

impl Protection {
    /// Read-only protection
    pub const fn read_only() -> Self {
        Protection {
            read: true,
            write: false,
            execute: false,
            shared: false,
        }
    }

    /// Read-write protection
    pub const fn read_write() -> Self {
        Protection {
            read: true,
            write: true,
            execute: false,
            shared: false,
        }
    }

    /// Read-execute protection (typical for module text segments)
    pub const fn read_execute() -> Self {
        Protection {
            read: true,
            write: false,
            execute: true,
            shared: false,
        }
    }

    /// Parses a procfs-style permission field such as "r-xp"
    pub fn parse(field: &str) -> Option<Self> {
        let bytes = field.as_bytes();
        if bytes.len() != 4 {
            return None;
        }
        let flag = |b: u8, on: u8| -> Option<bool> {
            if b == on {
                Some(true)
            } else if b == b'-' {
                Some(false)
            } else {
                None
            }
        };
        Some(Protection {
            read: flag(bytes[0], b'r')?,
            write: flag(bytes[1], b'w')?,
            execute: flag(bytes[2], b'x')?,
            shared: match bytes[3] {
                b's' => true,
                b'p' | b'-' => false,
                _ => return None,
            },
        })
    }
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            if self.read { 'r' } else { '-' },
            if self.write { 'w' } else { '-' },
            if self.execute { 'x' } else { '-' },
            if self.shared { 's' } else { 'p' },
        )
    }
}

/// One contiguous mapping in a process's address space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    pub base: Address,
    pub size: usize,
    pub protection: Protection,
    /// Backing file path, if the mapping is file-backed
    pub path: Option<PathBuf>,
}

impl MemoryRegion {
    /// Creates a validated region. Rejects empty regions and regions
    /// whose end would overflow the address space.
    pub fn new(
        base: Address,
        size: usize,
        protection: Protection,
        path: Option<PathBuf>,
    ) -> SigResult<Self> {
        if size == 0 {
            return Err(SigError::InvalidAddress(format!(
                "empty region at {base}"
            )));
        }
        base.checked_add(size)?;
        Ok(MemoryRegion {
            base,
            size,
            protection,
            path,
        })
    }

    /// Exclusive end address of the region
    pub fn end(&self) -> Address {
        // Invariant established in new(): base + size does not overflow
        Address::new(self.base.as_usize() + self.size)
    }

    /// Checks whether an address falls inside this region
    pub fn contains(&self, address: Address) -> bool {
        address >= self.base && address < self.end()
    }

    /// True when the backing path contains `name` (substring match,
    /// mirroring the module-lookup contract)
    pub fn path_contains(&self, name: &str) -> bool {
        self.path
            .as_ref()
            .map(|p| p.to_string_lossy().contains(name))
            .unwrap_or(false)
    }
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} {}", self.base, self.end(), self.protection)?;
        if let Some(path) = &self.path {
            write!(f, " {}", path.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protection_parse() {
        let p = Protection::parse("r-xp").unwrap();
        assert!(p.read && p.execute && !p.write && !p.shared);

        let p = Protection::parse("rw-s").unwrap();
        assert!(p.read && p.write && !p.execute && p.shared);

        assert!(Protection::parse("----").is_some());
        assert!(Protection::parse("rwx").is_none());
        assert!(Protection::parse("rq-p").is_none());
        assert!(Protection::parse("r-xpp").is_none());
    }

    #[test]
    fn test_protection_display_roundtrip() {
        for field in ["r-xp", "rw-p", "---p", "rwxs"] {
            let p = Protection::parse(field).unwrap();
            assert_eq!(p.to_string(), field);
        }
    }

    #[test]
    fn test_region_validation() {
        let ok = MemoryRegion::new(Address::new(0x1000), 0x2000, Protection::read_only(), None);
        assert!(ok.is_ok());

        let empty = MemoryRegion::new(Address::new(0x1000), 0, Protection::read_only(), None);
        assert!(empty.is_err());

        let overflow =
            MemoryRegion::new(Address::new(usize::MAX - 10), 0x20, Protection::read_only(), None);
        assert!(overflow.is_err());
    }

    #[test]
    fn test_region_contains() {
        let region =
            MemoryRegion::new(Address::new(0x1000), 0x2000, Protection::read_only(), None).unwrap();

        assert!(region.contains(Address::new(0x1000)));
        assert!(region.contains(Address::new(0x2FFF)));
        assert!(!region.contains(Address::new(0x0FFF)));
        assert!(!region.contains(Address::new(0x3000)));
        assert_eq!(region.end(), Address::new(0x3000));
    }

    #[test]
    fn test_path_contains() {
        let region = MemoryRegion::new(
            Address::new(0x7f0000000000),
            0x1000,
            Protection::read_execute(),
            Some(PathBuf::from("/usr/lib/x86_64-linux-gnu/libc.so.6")),
        )
        .unwrap();

        assert!(region.path_contains("libc"));
        assert!(!region.path_contains("libm.so"));

        let anon =
            MemoryRegion::new(Address::new(0x1000), 0x1000, Protection::read_write(), None).unwrap();
        assert!(!anon.path_contains("libc"));
    }
}
