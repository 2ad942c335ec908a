//! Memory address wrapper type with hex parsing and validation

use super::error::{SigError, SigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Represents a virtual memory address with type-safe operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub usize);

impl Address {
    /// Creates a new address from a usize value
    pub const fn new(value: usize) -> Self {
        Address(value)
    }

    /// Creates a null address (0x0)
    pub const fn null() -> Self {
        Address(0)
    }

    /// Checks if the address is null
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the address is aligned to the specified boundary
    pub const fn is_aligned(&self, alignment: usize) -> bool {
        alignment != 0 && self.0 % alignment == 0
    }

    /// Adds an unsigned offset, failing on address-space overflow
    pub fn checked_add(&self, offset: usize) -> SigResult<Self> {
        self.0
            .checked_add(offset)
            .map(Address::new)
            .ok_or_else(|| SigError::InvalidAddress(format!("{self} + 0x{offset:x} overflows")))
    }

    /// Adds a signed offset to the address (wrapping; callers asserting
    /// validity use the Raw Field Accessor, which documents the contract)
    pub const fn offset(&self, offset: isize) -> Self {
        Address(self.0.wrapping_add_signed(offset))
    }

    /// Returns the raw usize value
    pub const fn as_usize(&self) -> usize {
        self.0
    }

    /// Returns the address as a pointer
    pub const fn as_ptr<T>(&self) -> *const T {
        self.0 as *const T
    }

    /// Returns the address as a mutable pointer
    pub const fn as_mut_ptr<T>(&self) -> *mut T {
        self.0 as *mut T
    }
}

impl FromStr for Address {
    type Err = SigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            usize::from_str_radix(hex, 16)
        } else if s.chars().any(|c| c.is_ascii_alphabetic()) {
            // Assume hex if it contains letters
            usize::from_str_radix(s, 16)
        } else {
            s.parse::<usize>().or_else(|_| usize::from_str_radix(s, 16))
        };

        value
            .map(Address::new)
            .map_err(|_| SigError::InvalidAddress(s.to_string()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl From<usize> for Address {
    fn from(value: usize) -> Self {
        Address::new(value)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address::new(value as usize)
    }
}

impl From<*const u8> for Address {
    fn from(ptr: *const u8) -> Self {
        Address::new(ptr as usize)
    }
}

impl From<*mut u8> for Address {
    fn from(ptr: *mut u8) -> Self {
        Address::new(ptr as usize)
    }
}
