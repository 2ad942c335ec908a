//! Scan outcome type

use super::address::Address;
use serde::{Deserialize, Serialize};

/// Outcome of a single signature scan.
///
/// `NotFound` is a normal result, not an error: a pattern that occurs
/// nowhere in the scanned bytes is an answer, not a failure. Errors
/// are reserved for scans that could not be performed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanOutcome {
    Found(Address),
    NotFound,
}

impl ScanOutcome {
    /// The matched address, if any
    pub fn found(&self) -> Option<Address> {
        match self {
            ScanOutcome::Found(addr) => Some(*addr),
            ScanOutcome::NotFound => None,
        }
    }

    /// True when the scan produced a match
    pub fn is_found(&self) -> bool {
        matches!(self, ScanOutcome::Found(_))
    }
}

impl From<Option<Address>> for ScanOutcome {
    fn from(value: Option<Address>) -> Self {
        match value {
            Some(addr) => ScanOutcome::Found(addr),
            None => ScanOutcome::NotFound,
        }
    }
}
