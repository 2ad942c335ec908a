//! Parallel signature scanning over byte buffers
//!
//! The candidate start offsets are partitioned into disjoint
//! contiguous ranges, one per worker; match windows may extend past a
//! range's end into the shared buffer, which gives the required
//! `signature.len() - 1` overlap without re-reading any bytes. Workers
//! share only the lowest match found so far (atomic min) and a
//! cancellation flag polled at a bounded stride.

use crate::core::types::{Address, ScanOutcome, SigError, SigResult, Signature};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

/// How many candidates a worker tries between cancellation checks
pub const DEFAULT_CANCEL_STRIDE: usize = 4096;

/// Multi-threaded scanner with first-match-wins cancellation
#[derive(Debug, Clone)]
pub struct ParallelScanner {
    workers: usize,
    cancel_stride: usize,
}

impl Default for ParallelScanner {
    fn default() -> Self {
        ParallelScanner::new(num_cpus::get())
    }
}

impl ParallelScanner {
    /// Creates a scanner that splits work into `workers` ranges
    pub fn new(workers: usize) -> Self {
        ParallelScanner {
            workers: workers.max(1),
            cancel_stride: DEFAULT_CANCEL_STRIDE,
        }
    }

    /// Sets the cancellation polling stride. A smaller stride reacts
    /// faster after another worker finds a match, at a small cost per
    /// candidate.
    pub fn with_cancel_stride(mut self, stride: usize) -> Self {
        self.cancel_stride = stride.max(1);
        self
    }

    /// Finds the first (lowest-offset) occurrence of `sig` in `buf`.
    ///
    /// Result is identical to the sequential [`find`]; only the wall
    /// time differs. Once any worker has a match, workers whose
    /// remaining candidates cannot beat it stop early.
    ///
    /// [`find`]: super::scanner::find
    pub fn find(&self, buf: &[u8], sig: &Signature) -> SigResult<ScanOutcome> {
        let ranges = self.partition(buf, sig)?;
        let best = AtomicUsize::new(usize::MAX);
        let cancel = AtomicBool::new(false);

        ranges.par_iter().for_each(|&(lo, hi)| {
            for (tried, i) in (lo..hi).enumerate() {
                if tried % self.cancel_stride == 0
                    && cancel.load(Ordering::Relaxed)
                    && best.load(Ordering::Relaxed) <= i
                {
                    // Nothing left in this range can be a lower match
                    return;
                }
                if sig.matches(&buf[i..]) {
                    best.fetch_min(i, Ordering::SeqCst);
                    cancel.store(true, Ordering::SeqCst);
                    debug!(offset = i, "parallel worker matched");
                    return;
                }
            }
        });

        Ok(match best.load(Ordering::SeqCst) {
            usize::MAX => ScanOutcome::NotFound,
            offset => ScanOutcome::Found(Address::new(offset)),
        })
    }

    /// Finds every occurrence of `sig` in `buf`, in ascending offset
    /// order. No cancellation happens in this mode; per-range results
    /// are concatenated in range order, which is already sorted.
    pub fn find_all(&self, buf: &[u8], sig: &Signature) -> SigResult<Vec<Address>> {
        let ranges = self.partition(buf, sig)?;
        let hits: Vec<Vec<usize>> = ranges
            .par_iter()
            .map(|&(lo, hi)| (lo..hi).filter(|&i| sig.matches(&buf[i..])).collect())
            .collect();

        Ok(hits
            .into_iter()
            .flatten()
            .map(Address::new)
            .collect())
    }

    /// Splits the candidate start range into disjoint per-worker
    /// sub-ranges
    fn partition(&self, buf: &[u8], sig: &Signature) -> SigResult<Vec<(usize, usize)>> {
        if sig.len() > buf.len() {
            return Err(SigError::out_of_bounds(sig.len(), buf.len()));
        }
        let starts = buf.len() - sig.len() + 1;
        let per_worker = starts.div_ceil(self.workers).max(1);

        Ok((0..starts)
            .step_by(per_worker)
            .map(|lo| (lo, (lo + per_worker).min(starts)))
            .collect())
    }
}
