//! Sequential signature scanning over buffers and process regions

use crate::core::types::{
    Address, MemoryRegion, ProcessId, ScanOutcome, SigError, SigResult, Signature,
};
use crate::platform::ProcessSource;
use tracing::debug;

/// Default read granularity for process-region scans
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Finds the first (lowest-offset) occurrence of `sig` in `buf`.
///
/// A signature longer than the buffer cannot be scanned at all and is
/// an `OutOfBounds` error; a signature that simply occurs nowhere is
/// the normal `NotFound` outcome. The returned address is the offset
/// into `buf`.
pub fn find(buf: &[u8], sig: &Signature) -> SigResult<ScanOutcome> {
    check_bounds(buf, sig)?;
    Ok(matches(buf, Address::null(), sig).next().into())
}

/// Finds every occurrence of `sig` in `buf`, in ascending offset order
pub fn find_all(buf: &[u8], sig: &Signature) -> SigResult<Vec<Address>> {
    check_bounds(buf, sig)?;
    Ok(matches(buf, Address::null(), sig).collect())
}

/// Returns a lazy iterator over all match addresses of `sig` in `buf`,
/// reporting each hit as `base + offset`. The iterator is restartable:
/// clone it to rewind.
pub fn matches<'a>(buf: &'a [u8], base: Address, sig: &'a Signature) -> Matches<'a> {
    Matches {
        buf,
        base,
        sig,
        next: 0,
    }
}

fn check_bounds(buf: &[u8], sig: &Signature) -> SigResult<()> {
    if sig.len() > buf.len() {
        return Err(SigError::out_of_bounds(sig.len(), buf.len()));
    }
    Ok(())
}

/// Lazy iterator over signature matches in a byte buffer
#[derive(Debug, Clone)]
pub struct Matches<'a> {
    buf: &'a [u8],
    base: Address,
    sig: &'a Signature,
    next: usize,
}

impl Iterator for Matches<'_> {
    type Item = Address;

    fn next(&mut self) -> Option<Address> {
        let last = self.buf.len().checked_sub(self.sig.len())?;
        while self.next <= last {
            let offset = self.next;
            self.next += 1;
            if self.sig.matches(&self.buf[offset..]) {
                return Some(self.base.offset(offset as isize));
            }
        }
        None
    }
}

/// Scans live process memory region by region.
///
/// Regions are read in chunks that overlap by `signature.len() - 1`
/// bytes so matches straddling a chunk boundary are never missed.
/// Reads are defensive: pages inside the reported bounds may be
/// unmapped or unreadable by the time they are touched, and any such
/// failure only disqualifies the affected candidate offsets, it never
/// aborts the scan.
pub struct Scanner<'s, S> {
    source: &'s S,
    chunk_size: usize,
}

impl<'s, S: ProcessSource> Scanner<'s, S> {
    /// Creates a scanner with the default chunk size
    pub fn new(source: &'s S) -> Self {
        Scanner {
            source,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Creates a scanner with an explicit read granularity
    pub fn with_chunk_size(source: &'s S, chunk_size: usize) -> Self {
        Scanner {
            source,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Finds the first occurrence of `sig` in `region`, returning its
    /// absolute address
    pub fn scan_region(
        &self,
        pid: ProcessId,
        region: &MemoryRegion,
        sig: &Signature,
    ) -> SigResult<ScanOutcome> {
        let mut first = None;
        self.walk(pid, region, sig, |addr| {
            first = Some(addr);
            false
        })?;
        Ok(first.into())
    }

    /// Finds every occurrence of `sig` in `region`, in ascending
    /// address order
    pub fn scan_region_all(
        &self,
        pid: ProcessId,
        region: &MemoryRegion,
        sig: &Signature,
    ) -> SigResult<Vec<Address>> {
        let mut hits = Vec::new();
        self.walk(pid, region, sig, |addr| {
            hits.push(addr);
            true
        })?;
        Ok(hits)
    }

    /// Takes one contiguous snapshot of a region, for scanners that
    /// work over an in-memory buffer.
    ///
    /// A single `read_memory` call may legally return fewer bytes
    /// than requested, so the read is retried from where it stopped
    /// until the region is complete or the source reports end of
    /// readable memory. The returned buffer is truncated to the bytes
    /// actually read.
    pub fn snapshot_region(&self, pid: ProcessId, region: &MemoryRegion) -> SigResult<Vec<u8>> {
        let mut buf = vec![0u8; region.size];
        let mut filled = 0;
        while filled < region.size {
            let addr = region.base.offset(filled as isize);
            match self.source.read_memory(pid, addr, &mut buf[filled..])? {
                0 => break,
                n => filled += n,
            }
        }
        if filled < region.size {
            debug!(
                pid,
                base = %region.base,
                filled,
                size = region.size,
                "region snapshot truncated at end of readable memory"
            );
        }
        buf.truncate(filled);
        Ok(buf)
    }

    /// Chunked scan driver. `on_match` returns false to stop early.
    fn walk(
        &self,
        pid: ProcessId,
        region: &MemoryRegion,
        sig: &Signature,
        mut on_match: impl FnMut(Address) -> bool,
    ) -> SigResult<()> {
        if sig.len() > region.size {
            return Err(SigError::out_of_bounds(sig.len(), region.size));
        }

        let overlap = sig.len() - 1;
        let mut buf = vec![0u8; self.chunk_size + overlap];

        let mut start = 0usize;
        while start < region.size {
            // Candidate starts for this chunk are disjoint from the
            // next chunk's; the window tail overlaps into it so a
            // straddling match is seen exactly once.
            let candidates = self.chunk_size.min(region.size - start);
            let want = (candidates + overlap).min(region.size - start);
            let chunk_base = region.base.offset(start as isize);

            match self.source.read_memory(pid, chunk_base, &mut buf[..want]) {
                Ok(got) => {
                    // A short read disqualifies only the candidates
                    // whose window would run past the readable bytes.
                    for addr in matches(&buf[..got], chunk_base, sig) {
                        let offset = addr.as_usize() - chunk_base.as_usize();
                        if offset < candidates && !on_match(addr) {
                            return Ok(());
                        }
                    }
                }
                Err(err) => {
                    debug!(pid, %chunk_base, error = %err, "skipping unreadable chunk");
                }
            }

            start += candidates;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Protection;

    fn sig(text: &str) -> Signature {
        text.parse().unwrap()
    }

    #[test]
    fn test_find_at_offset() {
        let buf = [0x00, 0xAA, 0xBB, 0x11, 0xDD, 0x22];
        let outcome = find(&buf, &sig("AA BB ?? DD")).unwrap();
        assert_eq!(outcome, ScanOutcome::Found(Address::new(1)));
    }

    #[test]
    fn test_find_not_found() {
        let buf = [0x00, 0x01, 0x02, 0x03];
        let outcome = find(&buf, &sig("AA BB")).unwrap();
        assert_eq!(outcome, ScanOutcome::NotFound);
    }

    #[test]
    fn test_find_first_of_many() {
        let buf = [0xAA, 0x00, 0xAA, 0x00, 0xAA];
        let outcome = find(&buf, &sig("AA")).unwrap();
        assert_eq!(outcome, ScanOutcome::Found(Address::new(0)));
    }

    #[test]
    fn test_signature_longer_than_buffer() {
        let buf = [0xAA, 0xBB];
        let err = find(&buf, &sig("AA BB CC DD")).unwrap_err();
        assert!(matches!(
            err,
            SigError::OutOfBounds {
                needed: 4,
                available: 2
            }
        ));
    }

    #[test]
    fn test_match_at_exact_buffer_end() {
        let buf = [0x00, 0x00, 0xAA, 0xBB];
        let outcome = find(&buf, &sig("AA BB")).unwrap();
        assert_eq!(outcome, ScanOutcome::Found(Address::new(2)));
    }

    #[test]
    fn test_find_all_ascending() {
        let buf = [0xAA, 0xBB, 0x00, 0xAA, 0xBB, 0xAA, 0xBB];
        let hits = find_all(&buf, &sig("AA BB")).unwrap();
        assert_eq!(
            hits,
            vec![Address::new(0), Address::new(3), Address::new(5)]
        );
    }

    #[test]
    fn test_matches_iterator_is_lazy_and_restartable() {
        let buf = [0xAA, 0xAA, 0xAA];
        let signature = sig("AA");
        let iter = matches(&buf, Address::new(0x1000), &signature);

        let rewound = iter.clone();
        assert_eq!(iter.count(), 3);
        assert_eq!(
            rewound.collect::<Vec<_>>(),
            vec![
                Address::new(0x1000),
                Address::new(0x1001),
                Address::new(0x1002)
            ]
        );
    }

    #[test]
    fn test_overlapping_matches() {
        // Self-overlapping pattern occurrences are all reported
        let buf = [0xAA, 0xAA, 0xAA, 0xAA];
        let hits = find_all(&buf, &sig("AA AA")).unwrap();
        assert_eq!(hits.len(), 3);
    }

    /// Source exposing one in-memory region, optionally with an
    /// unreadable window inside it or a cap on bytes per read
    struct BufSource {
        base: usize,
        bytes: Vec<u8>,
        unreadable: Option<std::ops::Range<usize>>,
        max_read: usize,
    }

    impl BufSource {
        fn new(base: usize, bytes: Vec<u8>) -> Self {
            BufSource {
                base,
                bytes,
                unreadable: None,
                max_read: usize::MAX,
            }
        }

        fn region(&self) -> MemoryRegion {
            MemoryRegion::new(
                Address::new(self.base),
                self.bytes.len(),
                Protection::read_execute(),
                None,
            )
            .unwrap()
        }
    }

    impl ProcessSource for BufSource {
        fn processes(&self) -> SigResult<Vec<ProcessId>> {
            Ok(vec![1])
        }

        fn status_text(&self, _pid: ProcessId) -> SigResult<String> {
            Ok(String::new())
        }

        fn memory_map(&self, _pid: ProcessId) -> SigResult<Vec<MemoryRegion>> {
            Ok(vec![self.region()])
        }

        fn read_memory(
            &self,
            _pid: ProcessId,
            address: Address,
            buf: &mut [u8],
        ) -> SigResult<usize> {
            let offset = address.as_usize() - self.base;
            if let Some(hole) = &self.unreadable {
                if offset < hole.end && offset + buf.len() > hole.start {
                    return Err(SigError::read_failed(address, "page not mapped"));
                }
            }
            let n = buf.len().min(self.bytes.len() - offset).min(self.max_read);
            buf[..n].copy_from_slice(&self.bytes[offset..offset + n]);
            Ok(n)
        }
    }

    #[test]
    fn test_scan_region_absolute_address() {
        let mut bytes = vec![0u8; 1000];
        bytes[700..703].copy_from_slice(&[0xDE, 0xAD, 0xBE]);
        let source = BufSource::new(0x400000, bytes);

        let scanner = Scanner::new(&source);
        let outcome = scanner
            .scan_region(1, &source.region(), &sig("DE AD BE"))
            .unwrap();
        assert_eq!(outcome, ScanOutcome::Found(Address::new(0x400000 + 700)));
    }

    #[test]
    fn test_scan_region_match_straddles_chunk_boundary() {
        // Chunk size 16: pattern planted across the 16-byte boundary
        let mut bytes = vec![0u8; 64];
        bytes[14..18].copy_from_slice(&[0x11, 0x22, 0x33, 0x44]);
        let source = BufSource::new(0x1000, bytes);

        let scanner = Scanner::with_chunk_size(&source, 16);
        let outcome = scanner
            .scan_region(1, &source.region(), &sig("11 22 33 44"))
            .unwrap();
        assert_eq!(outcome, ScanOutcome::Found(Address::new(0x1000 + 14)));

        // And it is reported exactly once in all-matches mode
        let hits = scanner
            .scan_region_all(1, &source.region(), &sig("11 22 33 44"))
            .unwrap();
        assert_eq!(hits, vec![Address::new(0x1000 + 14)]);
    }

    #[test]
    fn test_scan_region_unreadable_chunk_is_skipped() {
        let mut bytes = vec![0u8; 64];
        bytes[8..10].copy_from_slice(&[0xCA, 0xFE]);
        bytes[40..42].copy_from_slice(&[0xCA, 0xFE]);
        let mut source = BufSource::new(0x1000, bytes);
        source.unreadable = Some(0..16);

        let scanner = Scanner::with_chunk_size(&source, 16);
        let outcome = scanner
            .scan_region(1, &source.region(), &sig("CA FE"))
            .unwrap();
        // The copy inside the unreadable window is invisible; the scan
        // carries on and finds the later one.
        assert_eq!(outcome, ScanOutcome::Found(Address::new(0x1000 + 40)));
    }

    #[test]
    fn test_scan_region_signature_longer_than_region() {
        let source = BufSource::new(0x1000, vec![0u8; 4]);
        let scanner = Scanner::new(&source);
        let err = scanner
            .scan_region(1, &source.region(), &sig("01 02 03 04 05 06"))
            .unwrap_err();
        assert!(matches!(err, SigError::OutOfBounds { .. }));
    }

    #[test]
    fn test_scan_region_all_many_chunks() {
        let mut bytes = vec![0u8; 256];
        let mut expected = Vec::new();
        for at in [3usize, 17, 31, 32, 200, 254] {
            bytes[at..at + 2].copy_from_slice(&[0xAB, 0xCD]);
            expected.push(Address::new(0x2000 + at));
        }
        let source = BufSource::new(0x2000, bytes);
        let scanner = Scanner::with_chunk_size(&source, 32);
        let hits = scanner
            .scan_region_all(1, &source.region(), &sig("AB CD"))
            .unwrap();
        assert_eq!(hits, expected);
    }

    #[test]
    fn test_snapshot_region_retries_short_reads() {
        // The source never hands out more than 4096 bytes per read;
        // the pattern sits well past the first read's reach.
        let mut bytes = vec![0u8; 64 * 1024];
        bytes[50_000..50_004].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        let mut source = BufSource::new(0x1000, bytes);
        source.max_read = 4096;

        let scanner = Scanner::with_chunk_size(&source, 4096);
        let snapshot = scanner.snapshot_region(1, &source.region()).unwrap();
        assert_eq!(snapshot.len(), 64 * 1024);

        let pattern = sig("DE AD BE EF");
        let in_snapshot = find(&snapshot, &pattern).unwrap();
        assert_eq!(in_snapshot, ScanOutcome::Found(Address::new(50_000)));

        // Snapshot-then-scan agrees with the chunked region scan
        let chunked = scanner
            .scan_region(1, &source.region(), &pattern)
            .unwrap();
        assert_eq!(chunked, ScanOutcome::Found(Address::new(0x1000 + 50_000)));
    }

    #[test]
    fn test_snapshot_region_truncates_at_eof() {
        // Region claims more bytes than the source can deliver
        let source = BufSource::new(0, vec![0xAB; 100]);
        let region = MemoryRegion::new(
            Address::new(0),
            256,
            Protection::read_execute(),
            None,
        )
        .unwrap();

        let scanner = Scanner::new(&source);
        let snapshot = scanner.snapshot_region(1, &region).unwrap();
        assert_eq!(snapshot.len(), 100);
        assert!(snapshot.iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_scan_region_matches_buffer_scan() {
        // Region scan and plain buffer scan agree on a mixed pattern
        let bytes: Vec<u8> = (0..=255u8).cycle().take(1024).collect();
        let source = BufSource::new(0x7000, bytes.clone());
        let scanner = Scanner::with_chunk_size(&source, 100);

        let pattern = sig("10 ?? 12");
        let from_region = scanner
            .scan_region_all(1, &source.region(), &pattern)
            .unwrap();
        let from_buf: Vec<Address> = find_all(&bytes, &pattern)
            .unwrap()
            .into_iter()
            .map(|a| a.offset(0x7000))
            .collect();
        assert_eq!(from_region, from_buf);
    }
}
