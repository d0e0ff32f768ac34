//! Value scanning: full region sweeps and refinement of prior hits

use super::{MemoryRegion, ProcessMemory};
use crate::config::ScannerConfig;
use crate::core::codec;
use crate::core::types::{MemoryResult, ScanCriteria, ScanHit};
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, warn};

/// Options for memory scanning
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Sweep regions in parallel during full scans
    pub parallel: bool,
    /// Worker threads for parallel sweeps
    pub max_threads: usize,
    /// Largest single read issued against a region
    pub chunk_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            parallel: true,
            max_threads: num_cpus::get().min(8),
            chunk_size: 16 * 1024 * 1024,
        }
    }
}

impl From<&ScannerConfig> for ScanOptions {
    fn from(config: &ScannerConfig) -> Self {
        ScanOptions {
            parallel: config.parallel,
            max_threads: config.max_threads,
            chunk_size: config.chunk_size,
        }
    }
}

/// Offsets in `buffer` where a window of the criteria's width matches.
///
/// Every byte offset is tested, so overlapping matches are all reported.
pub fn find_matches(buffer: &[u8], criteria: &ScanCriteria) -> Vec<usize> {
    let width = criteria.width();
    if width == 0 {
        return Vec::new();
    }

    buffer
        .windows(width)
        .enumerate()
        .filter(|(_, window)| criteria.matches_window(window))
        .map(|(offset, _)| offset)
        .collect()
}

/// Memory scanner bound to one opened process
pub struct MemoryScanner<'a, P: ?Sized> {
    process: &'a P,
    options: &'a ScanOptions,
    pool: Option<&'a ThreadPool>,
}

impl<'a, P> MemoryScanner<'a, P>
where
    P: ProcessMemory + Sync + ?Sized,
{
    /// Create a new memory scanner
    pub fn new(process: &'a P, options: &'a ScanOptions) -> Self {
        MemoryScanner {
            process,
            options,
            pool: None,
        }
    }

    /// Run parallel sweeps on `pool`
    pub fn with_pool(mut self, pool: Option<&'a ThreadPool>) -> Self {
        self.pool = pool;
        self
    }

    /// Sweep every region of the process.
    ///
    /// A region that fails to read contributes no hits; the sweep continues.
    pub fn full_scan(&self, criteria: &ScanCriteria) -> MemoryResult<Vec<ScanHit>> {
        criteria.validate_full_scan()?;

        let regions = self.process.regions()?;
        debug!(
            pid = self.process.pid(),
            regions = regions.len(),
            "sweeping regions"
        );

        let per_region: Vec<Vec<ScanHit>> = match self.pool {
            Some(pool) if self.options.parallel => pool.install(|| {
                regions
                    .par_iter()
                    .map(|region| self.sweep_region(region, criteria))
                    .collect()
            }),
            _ => regions
                .iter()
                .map(|region| self.sweep_region(region, criteria))
                .collect(),
        };

        Ok(per_region.into_iter().flatten().collect())
    }

    /// Re-test each prior hit at its fixed address.
    ///
    /// Hits whose address can no longer be read are dropped, so the output
    /// is always a subset of `previous`.
    pub fn refine_scan(&self, criteria: &ScanCriteria, previous: &[ScanHit]) -> Vec<ScanHit> {
        previous
            .iter()
            .filter_map(|prior| self.refine_hit(criteria, prior))
            .collect()
    }

    fn sweep_region(&self, region: &MemoryRegion, criteria: &ScanCriteria) -> Vec<ScanHit> {
        match self.scan_region(region, criteria) {
            Ok(hits) => hits,
            Err(err) => {
                debug!(region = %region, error = %err, "skipping unreadable region");
                Vec::new()
            }
        }
    }

    /// Scan a single region, failing if any of its chunks cannot be read
    pub fn scan_region(
        &self,
        region: &MemoryRegion,
        criteria: &ScanCriteria,
    ) -> MemoryResult<Vec<ScanHit>> {
        let width = criteria.width();
        let ty = criteria.ty();
        let mut hits = Vec::new();

        if region.size < width {
            return Ok(hits);
        }

        for (offset, len) in region.chunks(self.options.chunk_size, width - 1) {
            let chunk_base = region.base_address.checked_add(offset)?;
            let buffer = self.process.read_bytes(chunk_base, len)?;

            for position in find_matches(&buffer, criteria) {
                let address = chunk_base.checked_add(position)?;
                hits.push(ScanHit::observed(
                    address,
                    &buffer[position..position + width],
                    ty,
                )?);
            }
        }

        Ok(hits)
    }

    fn refine_hit(&self, criteria: &ScanCriteria, prior: &ScanHit) -> Option<ScanHit> {
        let ty = criteria.ty();
        let bytes = match self.process.read_bytes(prior.address, criteria.width()) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(address = %prior.address, error = %err, "dropping unreadable hit");
                return None;
            }
        };

        let keep = if criteria.operator.requires_previous() {
            let baseline = match prior.baseline(ty) {
                Ok(baseline) => baseline,
                Err(err) => {
                    warn!(address = %prior.address, error = %err, "dropping hit without usable baseline");
                    return None;
                }
            };
            let current = codec::decode(&bytes, ty).ok()?;
            criteria.matches_baseline(current, baseline)
        } else {
            criteria.matches_window(&bytes)
        };

        if !keep {
            return None;
        }
        ScanHit::observed(prior.address, &bytes, ty).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Address, MemoryError, NumericType, Operator, ProcessId, TypedValue};
    use crate::memory::SnapshotProcess;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn criteria(ty: NumericType, value: f64, operator: Operator) -> ScanCriteria {
        ScanCriteria::new(TypedValue::new(ty, value).unwrap(), operator)
    }

    fn sequential() -> ScanOptions {
        ScanOptions {
            parallel: false,
            max_threads: 1,
            chunk_size: 4096,
        }
    }

    /// Fails every read that starts at or past `fault_from`
    struct FaultyTail {
        image: SnapshotProcess,
        fault_from: Address,
        reads: AtomicUsize,
    }

    impl ProcessMemory for FaultyTail {
        fn pid(&self) -> ProcessId {
            self.image.pid()
        }

        fn regions(&self) -> MemoryResult<Vec<MemoryRegion>> {
            self.image.regions()
        }

        fn read_bytes(&self, address: Address, len: usize) -> MemoryResult<Vec<u8>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if address >= self.fault_from {
                return Err(MemoryError::read_failed(address, "page went away"));
            }
            self.image.read_bytes(address, len)
        }

        fn write_bytes(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
            self.image.write_bytes(address, data)
        }
    }

    fn two_ints() -> SnapshotProcess {
        let mut data = 100i32.to_le_bytes().to_vec();
        data.extend_from_slice(&200i32.to_le_bytes());
        SnapshotProcess::new(1).with_region(0x1000, data)
    }

    #[test]
    fn test_find_matches_overlapping() {
        let c = criteria(NumericType::Int32, 0.0, Operator::Equal);
        let buffer = [0u8; 6];
        assert_eq!(find_matches(&buffer, &c), vec![0, 1, 2]);
    }

    #[test]
    fn test_find_matches_short_buffer() {
        let c = criteria(NumericType::Int64, 0.0, Operator::Equal);
        assert!(find_matches(&[0u8; 7], &c).is_empty());
        assert_eq!(find_matches(&[0u8; 8], &c), vec![0]);
    }

    #[test]
    fn test_full_scan_greater() {
        let process = two_ints();
        let options = sequential();
        let scanner = MemoryScanner::new(&process, &options);

        let hits = scanner
            .full_scan(&criteria(NumericType::Int32, 150.0, Operator::Greater))
            .unwrap();

        // Unaligned windows [0,0,200,0] and [0,200,0,0] also decode above 150
        let addresses: Vec<Address> = hits.iter().map(|h| h.address).collect();
        assert_eq!(
            addresses,
            vec![Address::new(0x1002), Address::new(0x1003), Address::new(0x1004)]
        );
        assert_eq!(hits[2].value, "200");
        assert_eq!(hits[0].value, "13107200");
    }

    #[test]
    fn test_full_scan_rejects_baseline_operators() {
        let process = two_ints();
        let options = sequential();
        let scanner = MemoryScanner::new(&process, &options);

        for op in [Operator::Increased, Operator::Decreased] {
            let err = scanner
                .full_scan(&criteria(NumericType::Int32, 0.0, op))
                .unwrap_err();
            assert!(matches!(err, MemoryError::InvalidOperator(_)));
        }
    }

    #[test]
    fn test_chunked_scan_finds_straddling_value() {
        let mut data = vec![0xAAu8; 64];
        data[30..34].copy_from_slice(&0x0BADF00Di32.to_le_bytes());
        let process = SnapshotProcess::new(1).with_region(0x4000, data);
        let options = ScanOptions {
            parallel: false,
            max_threads: 1,
            chunk_size: 32,
        };
        let scanner = MemoryScanner::new(&process, &options);

        let hits = scanner
            .full_scan(&criteria(NumericType::Int32, 0x0BADF00D as f64, Operator::Equal))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].address, Address::new(0x4000 + 30));
    }

    #[test]
    fn test_failed_later_chunk_discards_region() {
        let mut first = vec![0u8; 96];
        first[4..8].copy_from_slice(&4242i32.to_le_bytes());
        first[70..74].copy_from_slice(&4242i32.to_le_bytes());
        let mut second = vec![0u8; 16];
        second[8..12].copy_from_slice(&4242i32.to_le_bytes());

        let process = FaultyTail {
            image: SnapshotProcess::new(1)
                .with_region(0x4000, first)
                .with_region(0x8000, second),
            // second chunk of the 0x4000 region starts at offset 29
            fault_from: Address::new(0x4000 + 29),
            reads: AtomicUsize::new(0),
        };
        let options = ScanOptions {
            parallel: false,
            max_threads: 1,
            chunk_size: 32,
        };
        let scanner = MemoryScanner::new(&process, &options);
        let c = criteria(NumericType::Int32, 4242.0, Operator::Equal);

        let region = MemoryRegion::new(Address::new(0x4000), 96);
        assert!(matches!(
            scanner.scan_region(&region, &c),
            Err(MemoryError::ReadFailed { .. })
        ));

        process.reads.store(0, Ordering::SeqCst);
        let hits = scanner.full_scan(&c).unwrap();
        let addresses: Vec<Address> = hits.iter().map(|h| h.address).collect();
        assert_eq!(addresses, vec![Address::new(0x8008)]);
        // chunk 0 of the first region, its failing chunk 1, then the second region
        assert_eq!(process.reads.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_region_smaller_than_width() {
        let process = SnapshotProcess::new(1).with_region(0x1000, vec![0; 3]);
        let options = sequential();
        let scanner = MemoryScanner::new(&process, &options);
        let hits = scanner
            .full_scan(&criteria(NumericType::Int32, 0.0, Operator::Equal))
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_refine_increased_and_decreased() {
        let process = two_ints();
        let options = sequential();
        let scanner = MemoryScanner::new(&process, &options);
        let previous = vec![ScanHit::new(Address::new(0x1004), "200")];

        process
            .write_bytes(Address::new(0x1004), &250i32.to_le_bytes())
            .unwrap();
        let up = scanner.refine_scan(&criteria(NumericType::Int32, 0.0, Operator::Increased), &previous);
        assert_eq!(up.len(), 1);
        assert_eq!(up[0].value, "250");

        let down =
            scanner.refine_scan(&criteria(NumericType::Int32, 0.0, Operator::Decreased), &previous);
        assert!(down.is_empty());
    }

    #[test]
    fn test_refine_drops_bad_baseline() {
        let process = two_ints();
        let options = sequential();
        let scanner = MemoryScanner::new(&process, &options);
        let previous = vec![ScanHit::new(Address::new(0x1004), "not a number")];

        let hits =
            scanner.refine_scan(&criteria(NumericType::Int32, 0.0, Operator::Increased), &previous);
        assert!(hits.is_empty());
    }
}
