//! Scan and modify entry points with scoped process handles

use crate::config::ScannerConfig;
use crate::core::types::{
    Address, MemoryError, MemoryResult, Operator, ProcessId, ScanCriteria, ScanHit, TypedValue,
};
use crate::memory::{MemoryAccess, MemoryScanner, MemoryWriter, ScanOptions};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::time::Instant;
use tracing::info;

/// Value search, refine and modify over a [`MemoryAccess`] backend.
///
/// The engine keeps no per-process state between calls: every call opens
/// the target process, does its work and drops the handle on return.
pub struct ScanEngine<A: MemoryAccess> {
    access: A,
    options: ScanOptions,
    pool: Option<ThreadPool>,
}

impl<A: MemoryAccess> ScanEngine<A> {
    /// Create an engine; builds the sweep pool when `options.parallel` is set
    pub fn new(access: A, options: ScanOptions) -> MemoryResult<Self> {
        let pool = if options.parallel {
            let pool = ThreadPoolBuilder::new()
                .num_threads(options.max_threads)
                .thread_name(|i| format!("memsearch-scan-{}", i))
                .build()
                .map_err(|e| {
                    MemoryError::UnsupportedOperation(format!("scan thread pool: {}", e))
                })?;
            Some(pool)
        } else {
            None
        };

        Ok(ScanEngine {
            access,
            options,
            pool,
        })
    }

    /// Create an engine from the `[scanner]` configuration section
    pub fn from_config(access: A, config: &ScannerConfig) -> MemoryResult<Self> {
        Self::new(access, ScanOptions::from(config))
    }

    /// Backend this engine reads through
    pub fn access(&self) -> &A {
        &self.access
    }

    /// Scan options in effect
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Search `pid` for `target` under `operator`.
    ///
    /// With no `previous` hits every region is swept; otherwise only the
    /// prior addresses are re-tested and the result is a subset of them.
    pub fn scan(
        &self,
        pid: ProcessId,
        target: &TypedValue,
        operator: Operator,
        previous: &[ScanHit],
    ) -> MemoryResult<Vec<ScanHit>> {
        let criteria = ScanCriteria::new(target.clone(), operator);
        if previous.is_empty() {
            criteria.validate_full_scan()?;
        }

        let process = self.access.open(pid)?;
        let scanner = MemoryScanner::new(&process, &self.options).with_pool(self.pool.as_ref());
        let started = Instant::now();

        let hits = if previous.is_empty() {
            scanner.full_scan(&criteria)?
        } else {
            scanner.refine_scan(&criteria, previous)
        };

        info!(
            pid,
            data_type = %criteria.ty(),
            operator = %operator,
            refine = !previous.is_empty(),
            previous = previous.len(),
            hits = hits.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scan complete"
        );
        Ok(hits)
    }

    /// Write `value` at `address` in `pid`
    pub fn modify(&self, pid: ProcessId, address: Address, value: &TypedValue) -> MemoryResult<()> {
        let process = self.access.open(pid)?;
        MemoryWriter::new(&process).write_value(address, value)?;
        info!(pid, %address, data_type = %value.ty(), "memory modified");
        Ok(())
    }
}
