//! Large-codebase scanning: sequential below a file-count threshold, a
//! batched worker pool at or above it, with a result cache in front.
//!
//! Results come back in input order regardless of which path ran or in
//! what order batches completed. File failures, timed-out batches and
//! worker panics are collected as [`FileError`]s next to the results.

pub mod memory;
pub mod pool;

pub use memory::MemoryWatchdog;
pub use pool::{BatchResult, WorkerPool};

use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crate::config::{CacheConfig, OptimizerConfig};
use crate::error::{CkgError, FileError, Result};
use crate::graph::cache::{BoundedCache, CacheStats};
use crate::input::FileInput;

/// Progress callback payload. `processed` counts completed files.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProgress {
    /// 0.0..=100.0
    pub progress: f64,
    pub processed: usize,
    pub total: usize,
    pub current_file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Sequential,
    Parallel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    pub mode: ScanMode,
    pub total: usize,
    pub scanned: usize,
    pub cached: usize,
    pub failed: usize,
    pub timed_out_batches: usize,
    pub failed_batches: usize,
    pub duration_ms: u64,
    pub cache: CacheStats,
}

#[derive(Debug)]
pub struct ScanOutcome<T> {
    /// Successful results in input order
    pub results: Vec<T>,
    pub errors: Vec<FileError>,
    pub stats: ScanStats,
}

/// Result cache keyed by `(path, version key)`.
pub type ResultCache<T> = BoundedCache<(String, String), T>;

#[derive(Debug)]
pub struct LargeCodebaseOptimizer<T> {
    config: OptimizerConfig,
    cache: ResultCache<T>,
    watchdog: MemoryWatchdog,
}

impl<T: Clone + Send> LargeCodebaseOptimizer<T> {
    pub fn new(config: OptimizerConfig, cache: &CacheConfig) -> Self {
        Self {
            watchdog: MemoryWatchdog::new(config.memory_limit_mb),
            cache: BoundedCache::new(cache.result_capacity),
            config,
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn mode_for(&self, file_count: usize) -> ScanMode {
        if file_count < self.config.parallel_threshold {
            ScanMode::Sequential
        } else {
            ScanMode::Parallel
        }
    }

    /// Scan `files`, serving unchanged ones from the cache.
    pub fn optimized_scan<F, P>(&mut self, files: Vec<FileInput>, scanner: F, mut on_progress: P) -> ScanOutcome<T>
    where
        F: Fn(&FileInput) -> Result<T> + Sync,
        P: FnMut(&ScanProgress),
    {
        let started = Instant::now();
        let total = files.len();
        let mode = self.mode_for(total);
        let keys: Vec<(String, String)> = files.iter().map(|f| (f.file_path.clone(), f.version_key())).collect();

        let mut slots: Vec<Option<T>> = Vec::with_capacity(total);
        let mut pending = Vec::new();
        for (index, key) in keys.iter().enumerate() {
            let hit = if self.config.enable_cache {
                self.cache.get(key).cloned()
            } else {
                None
            };
            if hit.is_none() {
                pending.push(index);
            }
            slots.push(hit);
        }
        let cached = total - pending.len();

        let mut progress = Progress {
            processed: cached,
            total,
            callback: &mut on_progress,
        };
        if cached > 0 {
            progress.report(None);
        }

        let mut errors = Vec::new();
        let mut timed_out_batches = 0;
        let mut failed_batches = 0;
        let mut fresh: Vec<(usize, T)> = Vec::new();

        match mode {
            ScanMode::Sequential => {
                for &index in &pending {
                    let input = &files[index];
                    match catch_unwind(AssertUnwindSafe(|| scanner(input))) {
                        Ok(Ok(value)) => fresh.push((index, value)),
                        Ok(Err(e)) => {
                            tracing::warn!(path = %input.file_path, error = %e, "skipping file");
                            errors.push(FileError::from_error(input.file_path.clone(), &e));
                        }
                        Err(payload) => {
                            let err = CkgError::WorkerError {
                                worker: 0,
                                message: pool::panic_message(payload.as_ref()),
                            };
                            tracing::error!(path = %input.file_path, error = %err, "scanner panicked");
                            errors.push(FileError::from_error(input.file_path.clone(), &err));
                        }
                    }
                    progress.processed += 1;
                    progress.report(Some(&input.file_path));
                    if progress.processed % self.config.batch_size.max(1) == 0 {
                        self.watchdog.check();
                    }
                }
            }
            ScanMode::Parallel => {
                let pool = WorkerPool::new(
                    self.config.worker_count(),
                    self.config.batch_size,
                    Duration::from_millis(self.config.timeout_per_file_ms),
                );
                tracing::info!(
                    files = pending.len(),
                    workers = pool.workers(),
                    batch_size = self.config.batch_size,
                    "parallel scan"
                );
                let watchdog = &mut self.watchdog;
                pool.run(&files, &pending, &scanner, |result| match result {
                    BatchResult::Completed {
                        files: members,
                        results,
                        errors: batch_errors,
                        ..
                    } => {
                        let last = members.last().map(|&i| files[i].file_path.as_str());
                        fresh.extend(results);
                        errors.extend(batch_errors);
                        progress.processed += members.len();
                        progress.report(last);
                        watchdog.check();
                    }
                    BatchResult::TimedOut { batch, files: members, elapsed } => {
                        timed_out_batches += 1;
                        let err = CkgError::BatchTimeout { batch, elapsed };
                        errors.extend(members.iter().map(|&i| FileError::from_error(files[i].file_path.clone(), &err)));
                    }
                    BatchResult::Failed {
                        batch,
                        worker,
                        files: members,
                        message,
                    } => {
                        failed_batches += 1;
                        let err = CkgError::WorkerError {
                            worker,
                            message: format!("batch {}: {}", batch, message),
                        };
                        errors.extend(members.iter().map(|&i| FileError::from_error(files[i].file_path.clone(), &err)));
                    }
                });
            }
        }

        let scanned = fresh.len();
        for (index, value) in fresh {
            if self.config.enable_cache {
                self.cache.put(keys[index].clone(), value.clone());
            }
            slots[index] = Some(value);
        }

        let failed = errors.len();
        let stats = ScanStats {
            mode,
            total,
            scanned,
            cached,
            failed,
            timed_out_batches,
            failed_batches,
            duration_ms: started.elapsed().as_millis() as u64,
            cache: self.cache.stats(),
        };
        tracing::debug!(?stats, "scan finished");

        ScanOutcome {
            results: slots.into_iter().flatten().collect(),
            errors,
            stats,
        }
    }
}

struct Progress<'a> {
    processed: usize,
    total: usize,
    callback: &'a mut dyn FnMut(&ScanProgress),
}

impl Progress<'_> {
    fn report(&mut self, current_file: Option<&str>) {
        let progress = if self.total == 0 {
            100.0
        } else {
            self.processed as f64 * 100.0 / self.total as f64
        };
        (self.callback)(&ScanProgress {
            progress,
            processed: self.processed,
            total: self.total,
            current_file: current_file.map(|s| s.to_string()),
        });
    }
}
