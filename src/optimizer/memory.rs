//! Advisory resident-memory watchdog.
//!
//! Samples the process RSS from `/proc/self/statm`. Crossing the limit logs
//! a warning; nothing is freed or throttled. On platforms without procfs
//! sampling returns `None` and the watchdog stays silent.

use std::fs;

const PAGE_SIZE: u64 = 4096;

#[derive(Debug, Clone)]
pub struct MemoryWatchdog {
    limit_bytes: u64,
    over_limit: bool,
    peak_bytes: u64,
}

impl MemoryWatchdog {
    pub fn new(limit_mb: u64) -> Self {
        Self {
            limit_bytes: limit_mb.saturating_mul(1024 * 1024),
            over_limit: false,
            peak_bytes: 0,
        }
    }

    /// Current resident set size in bytes.
    pub fn sample() -> Option<u64> {
        let statm = fs::read_to_string("/proc/self/statm").ok()?;
        parse_statm(&statm)
    }

    /// Sample and warn when the limit is first crossed. Returns the sampled
    /// RSS while over the limit.
    pub fn check(&mut self) -> Option<u64> {
        let rss = Self::sample()?;
        self.observe(rss)
    }

    pub fn peak_bytes(&self) -> u64 {
        self.peak_bytes
    }

    fn observe(&mut self, rss: u64) -> Option<u64> {
        self.peak_bytes = self.peak_bytes.max(rss);
        if rss <= self.limit_bytes {
            self.over_limit = false;
            return None;
        }
        if !self.over_limit {
            tracing::warn!(
                rss_mb = rss / (1024 * 1024),
                limit_mb = self.limit_bytes / (1024 * 1024),
                "memory usage above configured limit"
            );
            self.over_limit = true;
        }
        Some(rss)
    }
}

/// Resident pages (second field) times the page size.
fn parse_statm(statm: &str) -> Option<u64> {
    let resident: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    Some(resident * PAGE_SIZE)
}
