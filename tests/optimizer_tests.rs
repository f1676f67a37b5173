//! Large-codebase optimizer: mode threshold, batching and caches.

use meridian::config::{CacheConfig, OptimizerConfig};
use meridian::graph::BoundedCache;
use meridian::optimizer::ScanMode;
use meridian::{error_codes, CkgConfig, CkgError, FileInput, LargeCodebaseOptimizer};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

fn inputs(n: usize) -> Vec<FileInput> {
    (0..n)
        .map(|i| FileInput::with_content(format!("src/file{}.js", i), format!("export const v = {};\n", i)))
        .collect()
}

fn default_optimizer() -> LargeCodebaseOptimizer<usize> {
    let config = CkgConfig::default();
    LargeCodebaseOptimizer::new(config.optimizer, &config.cache)
}

fn index_of(input: &FileInput) -> usize {
    input
        .file_path
        .trim_start_matches("src/file")
        .trim_end_matches(".js")
        .parse()
        .unwrap()
}

#[test]
fn test_threshold_boundary_selects_mode() {
    let mut optimizer = default_optimizer();

    let below = optimizer.optimized_scan(inputs(999), |f| Ok(index_of(f)), |_| {});
    assert_eq!(below.stats.mode, ScanMode::Sequential);
    assert_eq!(below.results.len(), 999);

    optimizer.clear_cache();
    let at = optimizer.optimized_scan(inputs(1000), |f| Ok(index_of(f)), |_| {});
    assert_eq!(at.stats.mode, ScanMode::Parallel);
    assert_eq!(at.results, (0..1000).collect::<Vec<_>>());
    assert!(at.errors.is_empty());
}

#[test]
fn test_parallel_failures_do_not_stop_other_files() {
    let config = OptimizerConfig {
        parallel_threshold: 10,
        batch_size: 4,
        max_workers: Some(3),
        ..OptimizerConfig::default()
    };
    let mut optimizer: LargeCodebaseOptimizer<usize> = LargeCodebaseOptimizer::new(config, &CacheConfig::default());
    let outcome = optimizer.optimized_scan(
        inputs(20),
        |f| {
            let i = index_of(f);
            if i % 5 == 0 {
                Err(CkgError::parse_failure(f.path(), "synthetic"))
            } else {
                Ok(i)
            }
        },
        |_| {},
    );

    assert_eq!(outcome.stats.mode, ScanMode::Parallel);
    assert_eq!(outcome.results.len(), 16);
    assert_eq!(outcome.errors.len(), 4);
    assert!(outcome
        .errors
        .iter()
        .all(|e| e.code == error_codes::CKG_PARSE_001_PARSE_FAILURE));
    assert!(outcome.results.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_timed_out_batch_reported_per_file() {
    let config = OptimizerConfig {
        parallel_threshold: 1,
        batch_size: 2,
        max_workers: Some(2),
        timeout_per_file_ms: 50,
        ..OptimizerConfig::default()
    };
    let mut optimizer: LargeCodebaseOptimizer<usize> = LargeCodebaseOptimizer::new(config, &CacheConfig::default());
    let outcome = optimizer.optimized_scan(
        inputs(4),
        |f| {
            let i = index_of(f);
            if i == 0 {
                thread::sleep(Duration::from_millis(600));
            }
            Ok(i)
        },
        |_| {},
    );

    assert_eq!(outcome.stats.timed_out_batches, 1);
    assert_eq!(outcome.results, vec![2, 3]);
    let mut timed_out: Vec<&str> = outcome.errors.iter().map(|e| e.path.as_str()).collect();
    timed_out.sort();
    assert_eq!(timed_out, vec!["src/file0.js", "src/file1.js"]);
    assert!(outcome
        .errors
        .iter()
        .all(|e| e.code == error_codes::CKG_SCAN_001_BATCH_TIMEOUT));
}

#[test]
fn test_result_cache_skips_unchanged_files() {
    let mut optimizer = default_optimizer();
    let calls = AtomicUsize::new(0);
    let scan = |f: &FileInput| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(index_of(f))
    };

    optimizer.optimized_scan(inputs(10), scan, |_| {});
    let second = optimizer.optimized_scan(inputs(10), scan, |_| {});

    assert_eq!(calls.load(Ordering::SeqCst), 10);
    assert_eq!(second.stats.cached, 10);
    assert_eq!(second.results.len(), 10);
}

#[test]
fn test_symbol_cache_capacity_evicts_oldest() {
    let capacity = CacheConfig::default().symbol_capacity;
    assert_eq!(capacity, 10_000);

    let mut cache: BoundedCache<String, usize> = BoundedCache::new(capacity);
    for i in 0..=capacity {
        cache.put(format!("key{}", i), i);
    }

    assert_eq!(cache.len(), 10_000);
    assert!(!cache.contains(&"key0".to_string()));
    assert!(cache.contains(&"key1".to_string()));
    assert!(cache.contains(&format!("key{}", capacity)));
    assert_eq!(cache.stats().evictions, 1);
}
