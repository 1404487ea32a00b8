//! Stress tests for blob stores.
//!
//! These helpers drive one store from several threads at once.

use crate::fixtures::{deployment, Deployment};
use blobstore_storage::BlobStore;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Operation tally of one stress run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StressReport {
    /// Store, load and delete calls made.
    pub operations: usize,
    /// Calls that failed or returned the wrong record.
    pub failures: usize,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
}

impl StressReport {
    fn from_counts(successful: AtomicUsize, failed: AtomicUsize, elapsed: Duration) -> Self {
        let failures = failed.into_inner();
        Self {
            operations: successful.into_inner() + failures,
            failures,
            elapsed,
        }
    }
}

impl fmt::Display for StressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} operations, {} failed, in {:?}",
            self.operations, self.failures, self.elapsed
        )
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Operations performed by each thread.
    pub operations_per_thread: usize,
    /// Number of concurrent threads.
    pub threads: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations_per_thread: 50,
            threads: 4,
        }
    }
}

/// Each thread stores, loads and (every other time) deletes its own keys.
///
/// Every operation is expected to succeed; a load that returns a different
/// record than was just stored counts as a failure. Keys that were not
/// deleted stay in the store.
pub fn stress_distinct_keys(
    store: &dyn BlobStore<Deployment>,
    config: &StressConfig,
) -> StressReport {
    let successful = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let start = Instant::now();

    thread::scope(|scope| {
        for t in 0..config.threads {
            let (successful, failed) = (&successful, &failed);
            scope.spawn(move || {
                let tally = |ok: bool| {
                    let counter = if ok { successful } else { failed };
                    counter.fetch_add(1, Ordering::Relaxed);
                };

                for i in 0..config.operations_per_thread {
                    let key = format!("t{t}-k{i}");
                    let record = deployment(&key, "GCP");

                    tally(store.store(&key, &record).is_ok());
                    tally(store.load(&key).is_ok_and(|loaded| loaded == record));
                    if i % 2 == 0 {
                        tally(store.delete(&key).is_ok());
                    }
                }
            });
        }
    });

    StressReport::from_counts(successful, failed, start.elapsed())
}

/// All threads overwrite and read one shared key.
///
/// Every load must decode to one of the records some thread wrote; a torn
/// or undecodable record counts as a failure. Write failures are counted
/// too, so backends whose writes race (check-then-write) show them here.
pub fn stress_shared_key(
    store: &dyn BlobStore<Deployment>,
    config: &StressConfig,
) -> StressReport {
    let successful = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let start = Instant::now();

    thread::scope(|scope| {
        for t in 0..config.threads {
            let (successful, failed) = (&successful, &failed);
            scope.spawn(move || {
                let tally = |ok: bool| {
                    let counter = if ok { successful } else { failed };
                    counter.fetch_add(1, Ordering::Relaxed);
                };
                let own = deployment(&format!("writer-{t}"), &"x".repeat(t * 700));

                for _ in 0..config.operations_per_thread {
                    tally(store.store("shared", &own).is_ok());
                    tally(
                        store
                            .load("shared")
                            .is_ok_and(|loaded| loaded.name.starts_with("writer-")
                                && loaded.kind.chars().all(|c| c == 'x')),
                    );
                }
            });
        }
    });

    StressReport::from_counts(successful, failed, start.elapsed())
}
