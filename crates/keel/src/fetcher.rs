//! Fan-out/join over a set of names with fail-fast error handling.

use crate::ClusterError;
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Default upper bound on worker threads per batch.
pub const DEFAULT_FETCH_WORKERS: usize = 16;

/// Runs one unit of work per item on a bounded set of scoped worker threads.
///
/// Every call blocks until all workers have joined. The first error any unit
/// reports is returned; units that have not started yet are skipped and the
/// results of units that already finished are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrentFetcher {
    workers: usize,
}

impl ConcurrentFetcher {
    /// A fetcher running at most `workers` units at once (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Build one value per key concurrently and collect them into a map.
    ///
    /// On success the map's key set is exactly the (deduplicated) input key set.
    pub fn fetch<K, V, F>(&self, keys: Vec<K>, build: F) -> Result<BTreeMap<K, V>, ClusterError>
    where
        K: Ord + Clone + Send,
        V: Send,
        F: Fn(&K) -> Result<V, ClusterError> + Sync,
    {
        let merged = Mutex::new(BTreeMap::new());
        self.run(keys, |key| {
            let value = build(&key)?;
            merged.lock().insert(key, value);
            Ok(())
        })?;
        Ok(merged.into_inner())
    }

    /// Run `unit` once per item, joining on all of them.
    pub fn for_each<K, F>(&self, items: Vec<K>, unit: F) -> Result<(), ClusterError>
    where
        K: Send,
        F: Fn(&K) -> Result<(), ClusterError> + Sync,
    {
        self.run(items, |item| unit(&item))
    }

    fn run<K, F>(&self, items: Vec<K>, unit: F) -> Result<(), ClusterError>
    where
        K: Send,
        F: Fn(K) -> Result<(), ClusterError> + Sync,
    {
        if items.is_empty() {
            return Ok(());
        }

        let total = items.len();
        let worker_count = self.workers.min(total);
        debug!("Fanning out {total} units over {worker_count} workers");

        let queue = Mutex::new(items.into_iter());
        let failed = AtomicBool::new(false);
        let first_error: Mutex<Option<ClusterError>> = Mutex::new(None);

        thread::scope(|scope| {
            for _ in 0..worker_count {
                scope.spawn(|| {
                    while !failed.load(Ordering::Acquire) {
                        let Some(item) = queue.lock().next() else {
                            break;
                        };
                        if let Err(e) = unit(item) {
                            failed.store(true, Ordering::Release);
                            let mut slot = first_error.lock();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                        }
                    }
                });
            }
        });

        match first_error.into_inner() {
            Some(e) => {
                warn!("Fan-out of {total} units aborted: {e}");
                Err(e)
            }
            None => Ok(()),
        }
    }
}

impl Default for ConcurrentFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_WORKERS)
    }
}
