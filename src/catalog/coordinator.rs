//! Single-flight execution and download coordination.
//!
//! Concurrent requests for the same key share one execution: the first
//! caller spawns the work onto the runtime, later callers await the same
//! shared future. The work runs to completion even if every caller is
//! dropped, so a half-written file is never abandoned mid-download.

use std::{fmt::Display, future::Future, hash::Hash, path::PathBuf, sync::{Arc, atomic::{AtomicU64, Ordering}}};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info};

use super::{Catalog, DatasetDescriptor, DatasetKey};
use crate::error::{Error, Result};

type Flight<V> = Shared<BoxFuture<'static, Result<V>>>;

/// Counters for monitoring coalescing effectiveness.
#[derive(Debug, Default)]
struct Counters {
    total: AtomicU64,
    coalesced: AtomicU64,
    started: AtomicU64,
}

/// Snapshot of single-flight statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlightStats {
    /// Total requests received
    pub total_requests: u64,
    /// Requests that joined an in-flight execution
    pub coalesced_requests: u64,
    /// Requests that started new work
    pub new_requests: u64,
}

impl FlightStats {
    /// Returns the coalescing ratio (0.0 to 1.0)
    pub fn coalescing_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.coalesced_requests as f64 / self.total_requests as f64
        }
    }
}

/// At most one in-flight execution per key; every concurrent caller gets a
/// clone of the same result, success or error.
pub struct SingleFlight<K, V> {
    in_flight: Arc<DashMap<K, Flight<V>>>,
    counters: Arc<Counters>,
}

impl<K, V> Clone for SingleFlight<K, V> {
    fn clone(&self) -> Self {
        Self { in_flight: Arc::clone(&self.in_flight), counters: Arc::clone(&self.counters) }
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self { in_flight: Arc::new(DashMap::new()), counters: Arc::new(Counters::default()) }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self { Self::default() }

    /// Run `work` for `key`, or join the execution already in flight.
    ///
    /// `work` is only invoked when this call starts a new execution. Must be
    /// called from within a tokio runtime.
    pub async fn run<F, Fut>(&self, key: K, work: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        self.counters.total.fetch_add(1, Ordering::Relaxed);

        let flight = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => {
                let coalesced = self.counters.coalesced.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(key = %key, coalesced, "Coalescing request - joining in-flight work");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                self.counters.started.fetch_add(1, Ordering::Relaxed);
                let in_flight = Arc::clone(&self.in_flight);
                let task_key = key.clone();
                let work = work();
                let handle = tokio::spawn(async move {
                    let result = work.await;
                    in_flight.remove(&task_key);
                    result
                });
                let flight = async move {
                    handle.await.unwrap_or_else(|err| Err(Error::Data(format!("background task failed: {err}"))))
                }
                .boxed()
                .shared();
                entry.insert(flight.clone());
                debug!(key = %key, in_flight = self.in_flight.len(), "New request - starting work");
                flight
            }
        };
        flight.await
    }

    /// Whether an execution for `key` is currently running.
    pub fn is_in_flight(&self, key: &K) -> bool { self.in_flight.contains_key(key) }

    /// Number of executions currently running.
    pub fn in_flight_count(&self) -> usize { self.in_flight.len() }

    /// Returns a snapshot of the current statistics.
    pub fn stats(&self) -> FlightStats {
        FlightStats {
            total_requests: self.counters.total.load(Ordering::Relaxed),
            coalesced_requests: self.counters.coalesced.load(Ordering::Relaxed),
            new_requests: self.counters.started.load(Ordering::Relaxed),
        }
    }
}

/// Output of a dataset fetch: where the file landed and where it came from.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub path: PathBuf,
    pub source_url: String,
}

/// Ensures each dataset is downloaded at most once at a time and registered
/// in the catalog when it lands.
#[derive(Clone)]
pub struct DownloadCoordinator {
    catalog: Arc<Catalog>,
    flights: SingleFlight<DatasetKey, PathBuf>,
}

impl DownloadCoordinator {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog, flights: SingleFlight::new() }
    }

    pub fn catalog(&self) -> &Arc<Catalog> { &self.catalog }

    /// Path of `key`, fetching it first if the catalog doesn't have it.
    ///
    /// Concurrent calls for the same key share a single `fetch`; its error,
    /// if any, is returned to every caller and nothing is registered.
    pub async fn ensure<F, Fut>(&self, key: DatasetKey, fetch: F) -> Result<PathBuf>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Fetched>> + Send + 'static,
    {
        if let Some(path) = self.catalog.get_path(&key) {
            return Ok(path);
        }

        let catalog = Arc::clone(&self.catalog);
        let task_key = key.clone();
        self.flights.run(key, move || async move {
            // Another flight may have finished between the check above and now.
            if let Some(path) = catalog.get_path(&task_key) {
                return Ok(path);
            }
            info!(key = %task_key, "Fetching dataset");
            let fetched = fetch().await?;
            let descriptor = tokio::task::spawn_blocking({
                let key = task_key.clone();
                move || DatasetDescriptor::for_file(&key, &fetched.path, fetched.source_url)
            })
            .await
            .map_err(|err| Error::Data(format!("hashing task failed: {err}")))??;
            let path = descriptor.file_path.clone();
            catalog.register(descriptor)?;
            info!(key = %task_key, path = %path.display(), "Dataset ready");
            Ok(path)
        }).await
    }

    /// Whether `key` is currently being fetched.
    pub fn is_pending(&self, key: &DatasetKey) -> bool { self.flights.is_in_flight(key) }

    pub fn stats(&self) -> FlightStats { self.flights.stats() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use crate::catalog::DatasetKind;

    #[tokio::test]
    async fn concurrent_runs_share_one_execution() {
        let flights: SingleFlight<String, u32> = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks = (0..8).map(|_| {
            let flights = flights.clone();
            let calls = Arc::clone(&calls);
            async move {
                flights.run("06".to_string(), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(42)
                }).await
            }
        });
        let results = futures::future::join_all(tasks).await;

        assert!(results.iter().all(|r| matches!(r, Ok(42))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = flights.stats();
        assert_eq!((stats.total_requests, stats.new_requests, stats.coalesced_requests), (8, 1, 7));
        assert!((stats.coalescing_ratio() - 7.0 / 8.0).abs() < 1e-9);
        assert_eq!(flights.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn error_reaches_every_waiter_and_clears_entry() {
        let flights: SingleFlight<String, u32> = SingleFlight::new();
        let fail = || async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Err(Error::download("https://example.test/x.zip", 404, "Not Found"))
        };
        let (a, b) = tokio::join!(flights.run("x".into(), fail), flights.run("x".into(), fail));
        assert_eq!(a.unwrap_err().status(), Some(404));
        assert_eq!(b.unwrap_err().status(), Some(404));
        assert!(!flights.is_in_flight(&"x".to_string()));

        // A later request starts fresh work.
        assert_eq!(flights.run("x".into(), || async { Ok(1) }).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn dropped_caller_does_not_cancel_work() {
        let flights: SingleFlight<String, u32> = SingleFlight::new();
        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        let first = flights.run("k".into(), move || async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        });
        // Poll once so the work is spawned, then drop the caller.
        let _ = tokio::time::timeout(Duration::from_millis(1), first).await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ensure_registers_once_and_then_hits_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(Catalog::open(dir.path().join("catalog.json")));
        let coordinator = DownloadCoordinator::new(Arc::clone(&catalog));
        let key = DatasetKey::state(DatasetKind::Pl94171, "06");
        let calls = Arc::new(AtomicUsize::new(0));

        let fetch = |calls: Arc<AtomicUsize>, target: PathBuf| move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            std::fs::write(&target, b"parquet").map_err(Error::from)?;
            Ok(Fetched { path: target, source_url: "https://example.test/06.zip".into() })
        };
        let target = dir.path().join("06.parquet");
        let (a, b) = tokio::join!(
            coordinator.ensure(key.clone(), fetch(Arc::clone(&calls), target.clone())),
            coordinator.ensure(key.clone(), fetch(Arc::clone(&calls), target.clone())),
        );
        assert_eq!(a.unwrap(), target);
        assert_eq!(b.unwrap(), target);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(catalog.is_available(&key));

        coordinator.ensure(key, fetch(Arc::clone(&calls), target)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_fetch_registers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(Catalog::open(dir.path().join("catalog.json")));
        let coordinator = DownloadCoordinator::new(Arc::clone(&catalog));
        let key = DatasetKey::state(DatasetKind::Blocks, "72");
        let err = coordinator
            .ensure(key.clone(), || async { Err(Error::download("https://example.test", 0, "connection refused")) })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(0));
        assert!(catalog.get_info(&key).is_none());
        assert!(!coordinator.is_pending(&key));
    }
}
