//! Lazily populated metadata caches.

use crate::{
    ClusterError,
    config::TopicPreload,
    coordination::{CoordinationSession, Status, path},
    fetcher::ConcurrentFetcher,
    model::{Broker, Consumergroup, Topic},
    schema::{BROKER_IDS_PATH, CONSUMERS_PATH, TOPICS_PATH},
    types::BrokerId,
};
use log::debug;
use parking_lot::{Condvar, Mutex};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Population state of a single cache.
enum CacheState<T> {
    Unloaded,
    Loading,
    Loaded(Arc<T>),
}

struct Slot<T> {
    state: CacheState<T>,
    /// Bumped on every reset so a load that started before the reset never stores its result.
    generation: u64,
}

/// A value computed on first access and kept until `reset`.
///
/// The first caller to find the cache unloaded becomes the loader. Callers
/// arriving while it runs wait on a condition variable and then read the
/// stored value, so one population cycle serves everyone. A failed load
/// stores nothing and leaves the cache unloaded.
pub struct LazyCache<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> LazyCache<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                state: CacheState::Unloaded,
                generation: 0,
            }),
            ready: Condvar::new(),
        }
    }

    /// The stored value, without loading.
    pub fn get(&self) -> Option<Arc<T>> {
        match &self.slot.lock().state {
            CacheState::Loaded(value) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.get().is_some()
    }

    pub fn state_name(&self) -> &'static str {
        match self.slot.lock().state {
            CacheState::Unloaded => "unloaded",
            CacheState::Loading => "loading",
            CacheState::Loaded(_) => "loaded",
        }
    }

    /// Return the stored value, running `load` first if nothing is stored.
    pub fn get_or_try_load<F>(&self, load: F) -> Result<Arc<T>, ClusterError>
    where
        F: FnOnce() -> Result<T, ClusterError>,
    {
        let generation = {
            let mut slot = self.slot.lock();
            loop {
                if let CacheState::Loaded(value) = &slot.state {
                    return Ok(Arc::clone(value));
                }
                if matches!(slot.state, CacheState::Loading) {
                    self.ready.wait(&mut slot);
                    continue;
                }
                break;
            }
            slot.state = CacheState::Loading;
            slot.generation
        };

        let guard = LoadGuard {
            cache: self,
            generation,
        };
        let value = Arc::new(load()?);
        {
            let mut slot = self.slot.lock();
            if slot.generation == generation {
                slot.state = CacheState::Loaded(Arc::clone(&value));
            }
        }
        drop(guard);
        Ok(value)
    }

    /// Drop the stored value. The next access loads again.
    pub fn reset(&self) {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        slot.state = CacheState::Unloaded;
        drop(slot);
        self.ready.notify_all();
    }
}

impl<T> Default for LazyCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for LazyCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyCache")
            .field("state", &self.state_name())
            .finish()
    }
}

/// Releases waiters when a load finishes, and un-marks `Loading` if the loader
/// returned an error or panicked.
struct LoadGuard<'a, T> {
    cache: &'a LazyCache<T>,
    generation: u64,
}

impl<T> Drop for LoadGuard<'_, T> {
    fn drop(&mut self) {
        let mut slot = self.cache.slot.lock();
        if slot.generation == self.generation && matches!(slot.state, CacheState::Loading) {
            slot.state = CacheState::Unloaded;
        }
        drop(slot);
        self.cache.ready.notify_all();
    }
}

/// Broker, topic and consumer-group caches, each behind its own lock.
#[derive(Debug, Default)]
pub struct MetadataCache {
    brokers: LazyCache<BTreeMap<BrokerId, Broker>>,
    topics: LazyCache<BTreeMap<String, Topic>>,
    consumergroups: LazyCache<BTreeMap<String, Consumergroup>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn brokers(
        &self,
        session: &Arc<CoordinationSession>,
        fetcher: ConcurrentFetcher,
    ) -> Result<Arc<BTreeMap<BrokerId, Broker>>, ClusterError> {
        self.brokers
            .get_or_try_load(|| discover_brokers(session, fetcher))
    }

    /// Topics, running `preload` for each one during discovery. The selection
    /// only applies when this call populates the cache.
    pub fn topics(
        &self,
        session: &Arc<CoordinationSession>,
        fetcher: ConcurrentFetcher,
        preload: TopicPreload,
    ) -> Result<Arc<BTreeMap<String, Topic>>, ClusterError> {
        self.topics
            .get_or_try_load(|| discover_topics(session, fetcher, preload))
    }

    pub fn consumergroups(
        &self,
        session: &Arc<CoordinationSession>,
        fetcher: ConcurrentFetcher,
    ) -> Result<Arc<BTreeMap<String, Consumergroup>>, ClusterError> {
        self.consumergroups
            .get_or_try_load(|| discover_consumergroups(session, fetcher))
    }

    /// Which caches currently hold a value: (brokers, topics, consumer groups).
    pub fn loaded(&self) -> (bool, bool, bool) {
        (
            self.brokers.is_loaded(),
            self.topics.is_loaded(),
            self.consumergroups.is_loaded(),
        )
    }

    pub fn reset(&self) {
        self.brokers.reset();
        self.topics.reset();
        self.consumergroups.reset();
        debug!("Metadata caches reset");
    }
}

/// Children of `parent`, with an absent parent mapped through `on_missing`.
fn list_names(
    session: &CoordinationSession,
    parent: &str,
    on_missing: impl FnOnce() -> ClusterError,
) -> Result<Vec<String>, ClusterError> {
    let reply = session.list_children(parent)?;
    match reply.status {
        Status::Ok => Ok(reply.data),
        Status::NoNode => Err(on_missing()),
        status => Err(ClusterError::operation(parent, status)),
    }
}

fn discover_brokers(
    session: &Arc<CoordinationSession>,
    fetcher: ConcurrentFetcher,
) -> Result<BTreeMap<BrokerId, Broker>, ClusterError> {
    let names = list_names(session, BROKER_IDS_PATH, || ClusterError::Configuration {
        address: session.address().to_string(),
        reason: format!("no cluster registered ({BROKER_IDS_PATH} does not exist)"),
    })?;
    let ids = names
        .iter()
        .map(|name| {
            name.parse::<BrokerId>().map_err(|reason| ClusterError::InvalidPayload {
                path: path::join(BROKER_IDS_PATH, name),
                reason,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Discovering {} brokers", ids.len());
    fetcher.fetch(ids, |id| Broker::fetch(session, *id))
}

fn discover_topics(
    session: &Arc<CoordinationSession>,
    fetcher: ConcurrentFetcher,
    preload: TopicPreload,
) -> Result<BTreeMap<String, Topic>, ClusterError> {
    let names = list_names(session, TOPICS_PATH, || {
        ClusterError::operation(TOPICS_PATH, Status::NoNode)
    })?;

    debug!("Discovering {} topics with preload {preload:?}", names.len());
    fetcher.fetch(names, |name| {
        Topic::load(name.clone(), session, fetcher, preload)
    })
}

fn discover_consumergroups(
    session: &Arc<CoordinationSession>,
    fetcher: ConcurrentFetcher,
) -> Result<BTreeMap<String, Consumergroup>, ClusterError> {
    let names = list_names(session, CONSUMERS_PATH, || {
        ClusterError::operation(CONSUMERS_PATH, Status::NoNode)
    })?;

    debug!("Discovering {} consumer groups", names.len());
    fetcher.fetch(names, |name| Ok(Consumergroup::new(name.clone(), session, fetcher)))
}
