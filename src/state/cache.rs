//! Read cache with request de-duplication and stale-while-revalidate.
//!
//! Each key maps to one slot holding the last good value, the instant it was
//! fetched and the request currently in flight. Invalidation advances the
//! slot's generation; a response is only stored if the generation it started
//! under is still current, so answers that predate a write never land.

use crate::error::Result;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V>>>;

/// Cache key: resource kind plus the serialized query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: &'static str,
    query: String,
}

impl CacheKey {
    pub fn new(kind: &'static str, query: impl Into<String>) -> Self {
        Self {
            kind,
            query: query.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

struct InFlight<V> {
    generation: u64,
    request: SharedFetch<V>,
}

struct Slot<V> {
    value: Option<V>,
    fetched_at: Option<Instant>,
    invalidated: bool,
    generation: u64,
    in_flight: Option<InFlight<V>>,
}

impl<V> Slot<V> {
    fn empty() -> Self {
        Self {
            value: None,
            fetched_at: None,
            invalidated: false,
            generation: 0,
            in_flight: None,
        }
    }

    fn is_fresh(&self, now: Instant, stale_time: Duration) -> bool {
        !self.invalidated
            && self.value.is_some()
            && self
                .fetched_at
                .is_some_and(|at| now.saturating_duration_since(at) < stale_time)
    }
}

enum Plan<V> {
    Fresh(V),
    Join { stale: Option<V>, request: SharedFetch<V> },
    Start { stale: Option<V> },
}

enum Lookup<V> {
    Fresh(V),
    Stale { value: V, refresh: Option<SharedFetch<V>> },
    Wait(SharedFetch<V>),
}

/// Process-wide read cache for one value type
pub struct QueryCache<V> {
    slots: Arc<DashMap<CacheKey, Slot<V>>>,
    stale_time: Duration,
}

impl<V> Clone for QueryCache<V> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
            stale_time: self.stale_time,
        }
    }
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(stale_time: Duration) -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
            stale_time,
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Read through the cache.
    ///
    /// Fresh values are returned without calling `fetch`. Values older than
    /// the stale time are returned immediately while one background refresh
    /// runs. Missing or invalidated keys wait for a request, shared with any
    /// concurrent caller of the same key. `fetch` is called with no cache
    /// lock held.
    pub async fn fetch_with<F, Fut>(&self, key: CacheKey, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let now = Instant::now();

        let plan = {
            let slot = self.slots.entry(key.clone()).or_insert_with(Slot::empty);
            let fresh = slot.is_fresh(now, self.stale_time);
            let cached = if slot.invalidated {
                None
            } else {
                slot.value.clone()
            };

            match cached {
                Some(value) if fresh => Plan::Fresh(value),
                stale => match Self::current_request(&slot) {
                    Some(request) => Plan::Join { stale, request },
                    None => Plan::Start { stale },
                },
            }
        };

        let lookup = match plan {
            Plan::Fresh(value) => Lookup::Fresh(value),
            Plan::Join {
                stale: Some(value),
                ..
            } => Lookup::Stale {
                value,
                refresh: None,
            },
            Plan::Join {
                stale: None,
                request,
            } => Lookup::Wait(request),
            Plan::Start { stale } => {
                let (request, started) = self.install(&key, fetch());
                match stale {
                    Some(value) => Lookup::Stale {
                        value,
                        refresh: started.then_some(request),
                    },
                    None => Lookup::Wait(request),
                }
            }
        };

        match lookup {
            Lookup::Fresh(value) => {
                debug!(kind = key.kind(), query = key.query(), "Cache hit");
                Ok(value)
            }
            Lookup::Stale { value, refresh } => {
                debug!(kind = key.kind(), query = key.query(), "Serving stale entry");
                if let Some(request) = refresh {
                    tokio::spawn(async move {
                        let _ = request.await;
                    });
                }
                Ok(value)
            }
            Lookup::Wait(request) => {
                debug!(kind = key.kind(), query = key.query(), "Cache miss");
                request.await
            }
        }
    }

    /// Mark every entry of `kind` as untrustworthy; returns how many were marked
    pub fn invalidate_kind(&self, kind: &str) -> usize {
        let mut marked = 0;
        for mut slot in self.slots.iter_mut() {
            if slot.key().kind == kind {
                let slot = slot.value_mut();
                slot.invalidated = true;
                slot.generation += 1;
                marked += 1;
            }
        }

        debug!(kind, marked, "Invalidated cache entries");
        marked
    }

    /// Last stored value for a key, fresh or not
    pub fn peek(&self, key: &CacheKey) -> Option<V> {
        self.slots.get(key).and_then(|slot| slot.value.clone())
    }

    /// Whether a read of `key` would be served without a request
    pub fn is_fresh(&self, key: &CacheKey) -> bool {
        self.slots
            .get(key)
            .is_some_and(|slot| slot.is_fresh(Instant::now(), self.stale_time))
    }

    pub fn entry_count(&self) -> usize {
        self.slots.len()
    }

    /// Request in flight for the slot's current generation, if any
    fn current_request(slot: &Slot<V>) -> Option<SharedFetch<V>> {
        slot.in_flight
            .as_ref()
            .filter(|in_flight| in_flight.generation == slot.generation)
            .map(|in_flight| in_flight.request.clone())
    }

    /// Register `request` as the slot's in-flight read, unless another caller
    /// registered one since the lookup; returns the request to await and
    /// whether it is ours.
    fn install<Fut>(&self, key: &CacheKey, request: Fut) -> (SharedFetch<V>, bool)
    where
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let mut slot = self.slots.entry(key.clone()).or_insert_with(Slot::empty);
        if let Some(existing) = Self::current_request(&slot) {
            return (existing, false);
        }

        let generation = slot.generation;
        let slots = Arc::clone(&self.slots);
        let settle_key = key.clone();

        let request = async move {
            let result = request.await;
            Self::settle(&slots, &settle_key, generation, &result);
            result
        }
        .boxed()
        .shared();

        slot.in_flight = Some(InFlight {
            generation,
            request: request.clone(),
        });
        (request, true)
    }

    fn settle(slots: &DashMap<CacheKey, Slot<V>>, key: &CacheKey, generation: u64, result: &Result<V>) {
        let Some(mut slot) = slots.get_mut(key) else {
            return;
        };

        if slot
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.generation == generation)
        {
            slot.in_flight = None;
        }

        if slot.generation != generation {
            debug!(
                kind = key.kind(),
                query = key.query(),
                "Discarding response that predates invalidation"
            );
            return;
        }

        match result {
            Ok(value) => {
                slot.value = Some(value.clone());
                slot.fetched_at = Some(Instant::now());
                slot.invalidated = false;
            }
            Err(err) => {
                debug!(kind = key.kind(), query = key.query(), error = %err, "Read failed; entry left as is");
            }
        }
    }
}
