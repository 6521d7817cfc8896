//! # Handler Cache
//!
//! Keyed cache of handler instances with shared-instance aware disposal.
//!
//! ## Overview
//!
//! Each [`HandlerKey`] maps to at most one handler. A creation strategy may
//! hand back the same `Arc` for several keys (pooled handlers), so release
//! only disposes an instance once no remaining key refers to it.
//!
//! ## Locking
//!
//! One `parking_lot::Mutex` guards the map. `get` holds it across
//! check, create and insert; `release` holds it across removal, the
//! containment scan and `dispose`. Creation strategies and `dispose`
//! implementations must therefore not call back into the same cache.
//!
//! ## Usage
//!
//! ```rust
//! use module_handler_cache::registry::{Handler, HandlerCache, HandlerKey, ReleaseOutcome};
//! use module_handler_cache::{HandlerCacheError, Result};
//! use std::sync::Arc;
//!
//! struct Timer;
//!
//! impl Handler for Timer {
//!     fn dispose(&self) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> std::result::Result<(), HandlerCacheError> {
//! let cache: HandlerCache<Timer> = HandlerCache::new();
//! let key = HandlerKey::new("rule-1", "trigger-1");
//!
//! let handler = cache
//!     .get(&key, |_| Ok::<_, HandlerCacheError>(Some(Arc::new(Timer))))?
//!     .expect("timer handlers are always supported");
//!
//! assert_eq!(cache.release(&key, &handler)?, ReleaseOutcome::Disposed);
//! # Ok(())
//! # }
//! ```

use super::handler::{instance_id, same_instance, Handler};
use super::handler_key::HandlerKey;
use crate::config::CacheConfig;
use crate::error::{HandlerCacheError, Result};
use crate::logging::{log_cache_operation, log_error};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a call to [`HandlerCache::release`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The handler was not the cached value for the key; nothing changed
    Ignored,
    /// The key was removed but another key still holds the instance
    Detached,
    /// The key was removed and the instance disposed
    Disposed,
}

/// Statistics about the handler cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerCacheStats {
    pub cached_keys: usize,
    pub distinct_handlers: usize,
    pub hits: u64,
    pub misses: u64,
    pub created: u64,
    pub unsupported: u64,
    pub disposed: u64,
}

#[derive(Debug, Default, Clone, Copy)]
struct CacheCounters {
    hits: u64,
    misses: u64,
    created: u64,
    unsupported: u64,
    disposed: u64,
}

struct CacheState<H: ?Sized> {
    entries: HashMap<HandlerKey, Arc<H>>,
    counters: CacheCounters,
}

/// Cache of handler instances keyed by `(owner_id, target_id)`
pub struct HandlerCache<H: ?Sized> {
    state: Mutex<CacheState<H>>,
}

impl<H: Handler + ?Sized> HandlerCache<H> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a cache pre-sized from configuration
    pub fn with_config(config: &CacheConfig) -> Self {
        Self::with_capacity(config.initial_capacity)
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::with_capacity(capacity),
                counters: CacheCounters::default(),
            }),
        }
    }

    /// Return the cached handler for `key`, creating it on a miss
    ///
    /// `create` runs only on a miss. `Ok(None)` from `create` means the request
    /// is unsupported: `None` is returned and nothing is cached. Errors from
    /// `create` are returned unchanged and nothing is cached.
    pub fn get<F, E>(&self, key: &HandlerKey, create: F) -> std::result::Result<Option<Arc<H>>, E>
    where
        F: FnOnce(&HandlerKey) -> std::result::Result<Option<Arc<H>>, E>,
        E: From<HandlerCacheError>,
    {
        key.validate()?;

        let mut state = self.state.lock();
        if let Some(cached) = state.entries.get(key) {
            let handler = Arc::clone(cached);
            state.counters.hits += 1;
            debug!(key = %key, "Returning cached handler");
            return Ok(Some(handler));
        }

        state.counters.misses += 1;
        match create(key)? {
            Some(handler) => {
                state.entries.insert(key.clone(), Arc::clone(&handler));
                state.counters.created += 1;
                info!(key = %key, cached_keys = state.entries.len(), "Created and cached new handler");
                Ok(Some(handler))
            }
            None => {
                state.counters.unsupported += 1;
                debug!(key = %key, "No handler available for request");
                Ok(None)
            }
        }
    }

    /// Release `key`'s reference to `handler`
    ///
    /// A handler that is not the cached value for `key` is ignored. Otherwise
    /// the key is removed and the handler disposed unless another key still
    /// maps to the same instance. The key stays removed if `dispose` fails.
    pub fn release(&self, key: &HandlerKey, handler: &Arc<H>) -> Result<ReleaseOutcome> {
        key.validate()?;

        let mut state = self.state.lock();
        let is_current = state
            .entries
            .get(key)
            .is_some_and(|cached| same_instance(cached, handler));
        if !is_current {
            debug!(key = %key, "Ignoring release of handler that is not cached for key");
            return Ok(ReleaseOutcome::Ignored);
        }

        state.entries.remove(key);
        if state
            .entries
            .values()
            .any(|other| same_instance(other, handler))
        {
            debug!(key = %key, "Handler still referenced by another key");
            return Ok(ReleaseOutcome::Detached);
        }

        handler.dispose().map_err(|e| dispose_failure(key, e))?;
        state.counters.disposed += 1;
        info!(key = %key, "Released and disposed handler");
        Ok(ReleaseOutcome::Disposed)
    }

    /// Dispose every distinct cached handler once and clear the cache
    ///
    /// A failing `dispose` does not stop the teardown: every other instance
    /// still gets its attempt, then the failures are returned together as
    /// [`HandlerCacheError::TeardownFailed`]. The cache is empty afterwards
    /// either way. Returns the number of instances disposed successfully.
    pub fn dispose_all(&self) -> Result<usize> {
        let mut state = self.state.lock();
        let entries: Vec<(HandlerKey, Arc<H>)> = state.entries.drain().collect();

        let mut seen = HashSet::with_capacity(entries.len());
        let mut disposed = 0usize;
        let mut failures = Vec::new();

        for (key, handler) in entries {
            if !seen.insert(instance_id(&handler)) {
                continue;
            }

            match handler.dispose() {
                Ok(()) => disposed += 1,
                Err(e) => {
                    let failure = dispose_failure(&key, e);
                    warn!(key = %key, error = %failure, "Handler dispose failed during teardown");
                    failures.push(failure);
                }
            }
        }

        state.counters.disposed += disposed as u64;
        drop(state);

        let details = format!("disposed={disposed} failed={}", failures.len());
        if failures.is_empty() {
            log_cache_operation("dispose_all", None, None, "completed", Some(&details));
            Ok(disposed)
        } else {
            let error = HandlerCacheError::TeardownFailed(failures);
            log_error("HandlerCache", "dispose_all", &error.to_string(), Some(&details));
            Err(error)
        }
    }

    /// Read-only snapshot of the cached entries, ordered by key
    pub fn handlers(&self) -> Vec<(HandlerKey, Arc<H>)> {
        let state = self.state.lock();
        let mut snapshot: Vec<_> = state
            .entries
            .iter()
            .map(|(key, handler)| (key.clone(), Arc::clone(handler)))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot
    }

    pub fn contains_key(&self, key: &HandlerKey) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> HandlerCacheStats {
        let state = self.state.lock();
        let distinct: HashSet<usize> = state.entries.values().map(instance_id).collect();
        HandlerCacheStats {
            cached_keys: state.entries.len(),
            distinct_handlers: distinct.len(),
            hits: state.counters.hits,
            misses: state.counters.misses,
            created: state.counters.created,
            unsupported: state.counters.unsupported,
            disposed: state.counters.disposed,
        }
    }
}

impl<H: Handler + ?Sized> Default for HandlerCache<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized> std::fmt::Debug for HandlerCache<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("HandlerCache")
            .field("cached_keys", &state.entries.len())
            .field("counters", &state.counters)
            .finish()
    }
}

fn dispose_failure(key: &HandlerKey, error: HandlerCacheError) -> HandlerCacheError {
    match error {
        failure @ HandlerCacheError::DisposeFailed { .. } => failure,
        other => HandlerCacheError::dispose_failed(key.to_string(), other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHandler {
        disposals: AtomicUsize,
    }

    impl CountingHandler {
        fn disposals(&self) -> usize {
            self.disposals.load(Ordering::SeqCst)
        }
    }

    impl Handler for CountingHandler {
        fn dispose(&self) -> Result<()> {
            self.disposals.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingHandler;

    impl Handler for FailingHandler {
        fn dispose(&self) -> Result<()> {
            Err(HandlerCacheError::InvalidState("connection already closed".to_string()))
        }
    }

    fn create_counting(_: &HandlerKey) -> Result<Option<Arc<CountingHandler>>> {
        Ok(Some(Arc::new(CountingHandler::default())))
    }

    #[test]
    fn test_get_caches_on_miss() {
        let cache = HandlerCache::new();
        let key = HandlerKey::new("rule-1", "trigger-1");
        let calls = AtomicUsize::new(0);

        let first = cache
            .get(&key, |k| {
                calls.fetch_add(1, Ordering::SeqCst);
                create_counting(k)
            })
            .unwrap()
            .unwrap();
        let second = cache
            .get(&key, |k| {
                calls.fetch_add(1, Ordering::SeqCst);
                create_counting(k)
            })
            .unwrap()
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.created, 1);
    }

    #[test]
    fn test_invalid_key_rejected_before_create() {
        let cache: HandlerCache<CountingHandler> = HandlerCache::new();
        let key = HandlerKey::new("", "trigger-1");

        let result = cache.get(&key, |_| -> Result<_> {
            panic!("create must not run for a malformed key")
        });

        assert!(matches!(result, Err(HandlerCacheError::InvalidArgument(_))));
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 0);
    }

    #[test]
    fn test_release_of_shared_instance() {
        let cache = HandlerCache::new();
        let shared = Arc::new(CountingHandler::default());
        let k1 = HandlerKey::new("rule-1", "action-1");
        let k2 = HandlerKey::new("rule-2", "action-1");

        for key in [&k1, &k2] {
            cache
                .get(key, |_| Ok::<_, HandlerCacheError>(Some(Arc::clone(&shared))))
                .unwrap();
        }
        assert_eq!(cache.stats().distinct_handlers, 1);

        assert_eq!(cache.release(&k1, &shared).unwrap(), ReleaseOutcome::Detached);
        assert_eq!(shared.disposals(), 0);

        assert_eq!(cache.release(&k2, &shared).unwrap(), ReleaseOutcome::Disposed);
        assert_eq!(shared.disposals(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_release_failure_still_removes_key() {
        let cache: HandlerCache<FailingHandler> = HandlerCache::new();
        let key = HandlerKey::new("rule-1", "action-1");
        let handler = cache
            .get(&key, |_| Ok::<_, HandlerCacheError>(Some(Arc::new(FailingHandler))))
            .unwrap()
            .unwrap();

        let result = cache.release(&key, &handler);
        match result {
            Err(HandlerCacheError::DisposeFailed { key: failed_key, reason }) => {
                assert_eq!(failed_key, "rule-1/action-1");
                assert!(reason.contains("connection already closed"));
            }
            other => panic!("unexpected release result: {other:?}"),
        }
        assert!(!cache.contains_key(&key));
    }

    #[test]
    fn test_dispose_all_skips_duplicates() {
        let cache = HandlerCache::new();
        let shared = Arc::new(CountingHandler::default());
        let single = Arc::new(CountingHandler::default());

        for target in ["a", "b", "c"] {
            cache
                .get(&HandlerKey::new("rule-1", target), |_| {
                    Ok::<_, HandlerCacheError>(Some(Arc::clone(&shared)))
                })
                .unwrap();
        }
        cache
            .get(&HandlerKey::new("rule-2", "a"), |_| {
                Ok::<_, HandlerCacheError>(Some(Arc::clone(&single)))
            })
            .unwrap();

        assert_eq!(cache.dispose_all().unwrap(), 2);
        assert_eq!(shared.disposals(), 1);
        assert_eq!(single.disposals(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_handlers_snapshot_is_sorted() {
        let cache = HandlerCache::new();
        for (owner, target) in [("rule-2", "a"), ("rule-1", "b"), ("rule-1", "a")] {
            cache.get(&HandlerKey::new(owner, target), create_counting).unwrap();
        }

        let keys: Vec<String> = cache
            .handlers()
            .into_iter()
            .map(|(key, _)| key.to_string())
            .collect();
        assert_eq!(keys, vec!["rule-1/a", "rule-1/b", "rule-2/a"]);
    }

    #[test]
    fn test_with_config_starts_empty() {
        let cache: HandlerCache<CountingHandler> =
            HandlerCache::with_config(&CacheConfig::default());
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), HandlerCacheStats::default());
    }
}
