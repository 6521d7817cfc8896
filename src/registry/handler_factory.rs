//! # Handler Factory
//!
//! Factory component that creates handlers per supported type and caches them
//! per `(owner_id, target_id)` key.
//!
//! ## Overview
//!
//! The factory owns a [`HandlerCache`] and a table of constructors, one per
//! supported handler type. A request for an unsupported type yields no handler
//! rather than an error. The factory must be activated before handlers can be
//! obtained; deactivation disposes every cached handler.
//!
//! ## Usage
//!
//! ```rust
//! use module_handler_cache::registry::{Handler, HandlerFactory, HandlerKey};
//! use module_handler_cache::Result;
//! use std::sync::Arc;
//!
//! struct WeatherPoller;
//!
//! impl Handler for WeatherPoller {
//!     fn dispose(&self) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let factory: HandlerFactory<WeatherPoller> = HandlerFactory::new("weather");
//! factory.register_type("weather", |_key| Ok(Arc::new(WeatherPoller)))?;
//! factory.activate()?;
//!
//! let key = HandlerKey::new("station-1", "observation");
//! assert!(factory.get_handler(&key, "weather")?.is_some());
//! assert!(factory.get_handler(&HandlerKey::new("station-2", "radar"), "radar")?.is_none());
//!
//! factory.deactivate()?;
//! # Ok(())
//! # }
//! ```

use super::handler::Handler;
use super::handler_cache::{HandlerCache, HandlerCacheStats, ReleaseOutcome};
use super::handler_key::HandlerKey;
use crate::config::CacheConfig;
use crate::error::{HandlerCacheError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Constructor for one supported handler type
pub type HandlerConstructor<H> = Box<dyn Fn(&HandlerKey) -> Result<Arc<H>> + Send + Sync>;

/// Factory lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryState {
    Inactive,
    Active,
}

/// Factory for creating handlers by type with a shared instance cache
pub struct HandlerFactory<H: ?Sized> {
    name: String,
    state: RwLock<FactoryState>,
    constructors: RwLock<HashMap<String, HandlerConstructor<H>>>,
    cache: HandlerCache<H>,
}

impl<H: Handler + ?Sized> HandlerFactory<H> {
    /// Create a new, inactive handler factory
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_cache(name, HandlerCache::new())
    }

    /// Create a new, inactive handler factory with a pre-sized cache
    pub fn with_config(name: impl Into<String>, config: &CacheConfig) -> Self {
        Self::with_cache(name, HandlerCache::with_config(config))
    }

    fn with_cache(name: impl Into<String>, cache: HandlerCache<H>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(FactoryState::Inactive),
            constructors: RwLock::new(HashMap::new()),
            cache,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> FactoryState {
        *self.state.read()
    }

    /// Register the constructor for a handler type, replacing any previous one
    pub fn register_type<F>(&self, type_id: impl Into<String>, constructor: F) -> Result<()>
    where
        F: Fn(&HandlerKey) -> Result<Arc<H>> + Send + Sync + 'static,
    {
        let type_id = type_id.into();
        if type_id.trim().is_empty() {
            return Err(HandlerCacheError::InvalidArgument(
                "Handler type id cannot be empty".to_string(),
            ));
        }

        let mut constructors = self.constructors.write();
        if constructors
            .insert(type_id.clone(), Box::new(constructor))
            .is_some()
        {
            warn!(factory = %self.name, type_id = %type_id, "Replaced existing handler constructor");
        } else {
            debug!(factory = %self.name, type_id = %type_id, "Registered handler type");
        }
        Ok(())
    }

    pub fn supports_type(&self, type_id: &str) -> bool {
        self.constructors.read().contains_key(type_id)
    }

    /// Supported handler types in sorted order
    pub fn supported_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.constructors.read().keys().cloned().collect();
        types.sort();
        types
    }

    /// Make the factory available for handler requests
    pub fn activate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(HandlerCacheError::InvalidArgument(
                "Factory name cannot be empty".to_string(),
            ));
        }

        let mut state = self.state.write();
        if *state == FactoryState::Active {
            return Err(HandlerCacheError::InvalidState(format!(
                "Factory '{}' is already active",
                self.name
            )));
        }

        *state = FactoryState::Active;
        info!(factory = %self.name, types = ?self.supported_types(), "Activated handler factory");
        Ok(())
    }

    /// Dispose all cached handlers and return to the inactive state
    ///
    /// The factory is inactive afterwards even when some handlers failed to
    /// dispose; the failures are reported as [`HandlerCacheError::TeardownFailed`].
    pub fn deactivate(&self) -> Result<usize> {
        let mut state = self.state.write();
        if *state == FactoryState::Inactive {
            return Ok(0);
        }

        *state = FactoryState::Inactive;
        let disposed = self.cache.dispose_all()?;
        info!(factory = %self.name, disposed, "Deactivated handler factory");
        Ok(disposed)
    }

    /// Get the handler for `key`, creating one of `type_id` on a cache miss
    ///
    /// Returns `Ok(None)` when `type_id` is not supported.
    pub fn get_handler(&self, key: &HandlerKey, type_id: &str) -> Result<Option<Arc<H>>> {
        // Held across the lookup so deactivation cannot interleave with a create
        let state = self.state.read();
        if *state != FactoryState::Active {
            return Err(HandlerCacheError::InvalidState(format!(
                "Factory '{}' is not active",
                self.name
            )));
        }

        self.cache.get(key, |key| self.create_handler(key, type_id))
    }

    /// Release `key`'s reference to `handler`, disposing it if unreferenced
    pub fn unget_handler(&self, key: &HandlerKey, handler: &Arc<H>) -> Result<ReleaseOutcome> {
        self.cache.release(key, handler)
    }

    /// Read-only snapshot of the cached handlers
    pub fn handlers(&self) -> Vec<(HandlerKey, Arc<H>)> {
        self.cache.handlers()
    }

    pub fn stats(&self) -> HandlerCacheStats {
        self.cache.stats()
    }

    fn create_handler(&self, key: &HandlerKey, type_id: &str) -> Result<Option<Arc<H>>> {
        let constructors = self.constructors.read();
        match constructors.get(type_id) {
            Some(constructor) => constructor(key).map(Some),
            None => {
                debug!(factory = %self.name, key = %key, type_id = %type_id, "Unsupported handler type");
                Ok(None)
            }
        }
    }
}

impl<H: ?Sized> std::fmt::Debug for HandlerFactory<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFactory")
            .field("name", &self.name)
            .field("state", &*self.state.read())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
