#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Module Handler Cache
//!
//! Keyed handler-instance cache with shared-instance aware disposal.
//!
//! ## Overview
//!
//! Handlers are stateful resources created on demand for a request context
//! identified by an owner and a target. The cache hands out one instance per
//! key, lets a creation strategy share one instance across several keys, and
//! disposes an instance only when the last key referring to it is released.
//!
//! ## Module Organization
//!
//! - [`registry`] - Handler keys, the cache and the typed factory
//! - [`config`] - Layered cache configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup and helpers
//!
//! ## Quick Start
//!
//! ```rust
//! use module_handler_cache::registry::{Handler, HandlerCache, HandlerKey};
//! use module_handler_cache::{CacheConfig, HandlerCacheError, Result};
//! use std::sync::Arc;
//!
//! struct RuleTrigger;
//!
//! impl Handler for RuleTrigger {
//!     fn dispose(&self) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let cache: HandlerCache<RuleTrigger> = HandlerCache::with_config(&CacheConfig::default());
//! let key = HandlerKey::try_new("rule-1", "trigger-1")?;
//!
//! let handler = cache.get(&key, |_| Ok::<_, HandlerCacheError>(Some(Arc::new(RuleTrigger))))?;
//! assert!(handler.is_some());
//! assert_eq!(cache.dispose_all()?, 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod registry;

pub use crate::config::CacheConfig;
pub use crate::error::{HandlerCacheError, Result};
pub use crate::registry::{
    FactoryState, Handler, HandlerCache, HandlerCacheStats, HandlerFactory, HandlerKey,
    ReleaseOutcome,
};
