//! # Handler Registry Infrastructure
//!
//! Keyed caching and lifecycle management for handler instances.
//!
//! ## Architecture
//!
//! ```text
//! Registry Infrastructure
//! ├── HandlerKey        (owner_id + target_id lookup key)
//! ├── Handler           (dispose contract)
//! ├── HandlerCache      (per-key instances, shared-instance aware release)
//! └── HandlerFactory    (typed constructors, activate/deactivate lifecycle)
//! ```

pub mod handler;
pub mod handler_cache;
pub mod handler_factory;
pub mod handler_key;

// Re-export main types for easy access
pub use handler::Handler;
pub use handler_cache::{HandlerCache, HandlerCacheStats, ReleaseOutcome};
pub use handler_factory::{FactoryState, HandlerConstructor, HandlerFactory};
pub use handler_key::HandlerKey;
