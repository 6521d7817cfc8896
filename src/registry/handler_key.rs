//! Composite lookup key for cached handlers.

use crate::error::{HandlerCacheError, Result};
use serde::{Deserialize, Serialize};

/// Key for handler lookup in the cache
///
/// Equality and hashing cover both fields separately, so `("ab", "c")` and
/// `("a", "bc")` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandlerKey {
    pub owner_id: String,
    pub target_id: String,
}

impl HandlerKey {
    /// Create a new handler key with explicit values
    pub fn new(owner_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            target_id: target_id.into(),
        }
    }

    /// Create a handler key, rejecting malformed identifiers up front
    pub fn try_new(owner_id: impl Into<String>, target_id: impl Into<String>) -> Result<Self> {
        let key = Self::new(owner_id, target_id);
        key.validate()?;
        Ok(key)
    }

    /// Both identifiers must be non-empty
    pub fn validate(&self) -> Result<()> {
        if self.owner_id.trim().is_empty() {
            return Err(HandlerCacheError::InvalidArgument(format!(
                "owner_id cannot be empty (target_id: '{}')",
                self.target_id
            )));
        }

        if self.target_id.trim().is_empty() {
            return Err(HandlerCacheError::InvalidArgument(format!(
                "target_id cannot be empty (owner_id: '{}')",
                self.owner_id
            )));
        }

        Ok(())
    }
}

impl std::fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner_id, self.target_id)
    }
}
