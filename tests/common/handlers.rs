//! Test handlers that record how often they were disposed.

#![allow(dead_code)]

use module_handler_cache::{Handler, HandlerCacheError, HandlerKey, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Handler that counts its disposals
#[derive(Debug, Default)]
pub struct TrackedHandler {
    pub label: String,
    disposals: AtomicUsize,
}

impl TrackedHandler {
    pub fn new(label: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            label: label.into(),
            disposals: AtomicUsize::new(0),
        })
    }

    pub fn for_key(key: &HandlerKey) -> Arc<Self> {
        Self::new(key.to_string())
    }

    pub fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }
}

impl Handler for TrackedHandler {
    fn dispose(&self) -> Result<()> {
        self.disposals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Handler whose dispose can be made to fail
#[derive(Debug, Default)]
pub struct FlakyHandler {
    pub fail_on_dispose: bool,
    attempts: AtomicUsize,
}

impl FlakyHandler {
    pub fn healthy() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn broken() -> Arc<Self> {
        Arc::new(Self {
            fail_on_dispose: true,
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Handler for FlakyHandler {
    fn dispose(&self) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_dispose {
            return Err(HandlerCacheError::dispose_failed(
                "flaky",
                "device did not acknowledge shutdown",
            ));
        }
        Ok(())
    }
}

/// Creation strategy that always builds a fresh tracked handler
pub fn create_tracked(key: &HandlerKey) -> Result<Option<Arc<TrackedHandler>>> {
    Ok(Some(TrackedHandler::for_key(key)))
}

/// Creation strategy that never supports the request
pub fn create_unsupported(_: &HandlerKey) -> Result<Option<Arc<TrackedHandler>>> {
    Ok(None)
}
