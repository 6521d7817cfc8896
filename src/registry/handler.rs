//! Handler lifecycle contract.

use crate::error::Result;
use std::sync::Arc;

/// A stateful resource created on demand and released through [`Handler::dispose`]
///
/// The cache calls `dispose` once per logical disposal. Implementations must
/// not call back into the cache that owns them from `dispose`, and must not
/// depend on the order in which sibling handlers are disposed.
pub trait Handler: Send + Sync {
    fn dispose(&self) -> Result<()>;
}

/// Pointer identity of the shared allocation, ignoring trait object metadata
pub(crate) fn same_instance<H: ?Sized>(left: &Arc<H>, right: &Arc<H>) -> bool {
    instance_id(left) == instance_id(right)
}

pub(crate) fn instance_id<H: ?Sized>(handler: &Arc<H>) -> usize {
    Arc::as_ptr(handler).cast::<()>() as usize
}
