//! Host adapter boundary.
//!
//! The host adapter is the opaque transport handle a server integration
//! passes alongside each raw request. The core carries it through to the
//! [`RequestContext`](crate::request::RequestContext) without interpreting
//! it; platform plugins may downcast it to reach transport-specific state.

use std::any::Any;
use std::sync::Arc;

/// Opaque transport object bound to one request.
pub trait HostAdapter: Send + Sync {
    /// Identifies the transport, for logging only.
    fn name(&self) -> &str;

    /// Upcast for transport-specific downcasting by platform plugins.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Default host used when no transport is involved (tests, direct calls).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl HostAdapter for NullHost {
    fn name(&self) -> &str {
        "null"
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
