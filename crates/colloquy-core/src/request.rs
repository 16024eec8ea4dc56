//! Per-request context.
//!
//! A [`RequestContext`] is the short-lived, isolated view of the application
//! that one inbound request is processed through. Plugin instances and their
//! effective configurations are immutable and shared with the application
//! (`Arc`); everything mutable — the middleware snapshot, the component
//! copy, the data bag, the phase — is owned by the context and discarded
//! with it. Mutations made while handling one request can therefore never
//! leak into the [`App`](crate::app::App) or into concurrently running
//! contexts.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};

use crate::app::App;
use crate::components::ComponentRegistry;
use crate::error::LifecycleResult;
use crate::extensible::Extensible;
use crate::host::HostAdapter;
use crate::middleware::MiddlewareCollection;

// =============================================================================
// RequestPhase
// =============================================================================

/// Where a request currently is in its lifecycle.
///
/// ```text
/// Created ──► Mounted ──► Running(stage…) ──► Completed
///     └──────────┴─────────────┴───────────► Failed
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPhase {
    /// Context constructed, plugins not yet mounted.
    Created,
    /// Mount recursion completed.
    Mounted,
    /// The named pipeline stage is executing.
    Running(String),
    /// Pipeline finished, response produced.
    Completed,
    /// Aborted by a lifecycle, platform-resolution, or listener failure.
    Failed,
}

// =============================================================================
// RequestContext
// =============================================================================

/// Per-request isolated clone of application state driving one pipeline
/// execution.
///
/// Created by [`App::handle`](crate::app::App::handle), mounted once, driven
/// through the pipeline once, then discarded — never reused across requests.
pub struct RequestContext {
    request: Value,
    host: Arc<dyn HostAdapter>,
    plugins: Extensible,
    middleware: MiddlewareCollection,
    components: ComponentRegistry,
    /// Request-scoped mutable state (dialog accumulation and the like).
    data: RwLock<Map<String, Value>>,
    phase: Mutex<RequestPhase>,
}

impl RequestContext {
    pub(crate) fn new(app: &App, request: Value, host: Arc<dyn HostAdapter>) -> Self {
        Self {
            request,
            host,
            plugins: app.plugins().clone(),
            middleware: app.middleware().snapshot(),
            components: app.components().clone(),
            data: RwLock::new(Map::new()),
            phase: Mutex::new(RequestPhase::Created),
        }
    }

    /// The raw request this context is bound to.
    pub fn request(&self) -> &Value {
        &self.request
    }

    /// The host adapter the request arrived through.
    pub fn host(&self) -> &dyn HostAdapter {
        self.host.as_ref()
    }

    /// Returns a clone of the host adapter `Arc`.
    pub fn host_arc(&self) -> Arc<dyn HostAdapter> {
        Arc::clone(&self.host)
    }

    /// The request's view of the plugin tree (instances shared with the App).
    pub fn plugins(&self) -> &Extensible {
        &self.plugins
    }

    /// The request's own middleware snapshot.
    ///
    /// Listeners registered here during `mount` live exactly as long as the
    /// request.
    pub fn middleware(&self) -> &MiddlewareCollection {
        &self.middleware
    }

    /// The request's copy of the component registry.
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    // ─── Request-scoped data ─────────────────────────────────────────────────

    /// Stores a value in the request-scoped data bag.
    pub fn set_data(&self, key: impl Into<String>, value: Value) {
        self.data.write().insert(key.into(), value);
    }

    /// Returns a clone of the value stored under `key`, if any.
    pub fn data(&self, key: &str) -> Option<Value> {
        self.data.read().get(key).cloned()
    }

    /// Removes and returns the value stored under `key`.
    pub fn take_data(&self, key: &str) -> Option<Value> {
        self.data.write().remove(key)
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────────

    /// The request's current phase.
    pub fn phase(&self) -> RequestPhase {
        self.phase.lock().clone()
    }

    pub(crate) fn set_phase(&self, phase: RequestPhase) {
        *self.phase.lock() = phase;
    }

    /// Runs the mount recursion over the request's plugin tree.
    ///
    /// Mount hooks receive this context's middleware snapshot, so anything
    /// they register is request-scoped.
    pub async fn mount(&self) -> LifecycleResult<()> {
        self.plugins.mount_plugins(&self.middleware).await?;
        self.set_phase(RequestPhase::Mounted);
        Ok(())
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("host", &self.host.name())
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::host::NullHost;

    #[tokio::test]
    async fn test_fresh_context_state() {
        let mut app = App::new();
        app.initialize().await.unwrap();

        let ctx = RequestContext::new(&app, json!({"channel": "X"}), Arc::new(NullHost));

        assert_eq!(ctx.phase(), RequestPhase::Created);
        assert_eq!(ctx.request(), &json!({"channel": "X"}));
        assert_eq!(ctx.host().name(), "null");
        assert_eq!(ctx.data("anything"), None);
    }

    #[tokio::test]
    async fn test_data_bags_are_independent() {
        let mut app = App::new();
        app.initialize().await.unwrap();

        let a = RequestContext::new(&app, json!({}), Arc::new(NullHost));
        let b = RequestContext::new(&app, json!({}), Arc::new(NullHost));

        a.set_data("dialog", json!({"turn": 1}));
        assert_eq!(a.data("dialog"), Some(json!({"turn": 1})));
        assert_eq!(b.data("dialog"), None);

        assert_eq!(a.take_data("dialog"), Some(json!({"turn": 1})));
        assert_eq!(a.data("dialog"), None);
    }
}
