//! The named, ordered multi-stage pipeline.
//!
//! A [`MiddlewareCollection`] is constructed with a fixed, ordered list of
//! stage names — the stage set is closed, and the construction order is the
//! only execution order. Each stage owns an ordered list of listeners which
//! [`run`](MiddlewareCollection::run) awaits **strictly sequentially**: a
//! later listener only starts after the previous one's asynchronous work
//! completed, so listeners within one stage may depend on mutations made by
//! earlier listeners of the same stage.
//!
//! The driving loop in [`App::handle`](crate::app::App::handle) is
//! responsible for invoking the stages in their fixed order; `run` never
//! advances to another stage on its own.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::RwLock;
use tracing::trace;

use crate::error::{BoxError, MiddlewareError, MiddlewareResult};
use crate::platform::Facade;
use crate::request::RequestContext;

/// The fixed stage vocabulary of the request pipeline, in execution order.
///
/// This is the wire-level contract for any plugin hooking the pipeline.
pub const STAGES: [&str; 8] = [
    "request",
    "interpretation.asr",
    "interpretation.nlu",
    "dialog.context",
    "dialog.logic",
    "response.output",
    "response.tts",
    "response",
];

// =============================================================================
// StageListener
// =============================================================================

/// Future returned by a stage listener.
pub type ListenerFuture = BoxFuture<'static, Result<(), BoxError>>;

/// A callable registered to one pipeline stage.
///
/// Listeners receive the request context and, for every stage after platform
/// resolution, the facade. Both arrive as `Arc`s so the returned future can
/// be `'static`.
pub trait StageListener: Send + Sync {
    /// Runs the listener for one request.
    fn call(&self, ctx: Arc<RequestContext>, facade: Option<Arc<Facade>>) -> ListenerFuture;
}

struct FnListener<F>(F);

impl<F, Fut> StageListener for FnListener<F>
where
    F: Fn(Arc<RequestContext>, Option<Arc<Facade>>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    fn call(&self, ctx: Arc<RequestContext>, facade: Option<Arc<Facade>>) -> ListenerFuture {
        Box::pin((self.0)(ctx, facade))
    }
}

/// Wraps an async closure into a [`StageListener`].
///
/// # Example
///
/// ```rust,ignore
/// middleware.register(
///     "response",
///     listener(|_ctx, facade| async move {
///         if let Some(facade) = facade {
///             facade.set_response(serde_json::json!({"text": "ok"}));
///         }
///         Ok(())
///     }),
/// )?;
/// ```
pub fn listener<F, Fut>(f: F) -> Arc<dyn StageListener>
where
    F: Fn(Arc<RequestContext>, Option<Arc<Facade>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    Arc::new(FnListener(f))
}

// =============================================================================
// MiddlewareCollection
// =============================================================================

struct Stage {
    name: Cow<'static, str>,
    listeners: RwLock<Vec<Arc<dyn StageListener>>>,
}

/// An ordered set of named stages, each holding an ordered listener list.
///
/// Registration happens behind a shared reference so plugin hooks can
/// register listeners through the [`HookContext`](crate::plugin::HookContext)
/// they are handed; all registration is finished before a collection is run
/// concurrently.
pub struct MiddlewareCollection {
    stages: Vec<Stage>,
}

impl MiddlewareCollection {
    /// Creates a collection with the given fixed stage vocabulary.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        Self {
            stages: names
                .into_iter()
                .map(|name| Stage {
                    name: name.into(),
                    listeners: RwLock::new(Vec::new()),
                })
                .collect(),
        }
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name.as_ref())
    }

    /// Returns `true` if `name` belongs to the fixed stage vocabulary.
    pub fn has_stage(&self, name: &str) -> bool {
        self.stages.iter().any(|s| s.name == name)
    }

    fn stage(&self, name: &str) -> MiddlewareResult<&Stage> {
        self.stages
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| MiddlewareError::UnknownStage {
                stage: name.to_string(),
            })
    }

    /// Appends a listener to the named stage's list.
    ///
    /// Fails with [`MiddlewareError::UnknownStage`] — and registers nothing —
    /// when `stage` is outside the constructed vocabulary.
    pub fn register(
        &self,
        stage: &str,
        listener: Arc<dyn StageListener>,
    ) -> MiddlewareResult<()> {
        self.stage(stage)?.listeners.write().push(listener);
        Ok(())
    }

    /// Number of listeners currently registered to `stage`.
    pub fn listener_count(&self, stage: &str) -> MiddlewareResult<usize> {
        Ok(self.stage(stage)?.listeners.read().len())
    }

    /// Runs every listener of the named stage, strictly sequentially, in
    /// registration order.
    ///
    /// The first listener error aborts the remaining listeners of the stage
    /// and surfaces as [`MiddlewareError::Listener`] tagged with the stage
    /// name. Subsequent stages are never run implicitly.
    pub async fn run(
        &self,
        stage: &str,
        ctx: Arc<RequestContext>,
        facade: Option<Arc<Facade>>,
    ) -> MiddlewareResult<()> {
        let listeners: Vec<Arc<dyn StageListener>> = {
            let found = self.stage(stage)?;
            found.listeners.read().clone()
        };

        trace!(stage = %stage, listeners = listeners.len(), "Running pipeline stage");
        for listener in listeners {
            listener
                .call(Arc::clone(&ctx), facade.clone())
                .await
                .map_err(|source| MiddlewareError::Listener {
                    stage: stage.to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Produces the per-request copy of this collection.
    ///
    /// Stage names and listener `Arc`s are shared; the listener lists are
    /// independent, so request-scoped registrations made during `mount`
    /// never leak back into the application's collection.
    pub fn snapshot(&self) -> MiddlewareCollection {
        MiddlewareCollection {
            stages: self
                .stages
                .iter()
                .map(|s| Stage {
                    name: s.name.clone(),
                    listeners: RwLock::new(s.listeners.read().clone()),
                })
                .collect(),
        }
    }
}

impl std::fmt::Debug for MiddlewareCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for stage in &self.stages {
            map.entry(&stage.name, &stage.listeners.read().len());
        }
        map.finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use crate::app::App;

    fn collection() -> MiddlewareCollection {
        MiddlewareCollection::new(STAGES)
    }

    async fn test_ctx() -> Arc<RequestContext> {
        let mut app = App::new();
        app.initialize().await.unwrap();
        Arc::new(RequestContext::new(&app, json!({}), Arc::new(crate::host::NullHost)))
    }

    #[test]
    fn test_register_unknown_stage_rejected() {
        let mw = collection();
        let result = mw.register("bogus.stage", listener(|_, _| async { Ok(()) }));

        assert!(matches!(
            result,
            Err(MiddlewareError::UnknownStage { ref stage }) if stage == "bogus.stage"
        ));
        // No side effects: every declared stage is still empty.
        for stage in STAGES {
            assert_eq!(mw.listener_count(stage).unwrap(), 0);
        }
    }

    #[tokio::test]
    async fn test_run_unknown_stage_rejected() {
        let mw = collection();
        let result = mw.run("bogus.stage", test_ctx().await, None).await;
        assert!(matches!(result, Err(MiddlewareError::UnknownStage { .. })));
    }

    #[tokio::test]
    async fn test_listeners_run_in_registration_order() {
        let mw = collection();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for i in 0..3 {
            let seen = Arc::clone(&seen);
            mw.register(
                "request",
                listener(move |_, _| {
                    let seen = Arc::clone(&seen);
                    async move {
                        seen.lock().push(i);
                        Ok(())
                    }
                }),
            )
            .unwrap();
        }

        mw.run("request", test_ctx().await, None).await.unwrap();
        assert_eq!(*seen.lock(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_failing_listener_aborts_stage() {
        let mw = collection();
        let ran_after = Arc::new(AtomicUsize::new(0));

        mw.register(
            "request",
            listener(|_, _| async { Err::<(), _>("boom".into()) }),
        )
        .unwrap();
        let counter = Arc::clone(&ran_after);
        mw.register(
            "request",
            listener(move |_, _| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        )
        .unwrap();

        let result = mw.run("request", test_ctx().await, None).await;

        assert!(matches!(
            result,
            Err(MiddlewareError::Listener { ref stage, .. }) if stage == "request"
        ));
        assert_eq!(ran_after.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_snapshot_lists_are_independent() {
        let mw = collection();
        mw.register("request", listener(|_, _| async { Ok(()) }))
            .unwrap();

        let snap = mw.snapshot();
        snap.register("request", listener(|_, _| async { Ok(()) }))
            .unwrap();

        assert_eq!(mw.listener_count("request").unwrap(), 1);
        assert_eq!(snap.listener_count("request").unwrap(), 2);
    }
}
