//! The application container and its request-driving loop.
//!
//! An [`App`] is the root [`Extensible`]: it owns the plugin tree, the
//! middleware collection over the fixed stage vocabulary, the component
//! registry, and the metadata catalog. Registration methods take `&mut self`
//! while [`handle`](App::handle) takes `&self`, so the borrow checker
//! enforces that all registrations are finalized before the application
//! starts serving — there is no hot-reload of plugins mid-flight.
//!
//! # Request flow
//!
//! ```text
//! handle(request)
//!   ├─ RequestContext::new     (isolated per-request view)
//!   ├─ mount()                 (mount hooks, request-scoped registrations)
//!   ├─ run "request"
//!   ├─ resolve platform        (first registered platform claiming the request)
//!   ├─ create facade
//!   ├─ run the remaining 7 stages, in order, with (ctx, facade)
//!   └─ facade response value
//! ```

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{Instrument, Level, debug, error, info, span, warn};

use crate::components::{ComponentDeclaration, ComponentRegistry, MetadataCatalog};
use crate::error::{HandleError, HandleResult, LifecycleResult};
use crate::extensible::{Extensible, PluginNode};
use crate::host::{HostAdapter, NullHost};
use crate::middleware::{MiddlewareCollection, STAGES};
use crate::platform::Facade;
use crate::plugin::{Plugin, PluginRole};
use crate::request::{RequestContext, RequestPhase};

/// The long-lived application instance.
///
/// # Example
///
/// ```rust,ignore
/// let mut app = App::new();
/// app.use_plugin(Arc::new(MyPlatform::default()));
/// app.initialize().await?;
///
/// let response = app.handle(json!({"channel": "X"})).await?;
/// ```
pub struct App {
    root: Extensible,
    middleware: MiddlewareCollection,
    components: ComponentRegistry,
    catalog: MetadataCatalog,
    initialized: bool,
}

impl App {
    /// Creates an application with an empty user configuration.
    pub fn new() -> Self {
        Self::with_config(json!({}))
    }

    /// Creates an application with a user-supplied partial configuration.
    ///
    /// The `plugin.<name>` sections of this tree supply each registered
    /// plugin's user configuration layer.
    pub fn with_config(user_config: Value) -> Self {
        Self {
            root: Extensible::new("app")
                .with_defaults(json!({"plugin": {}}))
                .with_config(user_config),
            middleware: MiddlewareCollection::new(STAGES),
            components: ComponentRegistry::new(),
            catalog: MetadataCatalog::new(),
            initialized: false,
        }
    }

    // ─── Registration ────────────────────────────────────────────────────────

    /// Registers a plugin; last registration under a name wins.
    pub fn use_plugin(&mut self, plugin: Arc<dyn Plugin>) {
        self.root.use_plugin(plugin);
    }

    /// Registers several plugins in order.
    pub fn use_plugins<I>(&mut self, plugins: I)
    where
        I: IntoIterator<Item = Arc<dyn Plugin>>,
    {
        self.root.use_plugins(plugins);
    }

    /// Registers a plugin with a use-time configuration override.
    pub fn use_plugin_with(&mut self, plugin: Arc<dyn Plugin>, overrides: Value) {
        self.root.use_plugin_with(plugin, overrides);
    }

    /// Registers a nested container as a top-level plugin.
    pub fn use_nested(&mut self, child: Extensible) {
        self.root.use_nested(child);
    }

    /// Registers setup-time component metadata into the catalog.
    pub fn register_component_metadata(&mut self, name: impl Into<String>, metadata: Value) {
        self.catalog.register(name, metadata);
    }

    /// Registers component declarations into the registry, merging any prior
    /// catalog metadata for the same name.
    pub fn use_components<I>(&mut self, declarations: I)
    where
        I: IntoIterator<Item = ComponentDeclaration>,
    {
        for declaration in declarations {
            self.components
                .register(&declaration, self.catalog.get(declaration.name()));
        }
    }

    // ─── Introspection ───────────────────────────────────────────────────────

    /// The root plugin tree.
    pub fn plugins(&self) -> &Extensible {
        &self.root
    }

    /// The application-level middleware collection.
    ///
    /// Listeners registered here are shared by every request.
    pub fn middleware(&self) -> &MiddlewareCollection {
        &self.middleware
    }

    /// The component registry.
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// The application's effective configuration; `None` before
    /// [`initialize`](Self::initialize).
    pub fn config(&self) -> Option<&Arc<Value>> {
        self.root.effective_config()
    }

    /// Returns `true` once [`initialize`](Self::initialize) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Names of registered platform plugins, in registration order.
    pub fn platform_names(&self) -> Vec<&str> {
        self.root
            .entries()
            .iter()
            .filter(|entry| match entry.node() {
                PluginNode::Leaf(plugin) => plugin.role() == PluginRole::Platform,
                PluginNode::Composite(_) => false,
            })
            .map(|entry| entry.name())
            .collect()
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────────

    /// Computes the effective configuration tree and runs every plugin's
    /// `initialize` hook in registration order.
    ///
    /// A failure here is fatal to the whole application: it must be resolved
    /// before any request is accepted.
    pub async fn initialize(&mut self) -> LifecycleResult<()> {
        self.root.initialize_plugins(&self.middleware).await?;
        self.initialized = true;
        info!(plugins = self.root.len(), "Application initialized");
        Ok(())
    }

    // ─── Request handling ────────────────────────────────────────────────────

    /// Handles one raw request end-to-end with the null host adapter.
    pub async fn handle(&self, request: Value) -> HandleResult<Value> {
        self.handle_with_host(request, Arc::new(NullHost)).await
    }

    /// Handles one raw request arriving through the given host adapter.
    ///
    /// Rejects with [`HandleError::Uninitialized`] unless a prior
    /// [`initialize`](Self::initialize) succeeded — a failed initialization
    /// keeps the application closed to requests until it is resolved.
    ///
    /// Constructs an isolated [`RequestContext`], mounts it, and drives the
    /// pipeline stages in their fixed order. On success resolves to the
    /// facade's accumulated response value; any stage or platform-resolution
    /// failure aborts the remaining pipeline for this request only.
    pub async fn handle_with_host(
        &self,
        request: Value,
        host: Arc<dyn HostAdapter>,
    ) -> HandleResult<Value> {
        if !self.initialized {
            return Err(HandleError::Uninitialized);
        }
        let ctx = Arc::new(RequestContext::new(self, request, host));
        match self.drive(&ctx).await {
            Ok(response) => {
                ctx.set_phase(RequestPhase::Completed);
                Ok(response)
            }
            Err(e) => {
                ctx.set_phase(RequestPhase::Failed);
                error!(error = %e, "Request processing failed");
                Err(e)
            }
        }
    }

    async fn drive(&self, ctx: &Arc<RequestContext>) -> HandleResult<Value> {
        ctx.mount().await?;

        self.run_stage(ctx, STAGES[0], None).await?;

        let facade = self.resolve_platform(ctx)?;
        for stage in &STAGES[1..] {
            self.run_stage(ctx, stage, Some(Arc::clone(&facade))).await?;
        }

        debug!(platform = %facade.platform(), "Pipeline completed");
        Ok(facade.response().unwrap_or(Value::Null))
    }

    async fn run_stage(
        &self,
        ctx: &Arc<RequestContext>,
        stage: &str,
        facade: Option<Arc<Facade>>,
    ) -> HandleResult<()> {
        ctx.set_phase(RequestPhase::Running(stage.to_string()));
        let span = span!(Level::DEBUG, "stage", name = %stage);
        ctx.middleware()
            .run(stage, Arc::clone(ctx), facade)
            .instrument(span)
            .await?;
        Ok(())
    }

    /// Selects the first registered platform whose ownership predicate claims
    /// the raw request, and asks it for the request-scoped facade.
    fn resolve_platform(&self, ctx: &RequestContext) -> HandleResult<Arc<Facade>> {
        for entry in ctx.plugins().entries() {
            let PluginNode::Leaf(plugin) = entry.node() else {
                continue;
            };
            if plugin.role() != PluginRole::Platform {
                continue;
            }
            let Some(platform) = plugin.as_platform() else {
                warn!(
                    plugin = %entry.name(),
                    "Plugin tagged as platform but exposes no platform capability"
                );
                continue;
            };
            if platform.owns_request(ctx.request()) {
                debug!(platform = %entry.name(), "Platform resolved");
                return Ok(Arc::new(platform.create_facade(ctx.request())));
            }
        }
        Err(HandleError::NoMatchingPlatform)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
