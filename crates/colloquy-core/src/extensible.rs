//! Extensible plugin containers.
//!
//! An [`Extensible`] owns a set of named plugins in registration order and
//! drives their lifecycle recursively. Children are either leaf plugins or
//! nested `Extensible` containers, modelled as an explicit tagged
//! [`PluginNode`] tree walked by the initialize/mount visitors — never by
//! virtual dispatch between "container" and "leaf".
//!
//! Because children are *owned* values, a container can never appear in its
//! own descendant tree; the no-cycles invariant holds by construction.
//!
//! # Configuration layering
//!
//! Each child's effective configuration is computed during initialization
//! from three layers, later layers winning:
//!
//! 1. the child's own `default_config()`,
//! 2. the owner's effective `plugin.<name>` section (for nested containers,
//!    merged over the container's construction-time config),
//! 3. the use-time override supplied at registration, if any.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::{debug, trace};

use crate::config;
use crate::error::{LifecycleError, LifecycleResult};
use crate::middleware::MiddlewareCollection;
use crate::plugin::{HookContext, LifecyclePhase, Plugin};

// =============================================================================
// PluginNode
// =============================================================================

/// One node of the plugin tree.
///
/// Leaf instances are shared (`Arc`) and immutable; cloning a tree for a
/// request shares every instance instead of deep-copying behaviour.
#[derive(Clone)]
pub enum PluginNode {
    /// A plain plugin.
    Leaf(Arc<dyn Plugin>),
    /// A nested container registered as a plugin of its parent.
    Composite(Extensible),
}

/// A named registration inside an [`Extensible`].
#[derive(Clone)]
pub struct PluginEntry {
    name: String,
    node: PluginNode,
    /// Use-time override layer, applied on top of the owner's config section.
    overrides: Option<Value>,
    /// Effective configuration, computed once during initialization.
    effective: Option<Arc<Value>>,
}

impl PluginEntry {
    /// The name this entry was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registered node.
    pub fn node(&self) -> &PluginNode {
        &self.node
    }

    /// The entry's effective configuration; `None` before initialization.
    pub fn effective_config(&self) -> Option<&Arc<Value>> {
        self.effective.as_ref()
    }
}

// =============================================================================
// Extensible
// =============================================================================

/// A composable container owning named plugins and a merged configuration.
#[derive(Clone)]
pub struct Extensible {
    name: String,
    default_config: Value,
    user_config: Value,
    entries: Vec<PluginEntry>,
    effective: Option<Arc<Value>>,
}

impl Extensible {
    /// Creates an empty container with empty default and user configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_config: config::empty(),
            user_config: config::empty(),
            entries: Vec::new(),
            effective: None,
        }
    }

    /// Sets the container's baseline configuration shape.
    pub fn with_defaults(mut self, default_config: Value) -> Self {
        self.default_config = default_config;
        self
    }

    /// Sets the user-supplied partial configuration.
    ///
    /// Its `plugin.<name>` section supplies each child's user layer.
    pub fn with_config(mut self, user_config: Value) -> Self {
        self.user_config = user_config;
        self
    }

    /// The container's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The container's effective configuration; `None` before initialization.
    pub fn effective_config(&self) -> Option<&Arc<Value>> {
        self.effective.as_ref()
    }

    // ─── Registration ────────────────────────────────────────────────────────

    /// Registers a plugin under its declared name.
    ///
    /// Runs the plugin's `install` hook, then stores the entry. Re-registering
    /// a name replaces the existing entry in place — last registration wins,
    /// and the original position in the iteration order is kept.
    pub fn use_plugin(&mut self, plugin: Arc<dyn Plugin>) {
        self.use_plugin_with_entry(plugin, None);
    }

    /// Registers several plugins in order.
    pub fn use_plugins<I>(&mut self, plugins: I)
    where
        I: IntoIterator<Item = Arc<dyn Plugin>>,
    {
        for plugin in plugins {
            self.use_plugin(plugin);
        }
    }

    /// Registers a plugin with a use-time configuration override.
    ///
    /// The override is the highest-precedence layer of the plugin's effective
    /// configuration.
    pub fn use_plugin_with(&mut self, plugin: Arc<dyn Plugin>, overrides: Value) {
        self.use_plugin_with_entry(plugin, Some(overrides));
    }

    fn use_plugin_with_entry(&mut self, plugin: Arc<dyn Plugin>, overrides: Option<Value>) {
        plugin.install(self);
        let name = plugin.name().to_string();
        self.insert(PluginEntry {
            name,
            node: PluginNode::Leaf(plugin),
            overrides,
            effective: None,
        });
    }

    /// Registers a nested container as a plugin of this one.
    pub fn use_nested(&mut self, child: Extensible) {
        self.insert(PluginEntry {
            name: child.name.clone(),
            node: PluginNode::Composite(child),
            overrides: None,
            effective: None,
        });
    }

    fn insert(&mut self, entry: PluginEntry) {
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => {
                trace!(plugin = %entry.name, "Replacing existing plugin registration");
                *existing = entry;
            }
            None => self.entries.push(entry),
        }
    }

    // ─── Introspection ───────────────────────────────────────────────────────

    /// Entries in registration order.
    pub fn entries(&self) -> &[PluginEntry] {
        &self.entries
    }

    /// Looks up an entry by name.
    pub fn entry(&self, name: &str) -> Option<&PluginEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Registered names in iteration order.
    pub fn plugin_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no plugin is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ─── Lifecycle visitors ──────────────────────────────────────────────────

    /// Recursively initializes every owned plugin in registration order.
    ///
    /// For each entry the effective configuration is computed and stored,
    /// then the `initialize` hook runs with it. The first failing hook aborts
    /// the walk and is tagged with the offending plugin's name.
    pub fn initialize_plugins<'a>(
        &'a mut self,
        middleware: &'a MiddlewareCollection,
    ) -> BoxFuture<'a, LifecycleResult<()>> {
        Box::pin(async move {
            let own = Arc::clone(self.effective.get_or_insert_with(|| {
                Arc::new(config::effective(
                    &self.default_config,
                    &self.user_config,
                    None,
                ))
            }));

            for entry in &mut self.entries {
                let user_layer = own
                    .get("plugin")
                    .and_then(|section| section.get(&entry.name))
                    .cloned()
                    .unwrap_or_else(config::empty);

                let PluginEntry {
                    name,
                    node,
                    overrides,
                    effective,
                } = entry;

                match node {
                    PluginNode::Leaf(plugin) => {
                        let eff = Arc::new(config::effective(
                            &plugin.default_config(),
                            &user_layer,
                            overrides.as_ref(),
                        ));
                        *effective = Some(Arc::clone(&eff));
                        let hook = HookContext::new(&eff, middleware);
                        plugin.initialize(&hook).await.map_err(|source| {
                            LifecycleError {
                                plugin: name.clone(),
                                phase: LifecyclePhase::Initialize,
                                source,
                            }
                        })?;
                        debug!(plugin = %name, "Plugin initialized");
                    }
                    PluginNode::Composite(child) => {
                        let user = config::merge(&child.user_config, &user_layer);
                        child.effective = Some(Arc::new(config::effective(
                            &child.default_config,
                            &user,
                            overrides.as_ref(),
                        )));
                        *effective = child.effective.clone();
                        child.initialize_plugins(middleware).await?;
                        debug!(container = %name, "Nested container initialized");
                    }
                }
            }
            Ok(())
        })
    }

    /// Recursively mounts every owned plugin in registration order.
    ///
    /// Runs after all initialization has completed; a container's own mount
    /// finishes only after every descendant's mount completed. The first
    /// failing hook aborts the walk, tagged with the plugin's name.
    pub fn mount_plugins<'a>(
        &'a self,
        middleware: &'a MiddlewareCollection,
    ) -> BoxFuture<'a, LifecycleResult<()>> {
        Box::pin(async move {
            for entry in &self.entries {
                match &entry.node {
                    PluginNode::Leaf(plugin) => {
                        let eff = entry
                            .effective
                            .clone()
                            .unwrap_or_else(|| Arc::new(config::empty()));
                        let hook = HookContext::new(&eff, middleware);
                        plugin.mount(&hook).await.map_err(|source| LifecycleError {
                            plugin: entry.name.clone(),
                            phase: LifecyclePhase::Mount,
                            source,
                        })?;
                    }
                    PluginNode::Composite(child) => {
                        child.mount_plugins(middleware).await?;
                    }
                }
            }
            Ok(())
        })
    }
}

impl fmt::Debug for Extensible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensible")
            .field("name", &self.name)
            .field("plugins", &self.plugin_names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    use crate::error::BoxError;
    use crate::middleware::STAGES;

    #[derive(Default)]
    struct HookTally {
        initialized: AtomicUsize,
        mounted: AtomicUsize,
        seen_config: Mutex<Option<Value>>,
    }

    struct TestPlugin {
        name: &'static str,
        defaults: Value,
        fail_initialize: bool,
        fail_mount: bool,
        tally: Arc<HookTally>,
    }

    impl TestPlugin {
        fn new(name: &'static str, tally: Arc<HookTally>) -> Arc<dyn Plugin> {
            Arc::new(Self {
                name,
                defaults: config::empty(),
                fail_initialize: false,
                fail_mount: false,
                tally,
            })
        }

        fn with_defaults(
            name: &'static str,
            defaults: Value,
            tally: Arc<HookTally>,
        ) -> Arc<dyn Plugin> {
            Arc::new(Self {
                name,
                defaults,
                fail_initialize: false,
                fail_mount: false,
                tally,
            })
        }

        fn failing(name: &'static str, tally: Arc<HookTally>) -> Arc<dyn Plugin> {
            Arc::new(Self {
                name,
                defaults: config::empty(),
                fail_initialize: true,
                fail_mount: false,
                tally,
            })
        }

        fn failing_mount(name: &'static str, tally: Arc<HookTally>) -> Arc<dyn Plugin> {
            Arc::new(Self {
                name,
                defaults: config::empty(),
                fail_initialize: false,
                fail_mount: true,
                tally,
            })
        }
    }

    #[async_trait]
    impl Plugin for TestPlugin {
        fn name(&self) -> &str {
            self.name
        }

        fn default_config(&self) -> Value {
            self.defaults.clone()
        }

        async fn initialize(&self, ctx: &HookContext<'_>) -> Result<(), BoxError> {
            if self.fail_initialize {
                return Err("init failure".into());
            }
            self.tally.initialized.fetch_add(1, Ordering::SeqCst);
            *self.tally.seen_config.lock() = Some(ctx.config().clone());
            Ok(())
        }

        async fn mount(&self, _ctx: &HookContext<'_>) -> Result<(), BoxError> {
            if self.fail_mount {
                return Err("mount failure".into());
            }
            self.tally.mounted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_registration_order_and_replacement() {
        let tally = Arc::new(HookTally::default());
        let mut ext = Extensible::new("root");

        ext.use_plugin(TestPlugin::new("alpha", Arc::clone(&tally)));
        ext.use_plugin(TestPlugin::new("beta", Arc::clone(&tally)));
        // Same-name re-registration replaces in place, keeping the position.
        ext.use_plugin(TestPlugin::with_defaults(
            "alpha",
            json!({"marker": 2}),
            Arc::clone(&tally),
        ));

        assert_eq!(ext.plugin_names().collect::<Vec<_>>(), vec!["alpha", "beta"]);
        assert_eq!(ext.len(), 2);
        match ext.entry("alpha").unwrap().node() {
            PluginNode::Leaf(plugin) => {
                assert_eq!(plugin.default_config(), json!({"marker": 2}));
            }
            PluginNode::Composite(_) => panic!("expected leaf"),
        }
    }

    #[tokio::test]
    async fn test_effective_config_layers() {
        let tally = Arc::new(HookTally::default());
        let middleware = MiddlewareCollection::new(STAGES);
        let mut ext = Extensible::new("root")
            .with_defaults(json!({"plugin": {}}))
            .with_config(json!({"plugin": {"alpha": {"level": "debug", "extra": 1}}}));

        ext.use_plugin_with(
            TestPlugin::with_defaults(
                "alpha",
                json!({"level": "info", "kept": true}),
                Arc::clone(&tally),
            ),
            json!({"extra": 2}),
        );

        ext.initialize_plugins(&middleware).await.unwrap();

        let seen = tally.seen_config.lock().clone().unwrap();
        assert_eq!(seen, json!({"level": "debug", "kept": true, "extra": 2}));
        assert_eq!(
            ext.entry("alpha").unwrap().effective_config().unwrap().as_ref(),
            &seen
        );
    }

    #[tokio::test]
    async fn test_initialize_failure_aborts_and_tags() {
        let tally = Arc::new(HookTally::default());
        let middleware = MiddlewareCollection::new(STAGES);
        let mut ext = Extensible::new("root");

        ext.use_plugin(TestPlugin::failing("broken", Arc::clone(&tally)));
        ext.use_plugin(TestPlugin::new("after", Arc::clone(&tally)));

        let err = ext.initialize_plugins(&middleware).await.unwrap_err();

        assert_eq!(err.plugin, "broken");
        assert_eq!(err.phase, LifecyclePhase::Initialize);
        // No partial-success continuation.
        assert_eq!(tally.initialized.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_mount_failure_aborts_and_tags() {
        let tally = Arc::new(HookTally::default());
        let middleware = MiddlewareCollection::new(STAGES);
        let mut ext = Extensible::new("root");

        ext.use_plugin(TestPlugin::failing_mount("broken", Arc::clone(&tally)));
        ext.use_plugin(TestPlugin::new("after", Arc::clone(&tally)));

        ext.initialize_plugins(&middleware).await.unwrap();
        let err = ext.mount_plugins(&middleware).await.unwrap_err();

        assert_eq!(err.plugin, "broken");
        assert_eq!(err.phase, LifecyclePhase::Mount);
        assert_eq!(tally.mounted.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_nested_container_recursion() {
        let tally = Arc::new(HookTally::default());
        let middleware = MiddlewareCollection::new(STAGES);

        let mut inner = Extensible::new("inner");
        inner.use_plugin(TestPlugin::with_defaults(
            "leaf",
            json!({"from_default": true}),
            Arc::clone(&tally),
        ));

        let mut root = Extensible::new("root")
            .with_config(json!({"plugin": {"inner": {"plugin": {"leaf": {"deep": 1}}}}}));
        root.use_nested(inner);

        root.initialize_plugins(&middleware).await.unwrap();
        root.mount_plugins(&middleware).await.unwrap();

        assert_eq!(tally.initialized.load(Ordering::SeqCst), 1);
        assert_eq!(tally.mounted.load(Ordering::SeqCst), 1);
        let seen = tally.seen_config.lock().clone().unwrap();
        assert_eq!(seen, json!({"from_default": true, "deep": 1}));
    }

    #[tokio::test]
    async fn test_mount_runs_every_plugin_in_order() {
        let tally = Arc::new(HookTally::default());
        let middleware = MiddlewareCollection::new(STAGES);
        let mut ext = Extensible::new("root");

        ext.use_plugin(TestPlugin::new("one", Arc::clone(&tally)));
        ext.use_plugin(TestPlugin::new("two", Arc::clone(&tally)));

        ext.initialize_plugins(&middleware).await.unwrap();
        ext.mount_plugins(&middleware).await.unwrap();

        assert_eq!(tally.mounted.load(Ordering::SeqCst), 2);
    }
}
