//! The plugin contract.
//!
//! A [`Plugin`] is a named unit of behaviour registered into an
//! [`Extensible`](crate::extensible::Extensible) container. Plugin instances
//! are immutable and shared (`Arc`) across every in-flight request; anything
//! a plugin wants to mutate per request lives in the
//! [`RequestContext`](crate::request::RequestContext) or the
//! [`Facade`](crate::platform::Facade) passed to its stage listeners.
//!
//! # Lifecycle
//!
//! ```text
//! use_plugin() ──► install   (sync, at registration time)
//! initialize() ──► initialize (async, once per App, registration order)
//! handle()     ──► mount      (async, once per request, on the request's
//!                              own middleware snapshot)
//! ```
//!
//! A failing `initialize` or `mount` aborts the remaining recursion and is
//! surfaced as a [`LifecycleError`](crate::error::LifecycleError) tagged with
//! the plugin's name and phase.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BoxError;
use crate::extensible::Extensible;
use crate::middleware::MiddlewareCollection;
use crate::platform::Platform;
use crate::config;

// =============================================================================
// PluginRole
// =============================================================================

/// Explicit capability tag carried by every plugin.
///
/// Platform resolution checks this tag (together with
/// [`Plugin::as_platform`]) instead of inspecting runtime types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginRole {
    /// Ordinary pipeline plugin.
    Standard,
    /// Plugin able to claim ownership of a raw request and produce a facade.
    Platform,
}

// =============================================================================
// LifecyclePhase
// =============================================================================

/// The lifecycle phase a plugin hook belongs to. Used for error tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Synchronous registration-time hook.
    Install,
    /// Application-level initialization.
    Initialize,
    /// Per-request mount.
    Mount,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            Self::Install => "install",
            Self::Initialize => "initialize",
            Self::Mount => "mount",
        };
        write!(f, "{phase}")
    }
}

// =============================================================================
// HookContext
// =============================================================================

/// Context passed to a plugin's `initialize` and `mount` hooks.
///
/// Provides the plugin's effective configuration (defaults deep-merged with
/// the owner's `plugin.<name>` section and any use-time override) and the
/// middleware collection the hook may register stage listeners into.
///
/// During `initialize` this is the application's collection; during `mount`
/// it is the request's own snapshot, so listeners registered there are
/// discarded with the request.
pub struct HookContext<'a> {
    config: &'a Value,
    middleware: &'a MiddlewareCollection,
}

impl<'a> HookContext<'a> {
    pub(crate) fn new(config: &'a Value, middleware: &'a MiddlewareCollection) -> Self {
        Self { config, middleware }
    }

    /// The plugin's effective configuration tree.
    pub fn config(&self) -> &Value {
        self.config
    }

    /// Deserialises the effective configuration into `T`.
    ///
    /// Use `#[serde(default)]` on the struct to make all fields optional.
    pub fn get_config<T>(&self) -> serde_json::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        T::deserialize(self.config)
    }

    /// The middleware collection this hook may register listeners into.
    pub fn middleware(&self) -> &MiddlewareCollection {
        self.middleware
    }
}

// =============================================================================
// Plugin trait
// =============================================================================

/// A named unit of behaviour with install/initialize/mount lifecycle hooks.
///
/// Implementations must be stateless with respect to individual requests:
/// one instance serves every in-flight request concurrently.
///
/// # Example
///
/// ```rust,ignore
/// struct RouterPlugin;
///
/// #[async_trait::async_trait]
/// impl Plugin for RouterPlugin {
///     fn name(&self) -> &str {
///         "router"
///     }
///
///     async fn initialize(&self, ctx: &HookContext<'_>) -> Result<(), BoxError> {
///         ctx.middleware().register(
///             "dialog.logic",
///             listener(|ctx, facade| async move { /* … */ Ok(()) }),
///         )?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Plugin: Send + Sync {
    /// The plugin's declared name, unique within its owning container.
    fn name(&self) -> &str;

    /// The plugin's capability tag.
    fn role(&self) -> PluginRole {
        PluginRole::Standard
    }

    /// Baseline configuration merged beneath the user-supplied layers.
    fn default_config(&self) -> Value {
        config::empty()
    }

    /// Upcast to the platform contract.
    ///
    /// Must return `Some` exactly when [`role`](Self::role) is
    /// [`PluginRole::Platform`].
    fn as_platform(&self) -> Option<&dyn Platform> {
        None
    }

    /// Synchronous hook invoked when the plugin is registered.
    fn install(&self, _owner: &mut Extensible) {}

    /// Application-level initialization, run once in registration order.
    async fn initialize(&self, _ctx: &HookContext<'_>) -> Result<(), BoxError> {
        Ok(())
    }

    /// Per-request mount, run once per [`RequestContext`](crate::request::RequestContext).
    async fn mount(&self, _ctx: &HookContext<'_>) -> Result<(), BoxError> {
        Ok(())
    }
}
