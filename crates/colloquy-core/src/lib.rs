//! # Colloquy Core
//!
//! The orchestration core of the Colloquy request-processing runtime.
//!
//! Colloquy lets independently-authored plugins register themselves into a
//! fixed set of named pipeline stages, merges per-plugin configuration into
//! a tree of nested extensible containers, and drives each incoming request
//! through the stages while isolating request-scoped mutable state from the
//! long-lived application instance.
//!
//! ## Building blocks
//!
//! - **Configuration merging** ([`config`]): default, user, and override
//!   layers deep-merged into one effective tree, later layers winning.
//! - **Plugins** ([`Plugin`]): named units with install/initialize/mount
//!   lifecycle hooks, shared immutably across concurrent requests.
//! - **Extensible containers** ([`Extensible`]): named plugin trees driven
//!   recursively through the lifecycle, nestable as plugins themselves.
//! - **The pipeline** ([`MiddlewareCollection`]): eight fixed stages, each
//!   holding an ordered listener list awaited strictly sequentially.
//! - **Components** ([`ComponentRegistry`]): name-keyed merged component
//!   declarations with accumulate-on-redeclare semantics.
//! - **Request handling** ([`App`], [`RequestContext`]): one isolated
//!   context per inbound request, a resolved [`Platform`] producing the
//!   request's [`Facade`], and the facade's response as the result.
//!
//! ## Request pipeline
//!
//! ```text
//! ┌─────────┐   ┌──────────────────────┐   ┌───────────────────┐   ┌──────────┐
//! │ request │──▶│ interpretation.{asr, │──▶│ dialog.{context,  │──▶│ response │
//! │         │   │ nlu}                 │   │ logic} + response.│   │          │
//! └─────────┘   └──────────────────────┘   │ {output,tts}      │   └──────────┘
//!      │                                   └───────────────────┘
//!      └── platform resolution happens after the `request` stage
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use colloquy_core::{App, listener};
//! use serde_json::json;
//!
//! let mut app = App::new();
//! app.use_plugin(Arc::new(MyPlatform::default()));
//! app.middleware().register(
//!     "response",
//!     listener(|_ctx, facade| async move {
//!         facade.unwrap().set_response(json!({"text": "ok"}));
//!         Ok(())
//!     }),
//! )?;
//! app.initialize().await?;
//!
//! let response = app.handle(json!({"channel": "X"})).await?;
//! ```

pub mod app;
pub mod components;
pub mod config;
pub mod error;
pub mod extensible;
pub mod host;
pub mod middleware;
pub mod platform;
pub mod plugin;
pub mod request;

pub use app::App;
pub use components::{ComponentDeclaration, ComponentRegistry, MetadataCatalog};
pub use error::{
    BoxError, HandleError, HandleResult, LifecycleError, LifecycleResult, MiddlewareError,
    MiddlewareResult,
};
pub use extensible::{Extensible, PluginEntry, PluginNode};
pub use host::{HostAdapter, NullHost};
pub use middleware::{ListenerFuture, MiddlewareCollection, STAGES, StageListener, listener};
pub use platform::{Facade, Platform};
pub use plugin::{HookContext, LifecyclePhase, Plugin, PluginRole};
pub use request::{RequestContext, RequestPhase};

/// Prelude for common imports.
pub mod prelude {
    pub use super::app::App;
    pub use super::components::ComponentDeclaration;
    pub use super::error::{BoxError, HandleError, HandleResult};
    pub use super::extensible::Extensible;
    pub use super::middleware::{MiddlewareCollection, STAGES, listener};
    pub use super::platform::{Facade, Platform};
    pub use super::plugin::{HookContext, Plugin, PluginRole};
    pub use super::request::RequestContext;
}
