//! Unified error types for the Colloquy core.
//!
//! Every failure surfaced by the pipeline is local to one `handle()` call,
//! except lifecycle failures raised while the [`App`](crate::app::App) is
//! initializing — those prevent the application from serving any request.

use thiserror::Error;

use crate::plugin::LifecyclePhase;

/// Boxed error type carried by plugin hooks and stage listeners.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Lifecycle Errors
// =============================================================================

/// An `initialize` or `mount` hook failed.
///
/// The remaining recursion over the owning [`Extensible`] is aborted; no
/// partial-success continuation is attempted.
///
/// [`Extensible`]: crate::extensible::Extensible
#[derive(Debug, Error)]
#[error("plugin '{plugin}' failed during {phase}: {source}")]
pub struct LifecycleError {
    /// Name of the offending plugin.
    pub plugin: String,
    /// Lifecycle phase in which the hook failed.
    pub phase: LifecyclePhase,
    /// The error returned by the hook.
    #[source]
    pub source: BoxError,
}

// =============================================================================
// Middleware Errors
// =============================================================================

/// Errors raised by the [`MiddlewareCollection`](crate::middleware::MiddlewareCollection).
#[derive(Debug, Error)]
pub enum MiddlewareError {
    /// Registration or run against a stage name outside the fixed vocabulary.
    #[error("unknown pipeline stage '{stage}'")]
    UnknownStage {
        /// The undeclared stage name.
        stage: String,
    },

    /// A listener within a running stage failed.
    ///
    /// The remaining listeners of the stage are skipped and the pipeline for
    /// this request is aborted.
    #[error("listener failed in stage '{stage}': {source}")]
    Listener {
        /// Stage in which the listener failed.
        stage: String,
        /// The error returned by the listener.
        #[source]
        source: BoxError,
    },
}

// =============================================================================
// Handle Errors
// =============================================================================

/// Errors surfaced to the caller of [`App::handle`](crate::app::App::handle).
#[derive(Debug, Error)]
pub enum HandleError {
    /// The application has not completed a successful `initialize()`.
    ///
    /// Raised both before the first `initialize()` call and after a failed
    /// one; the application accepts no request until initialization
    /// succeeds.
    #[error("application is not initialized")]
    Uninitialized,

    /// No registered platform claims the incoming request.
    #[error("no registered platform claims the incoming request")]
    NoMatchingPlatform,

    /// A plugin lifecycle hook failed while mounting the request.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// A pipeline stage failed.
    #[error(transparent)]
    Middleware(#[from] MiddlewareError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Result type for middleware operations.
pub type MiddlewareResult<T> = Result<T, MiddlewareError>;

/// Result type for request handling.
pub type HandleResult<T> = Result<T, HandleError>;
