//! Platform contract and the per-request facade.
//!
//! A platform is a plugin (tagged [`PluginRole::Platform`]) that can claim
//! ownership of an incoming raw request and produce the request-scoped
//! [`Facade`] that later pipeline stages accumulate interpretation, dialog,
//! and response state on.
//!
//! [`PluginRole::Platform`]: crate::plugin::PluginRole::Platform

use std::fmt;

use parking_lot::RwLock;
use serde_json::{Map, Value};

// =============================================================================
// Platform trait
// =============================================================================

/// Capability contract for plugins able to own a raw request.
///
/// Reached through [`Plugin::as_platform`](crate::plugin::Plugin::as_platform);
/// the first registered platform whose [`owns_request`](Self::owns_request)
/// predicate matches wins.
pub trait Platform: Send + Sync {
    /// Returns `true` if this platform owns the given raw request.
    fn owns_request(&self, request: &Value) -> bool;

    /// Builds the request-scoped facade for a request this platform owns.
    ///
    /// Platforms typically normalize the raw payload here and seed the
    /// facade's data bag with platform-specific entries.
    fn create_facade(&self, request: &Value) -> Facade;
}

// =============================================================================
// Facade
// =============================================================================

/// The per-request conversational object.
///
/// Created once the owning platform is resolved and shared (`Arc`) with every
/// stage listener that runs after the `request` stage. Interpretation and
/// dialog stages accumulate state in the data bag; the final value placed in
/// the response slot is what [`App::handle`](crate::app::App::handle) returns.
///
/// All mutation goes through interior locks, so listeners receive `&Facade`
/// and never need exclusive access.
pub struct Facade {
    platform: String,
    request: Value,
    data: RwLock<Map<String, Value>>,
    response: RwLock<Option<Value>>,
}

impl Facade {
    /// Creates a facade owned by the named platform.
    pub fn new(platform: impl Into<String>, request: Value) -> Self {
        Self {
            platform: platform.into(),
            request,
            data: RwLock::new(Map::new()),
            response: RwLock::new(None),
        }
    }

    /// Name of the platform that produced this facade.
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// The raw request this facade is bound to.
    pub fn request(&self) -> &Value {
        &self.request
    }

    /// Stores a value in the facade's data bag, overwriting any previous
    /// value under the same key.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.data.write().insert(key.into(), value);
    }

    /// Returns a clone of the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.data.read().get(key).cloned()
    }

    /// Removes and returns the value stored under `key`.
    pub fn take(&self, key: &str) -> Option<Value> {
        self.data.write().remove(key)
    }

    /// Sets the accumulated response value.
    pub fn set_response(&self, response: Value) {
        *self.response.write() = Some(response);
    }

    /// Returns a clone of the accumulated response value, if any was set.
    pub fn response(&self) -> Option<Value> {
        self.response.read().clone()
    }
}

impl fmt::Debug for Facade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Facade")
            .field("platform", &self.platform)
            .field("response", &*self.response.read())
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

    #[test]
    fn test_data_bag_overwrites_per_key() {
        let facade = Facade::new("test", json!({}));

        facade.set("intent", json!("greet"));
        facade.set("intent", json!("bye"));

        assert_eq!(facade.get("intent"), Some(json!("bye")));
        assert_eq!(facade.take("intent"), Some(json!("bye")));
        assert_eq!(facade.get("intent"), None);
    }

    #[test]
    fn test_response_slot() {
        let facade = Facade::new("test", json!({}));
        assert_eq!(facade.response(), None);

        facade.set_response(json!({"text": "ok"}));
        assert_eq!(facade.response(), Some(json!({"text": "ok"})));
    }
}
