//! Component declarations and their registry.
//!
//! Components are declared metadata, not behaviour: the registry is a
//! name-keyed table of merged declaration trees that handler plugins consult
//! at dialog time. Declaring the same name more than once merges field-wise
//! into the existing entry — last write wins per field, never per entry —
//! so multiple partial declarations of one component accumulate.
//!
//! Declaration-time metadata lives in an explicit [`MetadataCatalog`]
//! populated during application setup; there is no ambient global catalog.

use std::collections::HashMap;

use serde_json::Value;

use crate::config;

// =============================================================================
// ComponentDeclaration
// =============================================================================

/// One use-site declaration of a component.
#[derive(Debug, Clone)]
pub struct ComponentDeclaration {
    name: String,
    options: Value,
}

impl ComponentDeclaration {
    /// Declares a component by name with no call-site options.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: config::empty(),
        }
    }

    /// Declares a component with call-site options.
    pub fn with_options(name: impl Into<String>, options: Value) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    /// The canonical component name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The call-site options.
    pub fn options(&self) -> &Value {
        &self.options
    }
}

// =============================================================================
// MetadataCatalog
// =============================================================================

/// Setup-time component metadata, registered explicitly.
///
/// Registering metadata for a name that already has some merges the trees,
/// mirroring the registry's accumulation semantics.
#[derive(Debug, Clone, Default)]
pub struct MetadataCatalog {
    entries: HashMap<String, Value>,
}

impl MetadataCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or merges) metadata for a component name.
    pub fn register(&mut self, name: impl Into<String>, metadata: Value) {
        let name = name.into();
        let merged = match self.entries.get(&name) {
            Some(existing) => config::merge(existing, &metadata),
            None => metadata,
        };
        self.entries.insert(name, merged);
    }

    /// Looks up metadata for a component name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }
}

// =============================================================================
// ComponentRegistry
// =============================================================================

/// Name-keyed table of merged component declarations.
///
/// Entries live for the lifetime of the owning App; there is no removal
/// operation. The per-request copy taken by the
/// [`RequestContext`](crate::request::RequestContext) is a plain clone.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    entries: HashMap<String, Value>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a declaration, merging prior catalog metadata, the existing
    /// entry, and the declaration's options into one tree.
    ///
    /// A first registration with no prior metadata merges against an empty
    /// entry; no special-casing applies.
    pub fn register(&mut self, declaration: &ComponentDeclaration, prior: Option<&Value>) {
        let existing = self
            .entries
            .get(declaration.name())
            .cloned()
            .unwrap_or_else(config::empty);
        let base = match prior {
            Some(prior) => config::merge(&existing, prior),
            None => existing,
        };
        let merged = config::merge(&base, declaration.options());
        self.entries.insert(declaration.name().to_string(), merged);
    }

    /// Looks up the merged entry for a component name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Registered component names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no component is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
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
    fn test_disjoint_fields_accumulate() {
        let mut registry = ComponentRegistry::new();

        registry.register(
            &ComponentDeclaration::with_options("menu", json!({"entry": "start"})),
            None,
        );
        registry.register(
            &ComponentDeclaration::with_options("menu", json!({"global": true})),
            None,
        );

        assert_eq!(
            registry.get("menu"),
            Some(&json!({"entry": "start", "global": true}))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_overlapping_fields_last_write_wins() {
        let mut registry = ComponentRegistry::new();

        registry.register(
            &ComponentDeclaration::with_options("menu", json!({"entry": "start", "keep": 1})),
            None,
        );
        registry.register(
            &ComponentDeclaration::with_options("menu", json!({"entry": "main"})),
            None,
        );

        assert_eq!(registry.get("menu"), Some(&json!({"entry": "main", "keep": 1})));
    }

    #[test]
    fn test_catalog_metadata_layers_beneath_options() {
        let mut catalog = MetadataCatalog::new();
        catalog.register("menu", json!({"entry": "start", "scope": "global"}));

        let mut registry = ComponentRegistry::new();
        registry.register(
            &ComponentDeclaration::with_options("menu", json!({"scope": "local"})),
            catalog.get("menu"),
        );

        assert_eq!(
            registry.get("menu"),
            Some(&json!({"entry": "start", "scope": "local"}))
        );
    }

    #[test]
    fn test_first_registration_without_catalog_entry() {
        let catalog = MetadataCatalog::new();
        let mut registry = ComponentRegistry::new();

        let declaration = ComponentDeclaration::new("bare");
        registry.register(&declaration, catalog.get("bare"));

        assert_eq!(registry.get("bare"), Some(&json!({})));
    }
}
