//! Deep configuration merging.
//!
//! Every [`Extensible`](crate::extensible::Extensible) computes its effective
//! configuration by layering a default tree, a user-supplied partial tree,
//! and an optional runtime override. Later layers win on scalar conflicts,
//! objects are merged key-wise, and absent keys never override a defined
//! value from an earlier layer.
//!
//! Merging is total: when an object meets a non-object, the right-hand value
//! is treated as an opaque scalar and simply overwrites. Inputs are never
//! mutated, which is what keeps per-request configuration views independent
//! of the application's own tree.

use serde_json::{Map, Value};

/// Deep-merges `overlay` onto `base`, returning a new tree.
///
/// - Two objects merge key-wise, recursing into shared keys.
/// - Any other pairing resolves to a clone of `overlay`.
/// - A JSON `null` in `overlay` is a defined scalar and overwrites; only
///   absent keys leave the `base` value in place.
///
/// # Example
///
/// ```
/// use serde_json::json;
///
/// let base = json!({"a": 1, "nested": {"x": true}});
/// let overlay = json!({"nested": {"y": false}});
/// let merged = colloquy_core::config::merge(&base, &overlay);
/// assert_eq!(merged, json!({"a": 1, "nested": {"x": true, "y": false}}));
/// ```
pub fn merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut out = base.clone();
            for (key, value) in overlay {
                let merged = match out.get(key) {
                    Some(existing) => merge(existing, value),
                    None => value.clone(),
                };
                out.insert(key.clone(), merged);
            }
            Value::Object(out)
        }
        _ => overlay.clone(),
    }
}

/// Computes an effective configuration from the three standard layers.
///
/// Equivalent to `merge(merge(default, user), overrides)` with the override
/// layer optional.
pub fn effective(default: &Value, user: &Value, overrides: Option<&Value>) -> Value {
    let merged = merge(default, user);
    match overrides {
        Some(overrides) => merge(&merged, overrides),
        None => merged,
    }
}

/// Returns an empty configuration object.
pub fn empty() -> Value {
    Value::Object(Map::new())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_precedence() {
        let default = json!({"a": 1, "b": 2});
        let user = json!({"b": 3});

        let merged = merge(&default, &user);
        assert_eq!(merged, json!({"a": 1, "b": 3}));
    }

    #[test]
    fn test_nested_objects_merge_keywise() {
        let default = json!({"dialog": {"depth": 2, "greedy": false}});
        let user = json!({"dialog": {"greedy": true}, "extra": "x"});

        let merged = merge(&default, &user);
        assert_eq!(
            merged,
            json!({"dialog": {"depth": 2, "greedy": true}, "extra": "x"})
        );
    }

    #[test]
    fn test_shape_mismatch_overwrites() {
        // Object vs. scalar resolves by opaque overwrite, never an error.
        let default = json!({"a": {"nested": true}});
        let user = json!({"a": 42});
        assert_eq!(merge(&default, &user), json!({"a": 42}));

        let back = merge(&user, &default);
        assert_eq!(back, json!({"a": {"nested": true}}));
    }

    #[test]
    fn test_merge_is_pure() {
        let default = json!({"a": {"x": 1}});
        let user = json!({"a": {"y": 2}});
        let before_default = default.clone();
        let before_user = user.clone();

        let _ = merge(&default, &user);

        assert_eq!(default, before_default);
        assert_eq!(user, before_user);
    }

    #[test]
    fn test_idempotence() {
        let default = json!({"a": 1, "nested": {"x": [1, 2], "y": "s"}});
        let user = json!({"nested": {"y": "t"}});

        let once = effective(&default, &user, None);
        let twice = merge(&once, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_override_layer_wins() {
        let default = json!({"level": "info", "tags": {"a": 1}});
        let user = json!({"level": "debug"});
        let overrides = json!({"tags": {"b": 2}});

        let merged = effective(&default, &user, Some(&overrides));
        assert_eq!(
            merged,
            json!({"level": "debug", "tags": {"a": 1, "b": 2}})
        );
    }
}
