//! Leaf equality for change detection.
//!
//! Plain leaves compare strictly. When a rich leaf meets another object-like
//! node, the two are compared through their primitive readings instead of
//! structurally: by string form when either side has no numeric reading,
//! by numeric form otherwise. A boxed `3` therefore equals a boxed `"3"`,
//! and two dates with the same timestamp are equal.

use vessel_types::rich::{number_to_string, string_to_number};
use vessel_types::Value;

/// Returns `true` when replacing `old` by `new` is not a change.
pub fn loosely_equal(old: &Value, new: &Value) -> bool {
    if old.ptr_eq(new) {
        return true;
    }
    match (old, new) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
        (Value::String(a), Value::String(b)) => a == b,
        _ if compares_by_primitive(old, new) => {
            let (a, b) = (to_number(old), to_number(new));
            if a.is_nan() || b.is_nan() {
                to_display(old) == to_display(new)
            } else {
                a == b
            }
        }
        _ => false,
    }
}

fn compares_by_primitive(old: &Value, new: &Value) -> bool {
    let object_like = |v: &Value| v.is_rich() || v.is_container();
    object_like(old) && object_like(new) && (old.is_rich() || new.is_rich())
}

fn to_number(value: &Value) -> f64 {
    match value {
        Value::Rich(r) => r.to_number(),
        Value::Number(n) => *n,
        Value::Array(_) => string_to_number(&to_display(value)),
        _ => f64::NAN,
    }
}

fn to_display(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_string(*n),
        Value::String(s) => s.clone(),
        Value::Rich(r) => r.to_display(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                // Holes and nulls print as nothing inside a joined array.
                Value::Null => String::new(),
                other => to_display(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Returns `true` when both sides are containers of the same shape.
pub(crate) fn same_shape(old: &Value, new: &Value) -> bool {
    matches!(
        (old, new),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_))
    )
}
