//! The plain value tree.
//!
//! Containers are reference counted so that successive snapshots can share
//! every subtree a change did not touch. Mutation goes through
//! [`Arc::make_mut`], which copies a container only while it is still shared,
//! so editing a cheap clone of a snapshot never disturbs the original.
//!
//! # Invariants
//!
//! - Trees are acyclic. Nothing here checks for cycles; building one is a
//!   caller error.
//! - Object keys keep insertion order, which is the diff engine's key order.

use std::ops::{Index, IndexMut};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{TypeError, TypeResult};
use crate::path::{Path, Seg};
use crate::rich::{number_to_string, Rich};

/// Ordered keyed container.
pub type Map = IndexMap<String, Value>;

static NULL: Value = Value::Null;

/// A node in a state tree.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Rich(Rich),
    Array(Arc<Vec<Value>>),
    Object(Arc<Map>),
}

impl Value {
    /// An empty object.
    pub fn object() -> Self {
        Value::Object(Arc::new(Map::new()))
    }

    /// An empty array.
    pub fn array() -> Self {
        Value::Array(Arc::new(Vec::new()))
    }

    /// Short name of the node kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Rich(r) => r.kind_name(),
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Returns `true` for arrays and objects.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_rich(&self) -> bool {
        matches!(self, Value::Rich(_))
    }

    /// Identity comparison. Two containers are identical when they share the
    /// same allocation; leaves are never identical.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_rich(&self) -> Option<&Rich> {
        match self {
            Value::Rich(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Mutable access to an array, unsharing it first if needed.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(a) => Some(Arc::make_mut(a)),
            _ => None,
        }
    }

    /// Mutable access to an object, unsharing it first if needed.
    pub fn as_object_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Object(o) => Some(Arc::make_mut(o)),
            _ => None,
        }
    }

    /// Number of children of a container; zero for leaves.
    pub fn len(&self) -> usize {
        match self {
            Value::Array(a) => a.len(),
            Value::Object(o) => o.len(),
            _ => 0,
        }
    }

    /// Returns `true` for empty containers and for leaves.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Child at `seg`, if this node is a container that has it.
    pub fn get(&self, seg: &Seg) -> Option<&Value> {
        match (self, seg) {
            (Value::Object(o), Seg::Key(k)) => o.get(k),
            (Value::Array(a), Seg::Index(i)) => a.get(*i),
            _ => None,
        }
    }

    /// Mutable child at `seg`, unsharing this container first.
    pub fn get_mut(&mut self, seg: &Seg) -> Option<&mut Value> {
        match (self, seg) {
            (Value::Object(o), Seg::Key(k)) => Arc::make_mut(o).get_mut(k),
            (Value::Array(a), Seg::Index(i)) => Arc::make_mut(a).get_mut(*i),
            _ => None,
        }
    }

    /// Node at `path`, if every step resolves.
    pub fn pointer(&self, path: &Path) -> Option<&Value> {
        path.segments()
            .iter()
            .try_fold(self, |node, seg| node.get(seg))
    }

    /// Mutable node at `path`, unsharing every container along the way.
    pub fn pointer_mut(&mut self, path: &Path) -> Option<&mut Value> {
        let mut node = self;
        for seg in path.segments() {
            node = node.get_mut(seg)?;
        }
        Some(node)
    }

    /// Append to an array.
    pub fn push(&mut self, value: impl Into<Value>) -> TypeResult<()> {
        let found = self.kind_name();
        let arr = self.as_array_mut().ok_or(TypeError::NotAnArray { found })?;
        arr.push(value.into());
        Ok(())
    }

    /// Remove the last element of an array.
    pub fn pop(&mut self) -> TypeResult<Option<Value>> {
        let found = self.kind_name();
        let arr = self.as_array_mut().ok_or(TypeError::NotAnArray { found })?;
        Ok(arr.pop())
    }

    /// Insert into an array at `index`, shifting later elements.
    pub fn insert_at(&mut self, index: usize, value: impl Into<Value>) -> TypeResult<()> {
        let found = self.kind_name();
        let arr = self.as_array_mut().ok_or(TypeError::NotAnArray { found })?;
        if index > arr.len() {
            return Err(TypeError::IndexOutOfBounds {
                index,
                len: arr.len(),
            });
        }
        arr.insert(index, value.into());
        Ok(())
    }

    /// Remove from an array at `index`, shifting later elements.
    pub fn remove_at(&mut self, index: usize) -> TypeResult<Value> {
        let found = self.kind_name();
        let arr = self.as_array_mut().ok_or(TypeError::NotAnArray { found })?;
        if index >= arr.len() {
            return Err(TypeError::IndexOutOfBounds {
                index,
                len: arr.len(),
            });
        }
        Ok(arr.remove(index))
    }

    /// Set an object key, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> TypeResult<Option<Value>> {
        let found = self.kind_name();
        let obj = self.as_object_mut().ok_or(TypeError::NotAnObject { found })?;
        Ok(obj.insert(key.into(), value.into()))
    }

    /// Remove an object key, keeping the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> TypeResult<Option<Value>> {
        let found = self.kind_name();
        let obj = self.as_object_mut().ok_or(TypeError::NotAnObject { found })?;
        Ok(obj.shift_remove(key))
    }

    /// A copy that shares no container with `self`.
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::Array(a) => Value::Array(Arc::new(a.iter().map(Value::deep_clone).collect())),
            Value::Object(o) => Value::Object(Arc::new(
                o.iter().map(|(k, v)| (k.clone(), v.deep_clone())).collect(),
            )),
            leaf => leaf.clone(),
        }
    }

    /// Convert into a `serde_json::Value`.
    ///
    /// Rich leaves project onto their plain readings: dates and boxed numbers
    /// become numbers, regexes and boxed strings become strings. Non-finite
    /// numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Rich(Rich::Date { ms }) => serde_json::Value::from(*ms),
            Value::Rich(Rich::Num { value }) => number_to_json(*value),
            Value::Rich(r) => serde_json::Value::String(r.to_display()),
            Value::Array(a) => serde_json::Value::Array(a.iter().map(Value::to_json).collect()),
            Value::Object(o) => serde_json::Value::Object(
                o.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if n.is_finite() && n == n.trunc() && n.abs() <= MAX_SAFE {
        if n >= 0.0 {
            return serde_json::Value::from(n as u64);
        }
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn numbers_equal(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => numbers_equal(*a, *b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Rich(a), Value::Rich(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                // Key order is not part of equality.
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            _ => false,
        }
    }
}

impl PartialEq<serde_json::Value> for Value {
    fn eq(&self, other: &serde_json::Value) -> bool {
        *self == Value::from(other.clone())
    }
}

impl Index<&str> for Value {
    type Output = Value;

    /// Missing keys and non-objects read as `Null`.
    fn index(&self, key: &str) -> &Value {
        self.as_object().and_then(|o| o.get(key)).unwrap_or(&NULL)
    }
}

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        self.as_array().and_then(|a| a.get(index)).unwrap_or(&NULL)
    }
}

impl IndexMut<&str> for Value {
    /// A `Null` node turns into an empty object and a missing key is inserted
    /// as `Null`, mirroring `serde_json`.
    ///
    /// # Panics
    ///
    /// Panics when the node is neither an object nor `Null`.
    fn index_mut(&mut self, key: &str) -> &mut Value {
        if self.is_null() {
            *self = Value::object();
        }
        let found = self.kind_name();
        match self.as_object_mut() {
            Some(obj) => obj.entry(key.to_owned()).or_insert(Value::Null),
            None => panic!("cannot index into {found} with key {key:?}"),
        }
    }
}

impl IndexMut<usize> for Value {
    /// Indexing one past the end appends a `Null` slot.
    ///
    /// # Panics
    ///
    /// Panics when the node is not an array or the index is further out.
    fn index_mut(&mut self, index: usize) -> &mut Value {
        let found = self.kind_name();
        match self.as_array_mut() {
            Some(arr) => {
                if index == arr.len() {
                    arr.push(Value::Null);
                }
                let len = arr.len();
                match arr.get_mut(index) {
                    Some(slot) => slot,
                    None => panic!("index {index} out of bounds for array of length {len}"),
                }
            }
            None => panic!("cannot index into {found} with index {index}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Rich> for Value {
    fn from(r: Rich) -> Self {
        Value::Rich(r)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(items))
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(Arc::new(map))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(Arc::new(iter.into_iter().collect()))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => items.into_iter().map(Value::from).collect(),
            serde_json::Value::Object(obj) => Value::Object(Arc::new(
                obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            )),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        value.to_json()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => match number_to_json(*n) {
                serde_json::Value::Number(num) => num.serialize(serializer),
                _ => serializer.serialize_unit(),
            },
            Value::String(s) => serializer.serialize_str(s),
            Value::Rich(_) => self.to_json().serialize(serializer),
            Value::Array(a) => serializer.collect_seq(a.iter()),
            Value::Object(o) => serializer.collect_map(o.iter()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&number_to_string(*n)),
            other => write!(f, "{}", other.to_json()),
        }
    }
}
