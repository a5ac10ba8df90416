//! Extracted cell values and group keys.
//!
//! Columns translate an opaque model record into two related things: a
//! [`Value`] used for sorting, and a [`GroupKey`] used for bucketing. A
//! `Value` is a type-erased container in the spirit of a variant cell; a
//! `GroupKey` is the subset of value kinds that admit equality and hashing,
//! with [`GroupKey::Null`] as a first-class "ungrouped" key.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};

use crate::collation::Collation;

/// Type-erased container for an extracted cell value.
///
/// `Value::None` is the explicit missing sentinel: a column that has no
/// answer for a record returns it, and comparators rank it by missingness
/// rather than erroring.
///
/// # Example
///
/// ```
/// use strata::Value;
///
/// let v = Value::from("Engineering");
/// assert_eq!(v.as_str(), Some("Engineering"));
/// assert!(Value::None.is_none());
/// ```
#[derive(Debug, Default)]
pub enum Value {
    /// No value.
    #[default]
    None,
    /// String data.
    String(String),
    /// Integer data.
    Int(i64),
    /// Floating point data.
    Float(f64),
    /// Boolean data.
    Bool(bool),
    /// Timestamp data.
    DateTime(DateTime<Utc>),
    /// Custom data (type-erased). Unordered; compares equal to everything
    /// except the missing sentinel.
    Custom(Box<dyn std::any::Any + Send + Sync>),
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Value::None => Value::None,
            Value::String(s) => Value::String(s.clone()),
            Value::Int(n) => Value::Int(*n),
            Value::Float(n) => Value::Float(*n),
            Value::Bool(b) => Value::Bool(*b),
            Value::DateTime(t) => Value::DateTime(*t),
            // Custom data cannot be cloned; becomes None
            Value::Custom(_) => Value::None,
        }
    }
}

impl Value {
    /// Creates new custom data from any type.
    pub fn new<T: std::any::Any + Send + Sync + 'static>(value: T) -> Self {
        Value::Custom(Box::new(value))
    }

    /// Returns `true` if this is the missing sentinel.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Returns `true` if this contains some data.
    pub fn is_some(&self) -> bool {
        !self.is_none()
    }

    /// Attempts to get the data as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Attempts to get the data as an owned string.
    pub fn into_string(self) -> Option<String> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to get the data as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to get the data as a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to get the data as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to get the data as a timestamp.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(t) => Some(*t),
            _ => None,
        }
    }

    /// Attempts to downcast custom data to the specified type.
    pub fn downcast<T: std::any::Any>(&self) -> Option<&T> {
        match self {
            Value::Custom(data) => data.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::DateTime(t)
    }
}

impl From<Option<String>> for Value {
    fn from(opt: Option<String>) -> Self {
        match opt {
            Some(s) => Value::String(s),
            None => Value::None,
        }
    }
}

/// A float usable as a hash-map key, compared by bit pattern.
#[derive(Debug, Clone, Copy)]
pub struct FloatKey(f64);

impl FloatKey {
    /// Wraps a float for use as a group key.
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Returns the wrapped float.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl PartialEq for FloatKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatKey {}

impl Hash for FloatKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.to_bits());
    }
}

/// Equality-comparable key used to bucket records.
///
/// A key does not need to be orderable, only to admit equality and hashing.
/// [`GroupKey::Null`] denotes the "ungrouped" bucket and is a legal, distinct
/// key in its own right, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// The key for records the group-by column has no answer for.
    Null,
    /// String key.
    String(String),
    /// Integer key.
    Int(i64),
    /// Float key (bit-pattern equality).
    Float(FloatKey),
    /// Boolean key.
    Bool(bool),
    /// Timestamp key.
    DateTime(DateTime<Utc>),
}

impl GroupKey {
    /// Derives a key from an extracted value.
    ///
    /// The conversion is total: the missing sentinel and unordered custom
    /// data both map to [`GroupKey::Null`].
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::None | Value::Custom(_) => GroupKey::Null,
            Value::String(s) => GroupKey::String(s.clone()),
            Value::Int(n) => GroupKey::Int(*n),
            Value::Float(n) => GroupKey::Float(FloatKey::new(*n)),
            Value::Bool(b) => GroupKey::Bool(*b),
            Value::DateTime(t) => GroupKey::DateTime(*t),
        }
    }

    /// Returns `true` for the ungrouped key.
    pub fn is_null(&self) -> bool {
        matches!(self, GroupKey::Null)
    }

    /// Renders the default display label for this key.
    ///
    /// Columns can override this through their key-to-title converter; this
    /// is the fallback rendering. The null key renders as an empty label.
    pub fn to_label(&self) -> String {
        match self {
            GroupKey::Null => String::new(),
            GroupKey::String(s) => s.clone(),
            GroupKey::Int(n) => n.to_string(),
            GroupKey::Float(f) => f.value().to_string(),
            GroupKey::Bool(b) => b.to_string(),
            GroupKey::DateTime(t) => t.to_string(),
        }
    }
}

impl From<&str> for GroupKey {
    fn from(s: &str) -> Self {
        GroupKey::String(s.to_string())
    }
}

impl From<String> for GroupKey {
    fn from(s: String) -> Self {
        GroupKey::String(s)
    }
}

impl From<i64> for GroupKey {
    fn from(n: i64) -> Self {
        GroupKey::Int(n)
    }
}

impl From<bool> for GroupKey {
    fn from(b: bool) -> Self {
        GroupKey::Bool(b)
    }
}

/// Outcome of comparing two values.
///
/// Heterogeneous or unordered operands are reported as an explicit
/// [`ValueOrdering::Incomparable`] branch rather than falling out of a cast;
/// callers decide what tolerance means (the engine maps it to `Equal`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueOrdering {
    /// The operands admit an ordering.
    Ordered(Ordering),
    /// The operands do not admit an ordering (heterogeneous or unordered).
    Incomparable,
}

impl ValueOrdering {
    /// Collapses the tolerant branch to `Equal`.
    pub fn or_equal(self) -> Ordering {
        match self {
            ValueOrdering::Ordered(ord) => ord,
            ValueOrdering::Incomparable => Ordering::Equal,
        }
    }
}

/// Compares two extracted values.
///
/// Missing values rank before any present value (both missing compare
/// equal); direction inversion is the caller's concern and applies to the
/// whole result. Strings compare through the supplied collation; integers
/// and floats cross-compare numerically; other mixed pairs are
/// [`ValueOrdering::Incomparable`].
pub fn compare_values(a: &Value, b: &Value, collation: &dyn Collation) -> ValueOrdering {
    use ValueOrdering::{Incomparable, Ordered};

    match (a, b) {
        (Value::None, Value::None) => Ordered(Ordering::Equal),
        (Value::None, _) => Ordered(Ordering::Less),
        (_, Value::None) => Ordered(Ordering::Greater),
        (Value::String(sa), Value::String(sb)) => Ordered(collation.compare(sa, sb)),
        (Value::Int(ia), Value::Int(ib)) => Ordered(ia.cmp(ib)),
        (Value::Float(fa), Value::Float(fb)) => {
            Ordered(fa.partial_cmp(fb).unwrap_or(Ordering::Equal))
        }
        (Value::Int(ia), Value::Float(fb)) => {
            Ordered((*ia as f64).partial_cmp(fb).unwrap_or(Ordering::Equal))
        }
        (Value::Float(fa), Value::Int(ib)) => {
            Ordered(fa.partial_cmp(&(*ib as f64)).unwrap_or(Ordering::Equal))
        }
        (Value::Bool(ba), Value::Bool(bb)) => Ordered(ba.cmp(bb)),
        (Value::DateTime(ta), Value::DateTime(tb)) => Ordered(ta.cmp(tb)),
        _ => Incomparable,
    }
}

/// Compares two group keys under the same rules as [`compare_values`].
pub fn compare_keys(a: &GroupKey, b: &GroupKey, collation: &dyn Collation) -> ValueOrdering {
    use ValueOrdering::{Incomparable, Ordered};

    match (a, b) {
        (GroupKey::Null, GroupKey::Null) => Ordered(Ordering::Equal),
        (GroupKey::Null, _) => Ordered(Ordering::Less),
        (_, GroupKey::Null) => Ordered(Ordering::Greater),
        (GroupKey::String(sa), GroupKey::String(sb)) => Ordered(collation.compare(sa, sb)),
        (GroupKey::Int(ia), GroupKey::Int(ib)) => Ordered(ia.cmp(ib)),
        (GroupKey::Float(fa), GroupKey::Float(fb)) => Ordered(
            fa.value()
                .partial_cmp(&fb.value())
                .unwrap_or(Ordering::Equal),
        ),
        (GroupKey::Int(ia), GroupKey::Float(fb)) => Ordered(
            (*ia as f64)
                .partial_cmp(&fb.value())
                .unwrap_or(Ordering::Equal),
        ),
        (GroupKey::Float(fa), GroupKey::Int(ib)) => Ordered(
            fa.value()
                .partial_cmp(&(*ib as f64))
                .unwrap_or(Ordering::Equal),
        ),
        (GroupKey::Bool(ba), GroupKey::Bool(bb)) => Ordered(ba.cmp(bb)),
        (GroupKey::DateTime(ta), GroupKey::DateTime(tb)) => Ordered(ta.cmp(tb)),
        _ => Incomparable,
    }
}
