//! Dynamic Values
//!
//! Reactive wrappers, refs and props all carry [`Value`]s. Composite values
//! ([`Object`]) are shared and identity-bearing: two clones of the same
//! object are the same target as far as dependency tracking is concerned.
//!
//! # Equality
//!
//! Change detection uses "same value" semantics (see [`same_value`]):
//! scalars compare by value, everything else by identity. `PartialEq` on
//! `Value` follows the same rule.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use tracing::warn;

use crate::reactive::{Reactive, Ref};

/// Most `Null` slots a single array write may pad in.
pub const MAX_ARRAY_GAP: usize = 1 << 16;

/// A property key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Name(Rc<str>),
    Index(usize),
}

impl Key {
    /// The synthetic key arrays expose for their length.
    pub fn length() -> Self {
        Key::Name(Rc::from("length"))
    }

    fn is_length(&self) -> bool {
        matches!(self, Key::Name(name) if &**name == "length")
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(Rc::from(name))
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(Rc::from(name))
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Unique identifier for a composite object.
///
/// Used as the target half of a dependency-graph entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug)]
enum Shape {
    Map(IndexMap<Key, Value>),
    Array(Vec<Value>),
}

#[derive(Debug)]
struct ObjectInner {
    id: ObjectId,
    data: RefCell<Shape>,
}

/// A shared composite value: an insertion-ordered map or an array.
///
/// Reads and writes on an `Object` are raw: they neither track nor
/// notify. Go through [`Reactive`] for that.
#[derive(Clone)]
pub struct Object(Rc<ObjectInner>);

impl Object {
    fn with_shape(shape: Shape) -> Self {
        Self(Rc::new(ObjectInner {
            id: ObjectId::new(),
            data: RefCell::new(shape),
        }))
    }

    /// Create an empty map-shaped object.
    pub fn new() -> Self {
        Self::with_shape(Shape::Map(IndexMap::new()))
    }

    /// Create an empty array.
    pub fn array() -> Self {
        Self::with_shape(Shape::Array(Vec::new()))
    }

    /// Create a map-shaped object from key/value pairs.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::with_shape(Shape::Map(map))
    }

    /// Create an array from a sequence of values.
    pub fn from_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::with_shape(Shape::Array(values.into_iter().map(Into::into).collect()))
    }

    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    pub fn is_array(&self) -> bool {
        matches!(*self.0.data.borrow(), Shape::Array(_))
    }

    /// Number of entries (map) or elements (array).
    pub fn len(&self) -> usize {
        match &*self.0.data.borrow() {
            Shape::Map(map) => map.len(),
            Shape::Array(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw read. Arrays answer `length` and index keys only.
    pub fn get(&self, key: &Key) -> Option<Value> {
        match &*self.0.data.borrow() {
            Shape::Map(map) => map.get(key).cloned(),
            Shape::Array(items) => match key {
                Key::Index(index) => items.get(*index).cloned(),
                key if key.is_length() => Some(Value::Int(items.len() as i64)),
                Key::Name(_) => None,
            },
        }
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        match &*self.0.data.borrow() {
            Shape::Map(map) => map.contains_key(key),
            Shape::Array(items) => match key {
                Key::Index(index) => *index < items.len(),
                key => key.is_length(),
            },
        }
    }

    /// Raw write, returning the previous value.
    ///
    /// Writing past the end of an array pads it with `Null`, up to
    /// [`MAX_ARRAY_GAP`] slots; writes further out are dropped with a
    /// warning. Named keys other than `length` are ignored on arrays.
    pub fn insert(&self, key: Key, value: Value) -> Option<Value> {
        match &mut *self.0.data.borrow_mut() {
            Shape::Map(map) => map.insert(key, value),
            Shape::Array(items) => match key {
                Key::Index(index) => {
                    if index - items.len().min(index) > MAX_ARRAY_GAP {
                        warn!(
                            target: "sprig::value",
                            index,
                            len = items.len(),
                            "array write too far past the end, dropped"
                        );
                        None
                    } else if index >= items.len() {
                        items.resize(index + 1, Value::Null);
                        items[index] = value;
                        None
                    } else {
                        Some(std::mem::replace(&mut items[index], value))
                    }
                }
                Key::Name(_) => None,
            },
        }
    }

    /// Raw removal. Arrays do not support removal by key.
    pub fn remove(&self, key: &Key) -> Option<Value> {
        match &mut *self.0.data.borrow_mut() {
            Shape::Map(map) => map.shift_remove(key),
            Shape::Array(_) => None,
        }
    }

    /// Keys in insertion (map) or index (array) order.
    pub fn keys(&self) -> Vec<Key> {
        match &*self.0.data.borrow() {
            Shape::Map(map) => map.keys().cloned().collect(),
            Shape::Array(items) => (0..items.len()).map(Key::Index).collect(),
        }
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.0.id)
            .field("data", &self.0.data.borrow())
            .finish()
    }
}

/// A callable value, used for event-handler props and `emit`.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&[Value])>);

impl Handler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn call(&self, args: &[Value]) {
        (self.0)(args)
    }

    pub fn ptr_eq(&self, other: &Handler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0))
    }
}

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    /// A raw composite.
    Object(Object),
    /// A tracking or read-only view over a composite.
    Reactive(Reactive),
    /// A reactive cell stored inside some state.
    Ref(Ref),
    Handler(Handler),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Objects and wrappers over objects are composite.
    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Reactive(_))
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
            Value::Reactive(_) => "reactive",
            Value::Ref(_) => "ref",
            Value::Handler(_) => "handler",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reactive(&self) -> Option<&Reactive> {
        match self {
            Value::Reactive(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_ref_cell(&self) -> Option<&Ref> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Value::Handler(h) => Some(h),
            _ => None,
        }
    }
}

/// "Same value" comparison used for change detection.
///
/// Numbers follow IEEE identity rather than IEEE equality: `NaN` is the
/// same as `NaN`, and `0.0` is not the same as `-0.0`. An `Int` is never
/// the same as a `Float`.
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => {
            if x.is_nan() && y.is_nan() {
                true
            } else {
                x == y && x.is_sign_negative() == y.is_sign_negative()
            }
        }
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Object(x), Value::Object(y)) => x.ptr_eq(y),
        (Value::Reactive(x), Value::Reactive(y)) => x == y,
        (Value::Ref(x), Value::Ref(y)) => x.ptr_eq(y),
        (Value::Handler(x), Value::Handler(y)) => x.ptr_eq(y),
        _ => false,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        same_value(self, other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Object(o) => write!(f, "Object({:?})", o.id()),
            Value::Reactive(r) => r.fmt(f),
            Value::Ref(r) => r.fmt(f),
            Value::Handler(h) => h.fmt(f),
        }
    }
}

/// Text interpolation form. Refs show their current value without tracking.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Object(_) | Value::Reactive(_) => f.write_str("[object Object]"),
            Value::Ref(r) => write!(f, "{}", r.get_untracked()),
            Value::Handler(_) => f.write_str("[function]"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Reactive> for Value {
    fn from(r: Reactive) -> Self {
        Value::Reactive(r)
    }
}

impl From<Ref> for Value {
    fn from(r: Ref) -> Self {
        Value::Ref(r)
    }
}

impl From<Handler> for Value {
    fn from(h: Handler) -> Self {
        Value::Handler(h)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
