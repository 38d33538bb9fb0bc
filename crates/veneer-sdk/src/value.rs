//! Value: the tagged union that crosses the façade boundary
//!
//! Every argument, result, field and member value in the object model is a
//! `Value`. The variants fall into four groups that the façade translator
//! dispatches on:
//!
//! ```text
//! Entity:    Object(ObjectRef) | Class(ClassRef)    identity-bearing, rewritten
//! Sequence:  Sequence(Vec<Value>)                    rewritten element-wise
//! Async:     Pending(Pending)                        rewritten on settlement
//! Scalar:    Undefined | Null | Bool | Int | Float | Str   passed through
//! ```
//!
//! Equality follows identity for entities and pending results, and value
//! equality for scalars and sequences.

use std::fmt;
use std::sync::Arc;

use crate::class::ClassRef;
use crate::object::ObjectRef;
use crate::pending::Pending;

/// A dynamically typed value of the object model.
#[derive(Clone, Default)]
pub enum Value {
    /// No value (absent member, missing argument, unbound receiver)
    #[default]
    Undefined,
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// Immutable shared string
    Str(Arc<str>),
    /// Class instance
    Object(ObjectRef),
    /// Class value
    Class(ClassRef),
    /// Ordered sequence
    Sequence(Vec<Value>),
    /// Pending asynchronous result
    Pending(Pending),
}

impl Value {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create the undefined value
    #[inline]
    pub const fn undefined() -> Self {
        Value::Undefined
    }

    /// Create a null value
    #[inline]
    pub const fn null() -> Self {
        Value::Null
    }

    /// Create a boolean value
    #[inline]
    pub const fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Create an integer value
    #[inline]
    pub const fn int(i: i64) -> Self {
        Value::Int(i)
    }

    /// Create a float value
    #[inline]
    pub const fn float(f: f64) -> Self {
        Value::Float(f)
    }

    /// Create a string value
    #[inline]
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// Create a sequence from any iterator of values
    pub fn sequence<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }

    // ========================================================================
    // Type checks
    // ========================================================================

    /// Check if value is undefined
    #[inline]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if value is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if value carries no payload (undefined or null)
    #[inline]
    pub const fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Check if value is a scalar (never rewritten by translation)
    #[inline]
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Undefined
                | Value::Null
                | Value::Bool(_)
                | Value::Int(_)
                | Value::Float(_)
                | Value::Str(_)
        )
    }

    /// Check if value is an object instance
    #[inline]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Check if value is a class
    #[inline]
    pub const fn is_class(&self) -> bool {
        matches!(self, Value::Class(_))
    }

    // ========================================================================
    // Extractors
    // ========================================================================

    /// Extract boolean value
    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract integer value
    #[inline]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract float value (integers widen)
    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Extract string slice
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Extract object reference
    #[inline]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Extract class reference
    #[inline]
    pub fn as_class(&self) -> Option<&ClassRef> {
        match self {
            Value::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Extract sequence elements
    #[inline]
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Extract pending result
    #[inline]
    pub fn as_pending(&self) -> Option<&Pending> {
        match self {
            Value::Pending(p) => Some(p),
            _ => None,
        }
    }

    /// Get type name for diagnostics
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
            Value::Class(_) => "class",
            Value::Sequence(_) => "sequence",
            Value::Pending(_) => "pending",
        }
    }

    /// Describe the value for error messages (includes the class name for entities)
    pub fn describe(&self) -> String {
        match self {
            Value::Object(obj) => format!("instance of {}", obj.class().name()),
            Value::Class(class) => format!("class {}", class.name()),
            other => other.type_name().to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Pending(a), Value::Pending(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Value::Undefined"),
            Value::Null => write!(f, "Value::Null"),
            Value::Bool(b) => write!(f, "Value::Bool({})", b),
            Value::Int(i) => write!(f, "Value::Int({})", i),
            Value::Float(x) => write!(f, "Value::Float({})", x),
            Value::Str(s) => write!(f, "Value::Str({:?})", s),
            Value::Object(obj) => write!(f, "Value::Object({}{})", obj.class().name(), obj.id()),
            Value::Class(class) => write!(f, "Value::Class({})", class.name()),
            Value::Sequence(items) => f.debug_list().entries(items).finish(),
            Value::Pending(p) => write!(f, "Value::Pending({:?})", p),
        }
    }
}

// ============================================================================
// Conversions into Value
// ============================================================================

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Undefined
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into())
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<&ObjectRef> for Value {
    fn from(obj: &ObjectRef) -> Self {
        Value::Object(obj.clone())
    }
}

impl From<ClassRef> for Value {
    fn from(class: ClassRef) -> Self {
        Value::Class(class)
    }
}

impl From<&ClassRef> for Value {
    fn from(class: &ClassRef) -> Self {
        Value::Class(class.clone())
    }
}

impl From<Pending> for Value {
    fn from(p: Pending) -> Self {
        Value::Pending(p)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Undefined)
    }
}
