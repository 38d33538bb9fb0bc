//! Conversions from [`Value`] into Rust types
//!
//! Method and constructor bodies receive `&[Value]`. [`arg`] extracts a typed
//! argument by position:
//!
//! ```ignore
//! .method("increment", |this, args| {
//!     let by: i64 = arg(args, 0)?;
//!     ...
//! })
//! ```
//!
//! Conversions into `Value` live next to the type as `From` impls.

use crate::class::ClassRef;
use crate::error::{FacadeError, FacadeResult};
use crate::object::ObjectRef;
use crate::pending::Pending;
use crate::value::Value;

/// Convert from a [`Value`] to a Rust type.
///
/// Implement this trait to allow a type to be received as an argument.
pub trait FromValue: Sized {
    /// Convert, returning `TypeMismatch` if the variant doesn't match
    fn from_value(value: &Value) -> FacadeResult<Self>;
}

fn mismatch(expected: &str, got: &Value) -> FacadeError {
    FacadeError::TypeMismatch {
        expected: expected.to_string(),
        got: got.describe(),
    }
}

// ============================================================================
// Scalar Implementations
// ============================================================================

impl FromValue for Value {
    fn from_value(value: &Value) -> FacadeResult<Self> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> FacadeResult<Self> {
        value.as_int().ok_or_else(|| mismatch("int", value))
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> FacadeResult<Self> {
        value
            .as_int()
            .and_then(|i| i32::try_from(i).ok())
            .ok_or_else(|| mismatch("i32", value))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> FacadeResult<Self> {
        value.as_float().ok_or_else(|| mismatch("float", value))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> FacadeResult<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> FacadeResult<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("string", value))
    }
}

// ============================================================================
// Entity Implementations
// ============================================================================

impl FromValue for ObjectRef {
    fn from_value(value: &Value) -> FacadeResult<Self> {
        value.as_object().cloned().ok_or_else(|| mismatch("object", value))
    }
}

impl FromValue for ClassRef {
    fn from_value(value: &Value) -> FacadeResult<Self> {
        value.as_class().cloned().ok_or_else(|| mismatch("class", value))
    }
}

impl FromValue for Pending {
    fn from_value(value: &Value) -> FacadeResult<Self> {
        value
            .as_pending()
            .cloned()
            .ok_or_else(|| mismatch("pending", value))
    }
}

// ============================================================================
// Containers
// ============================================================================

// Undefined and null both map to None
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> FacadeResult<Self> {
        if value.is_nullish() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> FacadeResult<Self> {
        value
            .as_sequence()
            .ok_or_else(|| mismatch("sequence", value))?
            .iter()
            .map(T::from_value)
            .collect()
    }
}

/// Extract argument `index`, treating a missing argument as undefined.
pub fn arg<T: FromValue>(args: &[Value], index: usize) -> FacadeResult<T> {
    let value = args.get(index).unwrap_or(&Value::Undefined);
    T::from_value(value).map_err(|e| match e {
        FacadeError::TypeMismatch { expected, got } => {
            FacadeError::ArgumentError(format!("argument {}: expected {}, got {}", index, expected, got))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(i64::from_value(&Value::int(7)).unwrap(), 7);
        assert_eq!(i32::from_value(&Value::int(7)).unwrap(), 7);
        assert!(i32::from_value(&Value::int(i64::MAX)).is_err());
        assert_eq!(f64::from_value(&Value::int(2)).unwrap(), 2.0);
        assert!(bool::from_value(&Value::bool(true)).unwrap());
        assert_eq!(String::from_value(&Value::string("hi")).unwrap(), "hi");
    }

    #[test]
    fn test_mismatch_describes_value() {
        let err = i64::from_value(&Value::string("x")).unwrap_err();
        assert_eq!(
            err,
            FacadeError::TypeMismatch {
                expected: "int".to_string(),
                got: "string".to_string(),
            }
        );
    }

    #[test]
    fn test_option_and_vec() {
        assert_eq!(Option::<i64>::from_value(&Value::Undefined).unwrap(), None);
        assert_eq!(Option::<i64>::from_value(&Value::Null).unwrap(), None);
        assert_eq!(Option::<i64>::from_value(&Value::int(1)).unwrap(), Some(1));

        let seq = Value::sequence([1i64, 2, 3]);
        assert_eq!(Vec::<i64>::from_value(&seq).unwrap(), vec![1, 2, 3]);
        assert!(Vec::<i64>::from_value(&Value::sequence([Value::Null])).is_err());
    }

    #[test]
    fn test_arg_positions() {
        let args = [Value::int(5), Value::string("x")];
        assert_eq!(arg::<i64>(&args, 0).unwrap(), 5);
        assert_eq!(arg::<Option<i64>>(&args, 2).unwrap(), None);

        match arg::<i64>(&args, 1) {
            Err(FacadeError::ArgumentError(msg)) => {
                assert_eq!(msg, "argument 1: expected int, got string")
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(arg::<i64>(&args, 3).is_err());
    }
}
