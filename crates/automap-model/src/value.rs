//! Dynamic values flowing between accessors.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::InvokeError;
use crate::info::Introspect;
use crate::types::{ScalarKind, TypeRef};

/// Value of a slot declared as [`TypeRef::Number`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Number {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl Number {
    pub fn kind(self) -> ScalarKind {
        match self {
            Self::Byte(_) => ScalarKind::Byte,
            Self::Short(_) => ScalarKind::Short,
            Self::Int(_) => ScalarKind::Int,
            Self::Long(_) => ScalarKind::Long,
            Self::Float(_) => ScalarKind::Float,
            Self::Double(_) => ScalarKind::Double,
        }
    }
}

/// Shared reference to a non-scalar value together with its runtime type.
///
/// Equality is identity: two object values are equal when they point at the
/// same allocation.
#[derive(Clone)]
pub struct ObjectValue {
    type_ref: TypeRef,
    data: Arc<dyn Any + Send + Sync>,
}

impl ObjectValue {
    pub fn new<T: Any + Send + Sync>(type_ref: TypeRef, value: T) -> Self {
        Self::from_arc(type_ref, Arc::new(value))
    }

    pub fn from_arc<T: Any + Send + Sync>(type_ref: TypeRef, value: Arc<T>) -> Self {
        Self {
            type_ref,
            data: value,
        }
    }

    /// Wraps a value of a type that has no introspection table.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Self::new(TypeRef::opaque::<T>(), value)
    }

    /// Wraps a value of an introspectable type.
    pub fn class<T: Introspect>(value: T) -> Self {
        Self::new(TypeRef::of::<T>(), value)
    }

    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.data).downcast::<T>().ok()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl PartialEq for ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectValue")
            .field("type", &self.type_ref.to_string())
            .finish_non_exhaustive()
    }
}

/// A value read from, or written to, a property.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Object(ObjectValue),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Self::Bool(_) => Some(ScalarKind::Bool),
            Self::Char(_) => Some(ScalarKind::Char),
            Self::Byte(_) => Some(ScalarKind::Byte),
            Self::Short(_) => Some(ScalarKind::Short),
            Self::Int(_) => Some(ScalarKind::Int),
            Self::Long(_) => Some(ScalarKind::Long),
            Self::Float(_) => Some(ScalarKind::Float),
            Self::Double(_) => Some(ScalarKind::Double),
            Self::Null | Self::Text(_) | Self::Object(_) => None,
        }
    }

    /// Runtime type of a value read from a slot declared as `declared`.
    ///
    /// A scalar read from a primitive slot of the same kind stays primitive;
    /// any other scalar is boxed. `Null` carries no type of its own and
    /// takes the declared one.
    pub fn runtime_type(&self, declared: &TypeRef) -> TypeRef {
        if let Some(kind) = self.scalar_kind() {
            return if *declared == TypeRef::Primitive(kind) {
                TypeRef::Primitive(kind)
            } else {
                TypeRef::Boxed(kind)
            };
        }
        match self {
            Self::Text(_) => TypeRef::Text,
            Self::Object(object) => object.type_ref().clone(),
            _ => declared.clone(),
        }
    }

    /// Short description of the value's shape, used in error messages.
    pub fn type_label(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Text(_) => "String".to_string(),
            Self::Object(object) => object.type_ref().to_string(),
            scalar => scalar
                .scalar_kind()
                .map(|kind| kind.boxed_name().to_string())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Short(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Object(object) => write!(f, "<{}>", object.type_ref()),
        }
    }
}

/// Conversion of a Rust value into a [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Conversion of a [`Value`] back into a Rust value.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, InvokeError>;
}

macro_rules! scalar_conversions {
    ($($ty:ty => $variant:ident, $kind:expr;)*) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, InvokeError> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        Value::Null => Err(InvokeError::NullValue {
                            expected: $kind.primitive_name(),
                        }),
                        other => Err(InvokeError::TypeMismatch {
                            expected: $kind.primitive_name(),
                            found: other.type_label(),
                        }),
                    }
                }
            }
        )*
    };
}

scalar_conversions! {
    bool => Bool, ScalarKind::Bool;
    char => Char, ScalarKind::Char;
    i8 => Byte, ScalarKind::Byte;
    i16 => Short, ScalarKind::Short;
    i32 => Int, ScalarKind::Int;
    i64 => Long, ScalarKind::Long;
    f32 => Float, ScalarKind::Float;
    f64 => Double, ScalarKind::Double;
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Null, IntoValue::into_value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, InvokeError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Text(self.to_owned())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, InvokeError> {
        match value {
            Value::Text(text) => Ok(text),
            Value::Null => Err(InvokeError::NullValue { expected: "String" }),
            other => Err(InvokeError::TypeMismatch {
                expected: "String",
                found: other.type_label(),
            }),
        }
    }
}

impl IntoValue for Number {
    fn into_value(self) -> Value {
        match self {
            Self::Byte(v) => Value::Byte(v),
            Self::Short(v) => Value::Short(v),
            Self::Int(v) => Value::Int(v),
            Self::Long(v) => Value::Long(v),
            Self::Float(v) => Value::Float(v),
            Self::Double(v) => Value::Double(v),
        }
    }
}

impl FromValue for Number {
    fn from_value(value: Value) -> Result<Self, InvokeError> {
        match value {
            Value::Byte(v) => Ok(Self::Byte(v)),
            Value::Short(v) => Ok(Self::Short(v)),
            Value::Int(v) => Ok(Self::Int(v)),
            Value::Long(v) => Ok(Self::Long(v)),
            Value::Float(v) => Ok(Self::Float(v)),
            Value::Double(v) => Ok(Self::Double(v)),
            Value::Null => Err(InvokeError::NullValue { expected: "Number" }),
            other => Err(InvokeError::TypeMismatch {
                expected: "Number",
                found: other.type_label(),
            }),
        }
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, InvokeError> {
        Ok(value)
    }
}

impl IntoValue for ObjectValue {
    fn into_value(self) -> Value {
        Value::Object(self)
    }
}

impl FromValue for ObjectValue {
    fn from_value(value: Value) -> Result<Self, InvokeError> {
        match value {
            Value::Object(object) => Ok(object),
            Value::Null => Err(InvokeError::NullValue { expected: "Object" }),
            other => Err(InvokeError::TypeMismatch {
                expected: "Object",
                found: other.type_label(),
            }),
        }
    }
}

/// Shared values are carried as opaque objects. Values of introspectable
/// types should be wrapped with [`ObjectValue::class`] instead so that their
/// class hierarchy takes part in compatibility checks.
impl<T: Any + Send + Sync> IntoValue for Arc<T> {
    fn into_value(self) -> Value {
        Value::Object(ObjectValue::from_arc(TypeRef::opaque::<T>(), self))
    }
}

impl<T: Any + Send + Sync> FromValue for Arc<T> {
    fn from_value(value: Value) -> Result<Self, InvokeError> {
        let expected = std::any::type_name::<T>();
        match value {
            Value::Object(object) => {
                object
                    .downcast_arc::<T>()
                    .ok_or_else(|| InvokeError::TypeMismatch {
                        expected,
                        found: object.type_ref().to_string(),
                    })
            }
            Value::Null => Err(InvokeError::NullValue { expected }),
            other => Err(InvokeError::TypeMismatch {
                expected,
                found: other.type_label(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_runtime_type_depends_on_declared_slot() {
        let value = Value::Short(7);
        assert_eq!(
            value.runtime_type(&TypeRef::Primitive(ScalarKind::Short)),
            TypeRef::Primitive(ScalarKind::Short)
        );
        assert_eq!(
            value.runtime_type(&TypeRef::Number),
            TypeRef::Boxed(ScalarKind::Short)
        );
        assert_eq!(
            Value::Null.runtime_type(&TypeRef::Boxed(ScalarKind::Int)),
            TypeRef::Boxed(ScalarKind::Int)
        );
    }

    #[test]
    fn primitive_conversion_rejects_null() {
        assert_eq!(
            i16::from_value(Value::Null),
            Err(InvokeError::NullValue { expected: "short" })
        );
        assert_eq!(Option::<i16>::from_value(Value::Null), Ok(None));
        assert_eq!(Option::<i16>::from_value(Value::Short(3)), Ok(Some(3)));
    }

    #[test]
    fn scalar_conversion_does_not_widen() {
        let err = i32::from_value(Value::Long(1)).unwrap_err();
        assert_eq!(
            err,
            InvokeError::TypeMismatch {
                expected: "int",
                found: "Long".to_string()
            }
        );
    }

    #[test]
    fn number_accepts_any_numeric_variant() {
        assert_eq!(Number::from_value(Value::Int(4)), Ok(Number::Int(4)));
        assert_eq!(Number::from_value(Value::Double(0.5)), Ok(Number::Double(0.5)));
        assert!(Number::from_value(Value::Bool(true)).is_err());
        assert_eq!(Number::Long(9).into_value(), Value::Long(9));
    }

    #[test]
    fn shared_objects_round_trip_by_identity() {
        let list = Arc::new(vec!["foo".to_string()]);
        let value = Arc::clone(&list).into_value();
        assert_eq!(
            value.runtime_type(&TypeRef::Any),
            TypeRef::opaque::<Vec<String>>()
        );
        let back = Arc::<Vec<String>>::from_value(value).unwrap();
        assert!(Arc::ptr_eq(&list, &back));
        assert!(Arc::<Vec<u8>>::from_value(Arc::clone(&list).into_value()).is_err());
    }

    #[test]
    fn number_serializes_with_its_kind() {
        let json = serde_json::to_string(&Number::Int(3)).unwrap();
        assert_eq!(json, r#"{"Int":3}"#);
    }
}
