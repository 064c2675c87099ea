//! Type identities and declared slot types.
//!
//! Rust has no runtime reflection, so every type the mapper can see is
//! described up front. This module holds the vocabulary those descriptions
//! are written in:
//!
//! - [`TypeKey`]: identity of a Rust type (its `TypeId` plus its name)
//! - [`TypeKind`]: what sort of type a description stands for
//! - [`ScalarKind`]: the primitive-like scalars with boxed counterparts
//! - [`TypeRef`]: the declared type of a parameter, return value or slot

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::info::{Introspect, TypeInfo};

/// Identity of a Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified Rust type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name with module paths stripped, generics kept.
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }
}

fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment_start);
        } else {
            out.push(c);
            if !(c.is_alphanumeric() || c == '_') {
                segment_start = out.len();
            }
        }
    }
    out
}

/// Sort of type a [`TypeInfo`] describes.
///
/// Only [`TypeKind::Class`] can be instantiated through a default
/// constructor; [`TypeKind::Abstract`] is still acceptable as the declared
/// type of a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TypeKind {
    /// Concrete type.
    #[default]
    Class,
    /// Type that has descendants but no instances of its own.
    Abstract,
    /// Pure contract, never instantiated.
    Interface,
    /// Closed set of values.
    Enum,
    /// Marker type carrying metadata only.
    Annotation,
    /// Primitive scalar.
    Primitive,
    /// Fixed-size sequence.
    Array,
}

impl TypeKind {
    /// True when a value of this kind can be produced by a builder or
    /// factory (abstract types included).
    pub fn is_buildable(self) -> bool {
        matches!(self, Self::Class | Self::Abstract)
    }

    /// True when a value of this kind can be produced by a zero-argument
    /// constructor.
    pub fn is_instantiable(self) -> bool {
        matches!(self, Self::Class)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Abstract => "abstract type",
            Self::Interface => "interface",
            Self::Enum => "enumeration",
            Self::Annotation => "annotation",
            Self::Primitive => "primitive",
            Self::Array => "array",
        }
    }
}

/// Primitive-like scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScalarKind {
    Bool,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl ScalarKind {
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Bool | Self::Char)
    }

    /// Name of the non-nullable primitive form.
    pub fn primitive_name(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Char => "char",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Name of the nullable boxed form.
    pub fn boxed_name(self) -> &'static str {
        match self {
            Self::Bool => "Boolean",
            Self::Char => "Character",
            Self::Byte => "Byte",
            Self::Short => "Short",
            Self::Int => "Integer",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
        }
    }
}

/// Lazily resolved reference to an introspectable type.
///
/// Holds the `describe` function rather than the description itself so that
/// types can refer to each other (a type returning its builder, a builder
/// returning the built type) without initialization cycles.
#[derive(Clone, Copy)]
pub struct TypeHandle(fn() -> &'static TypeInfo);

impl TypeHandle {
    pub fn of<T: Introspect>() -> Self {
        Self(T::describe)
    }

    pub fn info(self) -> &'static TypeInfo {
        (self.0)()
    }

    pub fn key(self) -> TypeKey {
        self.info().key()
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeHandle").field(&self.info().name()).finish()
    }
}

/// Declared type of a parameter, return value or property slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// No value.
    Void,
    /// Top type: holds any non-primitive value.
    Any,
    /// Supertype of every boxed numeric kind.
    Number,
    /// Non-nullable scalar.
    Primitive(ScalarKind),
    /// Nullable scalar.
    Boxed(ScalarKind),
    /// Nullable string.
    Text,
    /// Rust type without an introspection table.
    Opaque(TypeKey),
    /// Introspectable type.
    Class(TypeHandle),
}

impl TypeRef {
    pub fn of<T: Introspect>() -> Self {
        Self::Class(TypeHandle::of::<T>())
    }

    pub fn opaque<T: Any>() -> Self {
        Self::Opaque(TypeKey::of::<T>())
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    /// Description of the referenced type, for [`TypeRef::Class`] only.
    pub fn class_info(&self) -> Option<&'static TypeInfo> {
        match self {
            Self::Class(handle) => Some(handle.info()),
            _ => None,
        }
    }

    /// Plain subtype compatibility: true when a value whose type is `other`
    /// can be held by a slot declared as `self`.
    ///
    /// Primitive scalars are only compatible with themselves; boxing rules
    /// live in the mapper's compatibility checker.
    pub fn is_assignable_from(&self, other: &TypeRef) -> bool {
        if self.is_void() || other.is_void() {
            return false;
        }
        if self == other {
            return true;
        }
        match (self, other) {
            (Self::Any, candidate) => !candidate.is_primitive(),
            (Self::Number, Self::Boxed(kind)) => kind.is_numeric(),
            (Self::Class(target), Self::Class(candidate)) => {
                candidate.info().is_subtype_of(target.key())
            }
            _ => false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Any => f.write_str("Object"),
            Self::Number => f.write_str("Number"),
            Self::Primitive(kind) => f.write_str(kind.primitive_name()),
            Self::Boxed(kind) => f.write_str(kind.boxed_name()),
            Self::Text => f.write_str("String"),
            Self::Opaque(key) => f.write_str(&key.short_name()),
            Self::Class(handle) => f.write_str(handle.info().name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_strips_paths_inside_generics() {
        let key = TypeKey::of::<Vec<String>>();
        assert_eq!(key.short_name(), "Vec<String>");
        assert_eq!(TypeKey::of::<u32>().short_name(), "u32");
    }

    #[test]
    fn any_accepts_everything_but_primitives() {
        assert!(TypeRef::Any.is_assignable_from(&TypeRef::Text));
        assert!(TypeRef::Any.is_assignable_from(&TypeRef::Boxed(ScalarKind::Int)));
        assert!(TypeRef::Any.is_assignable_from(&TypeRef::opaque::<Vec<u8>>()));
        assert!(!TypeRef::Any.is_assignable_from(&TypeRef::Primitive(ScalarKind::Int)));
        assert!(!TypeRef::Any.is_assignable_from(&TypeRef::Void));
    }

    #[test]
    fn number_accepts_boxed_numerics_only() {
        assert!(TypeRef::Number.is_assignable_from(&TypeRef::Boxed(ScalarKind::Long)));
        assert!(TypeRef::Number.is_assignable_from(&TypeRef::Number));
        assert!(!TypeRef::Number.is_assignable_from(&TypeRef::Boxed(ScalarKind::Bool)));
        assert!(!TypeRef::Number.is_assignable_from(&TypeRef::Primitive(ScalarKind::Long)));
        assert!(
            !TypeRef::Boxed(ScalarKind::Int).is_assignable_from(&TypeRef::Boxed(ScalarKind::Long))
        );
    }

    #[test]
    fn display_uses_familiar_names() {
        assert_eq!(TypeRef::Primitive(ScalarKind::Short).to_string(), "short");
        assert_eq!(TypeRef::Boxed(ScalarKind::Int).to_string(), "Integer");
        assert_eq!(TypeRef::Text.to_string(), "String");
        assert_eq!(TypeRef::opaque::<Vec<String>>().to_string(), "Vec<String>");
    }
}
