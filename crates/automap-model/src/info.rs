//! Type descriptions and the traits that expose them.
//!
//! A [`TypeInfo`] is the static operation table of one Rust type: its name,
//! kind, supertypes, optional zero-argument constructor and public
//! operations. Types expose their table by implementing [`Introspect`],
//! usually through the [`introspect!`](crate::introspect) macro:
//!
//! ```
//! use automap_model::{TypeRef, introspect};
//!
//! #[derive(Default)]
//! struct Person {
//!     name: Option<String>,
//! }
//!
//! introspect!(Person, |b| b
//!     .default_constructor()
//!     .read("getName", TypeRef::Text, |p: &Person| p.name.clone())
//!     .write("setName", TypeRef::Text, |p: &mut Person, v: Option<String>| p.name = v));
//! ```

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{InvokeError, Result};
use crate::operation::{CreateFn, Operation, ReadFn, WriteFn};
use crate::types::{TypeHandle, TypeKey, TypeKind, TypeRef};
use crate::value::{FromValue, IntoValue, Value};

/// Runtime view of an introspectable value.
///
/// Implemented for every [`Introspect`] type; used as `&dyn Reflect`,
/// `&mut dyn Reflect` and `Box<dyn Reflect>` wherever the concrete type is
/// only known at run time.
pub trait Reflect: Any + Send + Sync {
    fn type_info(&self) -> &'static TypeInfo;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// A type with a static operation table.
pub trait Introspect: Any + Send + Sync + Sized {
    fn describe() -> &'static TypeInfo;
}

impl<T: Introspect> Reflect for T {
    fn type_info(&self) -> &'static TypeInfo {
        T::describe()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl dyn Reflect {
    pub fn is<T: Introspect>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Introspect>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Introspect>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    pub fn downcast<T: Introspect>(self: Box<Self>) -> Option<Box<T>> {
        self.into_any().downcast::<T>().ok()
    }
}

impl fmt::Debug for dyn Reflect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reflect").field(&self.type_info().name()).finish()
    }
}

/// Static operation table of a type.
pub struct TypeInfo {
    key: TypeKey,
    handle: TypeHandle,
    name: String,
    kind: TypeKind,
    supertypes: Vec<TypeHandle>,
    constructor: Option<CreateFn>,
    operations: Vec<Operation>,
}

impl TypeInfo {
    pub fn builder<T: Introspect>(name: impl Into<String>) -> TypeInfoBuilder<T> {
        TypeInfoBuilder {
            info: TypeInfo {
                key: TypeKey::of::<T>(),
                handle: TypeHandle::of::<T>(),
                name: name.into(),
                kind: TypeKind::Class,
                supertypes: Vec::new(),
                constructor: None,
                operations: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn type_ref(&self) -> TypeRef {
        TypeRef::Class(self.handle)
    }

    /// Direct supertypes, in declaration order.
    pub fn supertypes(&self) -> &[TypeHandle] {
        &self.supertypes
    }

    /// Public operations, in declaration order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// First operation declared with the given name.
    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name() == name)
    }

    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Invokes the zero-argument constructor.
    pub fn instantiate(&self) -> Result<Box<dyn Reflect>> {
        match &self.constructor {
            Some(create) => create(),
            None => Err(InvokeError::NotInvocable {
                name: self.name.clone(),
                shape: "constructor",
            }),
        }
    }

    /// True when this type is `key` or has it among its transitive supertypes.
    pub fn is_subtype_of(&self, key: TypeKey) -> bool {
        self.key == key
            || self
                .supertypes
                .iter()
                .any(|parent| parent.info().is_subtype_of(key))
    }

    /// Transitive supertypes, nearest first, each listed once.
    pub fn ancestors(&self) -> Vec<&'static TypeInfo> {
        let mut seen = HashSet::new();
        let mut out: Vec<&'static TypeInfo> = Vec::new();
        let mut queue: Vec<TypeHandle> = self.supertypes.clone();
        let mut idx = 0;
        while idx < queue.len() {
            let info = queue[idx].info();
            idx += 1;
            if seen.insert(info.key()) {
                out.push(info);
                queue.extend_from_slice(info.supertypes());
            }
        }
        out
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("operations", &self.operations)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`TypeInfo`] describing `T`.
///
/// Operations are declared with their signature and a typed closure; the
/// closure is wrapped so that it can be invoked on a `dyn Any` receiver.
pub struct TypeInfoBuilder<T> {
    info: TypeInfo,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Introspect> TypeInfoBuilder<T> {
    pub fn kind(mut self, kind: TypeKind) -> Self {
        self.info.kind = kind;
        self
    }

    pub fn supertype<S: Introspect>(mut self) -> Self {
        self.info.supertypes.push(TypeHandle::of::<S>());
        self
    }

    pub fn constructor<F>(mut self, create: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let body: CreateFn = Arc::new(move || Ok(Box::new(create()) as Box<dyn Reflect>));
        self.info.constructor = Some(body);
        self
    }

    /// Constructor that may fail when invoked.
    pub fn try_constructor<F>(mut self, create: F) -> Self
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        let body: CreateFn = Arc::new(move || Ok(Box::new(create()?) as Box<dyn Reflect>));
        self.info.constructor = Some(body);
        self
    }

    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(T::default)
    }

    /// Zero-argument instance operation returning `returns`.
    pub fn read<V, F>(mut self, name: &str, returns: TypeRef, read: F) -> Self
    where
        V: IntoValue,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let body: ReadFn = Arc::new(move |receiver: &dyn Any| {
            let target = receiver
                .downcast_ref::<T>()
                .ok_or(InvokeError::WrongReceiver {
                    expected: std::any::type_name::<T>(),
                })?;
            Ok(read(target).into_value())
        });
        self.info
            .operations
            .push(Operation::reader(name, returns, body));
        self
    }

    /// One-argument instance operation returning nothing.
    pub fn write<V, F>(self, name: &str, param: TypeRef, write: F) -> Self
    where
        V: FromValue,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.push_writer(name, param, TypeRef::Void, move |target: &mut T, value: V| {
            write(target, value);
            Ok(())
        })
    }

    /// One-argument instance operation that may fail.
    pub fn try_write<V, F>(self, name: &str, param: TypeRef, write: F) -> Self
    where
        V: FromValue,
        F: Fn(&mut T, V) -> Result<()> + Send + Sync + 'static,
    {
        self.push_writer(name, param, TypeRef::Void, write)
    }

    /// One-argument instance operation declared to return `T` itself.
    pub fn fluent<V, F>(self, name: &str, param: TypeRef, write: F) -> Self
    where
        V: FromValue,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.chain(name, param, TypeRef::of::<T>(), write)
    }

    /// One-argument instance operation declared to return `returns`, which
    /// is typically a supertype of `T`.
    pub fn chain<V, F>(self, name: &str, param: TypeRef, returns: TypeRef, write: F) -> Self
    where
        V: FromValue,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.push_writer(name, param, returns, move |target: &mut T, value: V| {
            write(target, value);
            Ok(())
        })
    }

    /// Zero-argument static operation returning a new `B`.
    pub fn factory<B, F>(mut self, name: &str, create: F) -> Self
    where
        B: Introspect,
        F: Fn() -> B + Send + Sync + 'static,
    {
        let body: CreateFn = Arc::new(move || Ok(Box::new(create()) as Box<dyn Reflect>));
        self.info
            .operations
            .push(Operation::factory(name, TypeRef::of::<B>(), body));
        self
    }

    /// Zero-argument static operation declared to return `returns` whose
    /// instances are only known at run time.
    pub fn dyn_factory<F>(mut self, name: &str, returns: TypeRef, create: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Reflect>> + Send + Sync + 'static,
    {
        let body: CreateFn = Arc::new(create);
        self.info
            .operations
            .push(Operation::factory(name, returns, body));
        self
    }

    /// Adds a ready-made operation, typically [`Operation::declared`].
    pub fn operation(mut self, operation: Operation) -> Self {
        self.info.operations.push(operation);
        self
    }

    pub fn build(self) -> TypeInfo {
        self.info
    }

    fn push_writer<V, F>(mut self, name: &str, param: TypeRef, returns: TypeRef, write: F) -> Self
    where
        V: FromValue,
        F: Fn(&mut T, V) -> Result<()> + Send + Sync + 'static,
    {
        let body: WriteFn = Arc::new(move |receiver: &mut dyn Any, value: Value| {
            let converted = V::from_value(value)?;
            let target = receiver
                .downcast_mut::<T>()
                .ok_or(InvokeError::WrongReceiver {
                    expected: std::any::type_name::<T>(),
                })?;
            write(target, converted)
        });
        self.info
            .operations
            .push(Operation::writer(name, param, returns, body));
        self
    }
}

/// Implements [`Introspect`] for a type from a builder expression.
///
/// The closure-like argument receives a fresh [`TypeInfoBuilder`] named
/// after the type; the macro calls `build()` on the result and caches the
/// table for the lifetime of the process.
#[macro_export]
macro_rules! introspect {
    ($ty:ty, |$builder:ident| $body:expr) => {
        impl $crate::Introspect for $ty {
            fn describe() -> &'static $crate::TypeInfo {
                static INFO: ::std::sync::OnceLock<$crate::TypeInfo> =
                    ::std::sync::OnceLock::new();
                INFO.get_or_init(|| {
                    let $builder = $crate::TypeInfo::builder::<$ty>(stringify!($ty));
                    $body.build()
                })
            }
        }
    };
}
