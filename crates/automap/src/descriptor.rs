//! Property-level view of a registered type.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::MutexGuard;

use serde::{Deserialize, Serialize};

use automap_model::{Operation, TypeInfo, TypeKey, TypeRef, Value};

use crate::error::{MapError, Result};
use crate::protocol::{ConstructionMode, ConstructionProtocol, ProtocolCache};

/// How setters are recognized on a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SetterConvention {
    /// One-argument operations named `set<Name>`.
    #[default]
    Naming,
    /// One-argument operations named after the property that return the
    /// type itself (or one of its supertypes).
    Fluent,
}

impl fmt::Display for SetterConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Naming => f.write_str("naming"),
            Self::Fluent => f.write_str("fluent"),
        }
    }
}

/// A getter or setter bound to a property name.
#[derive(Debug, Clone)]
pub struct Accessor {
    property: String,
    operation: Operation,
    value_type: TypeRef,
}

impl Accessor {
    pub(crate) fn getter(property: String, operation: Operation) -> Self {
        let value_type = operation.returns().clone();
        Self {
            property,
            operation,
            value_type,
        }
    }

    pub(crate) fn setter(property: String, operation: Operation) -> Self {
        let value_type = operation.params().first().cloned().unwrap_or(TypeRef::Void);
        Self {
            property,
            operation,
            value_type,
        }
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn operation_name(&self) -> &str {
        self.operation.name()
    }

    /// Declared return type for getters, declared parameter type for setters.
    pub fn value_type(&self) -> &TypeRef {
        &self.value_type
    }

    pub fn read(&self, target: &dyn Any) -> automap_model::Result<Value> {
        self.operation.invoke_read(target)
    }

    pub fn write(&self, target: &mut dyn Any, value: Value) -> automap_model::Result<()> {
        self.operation.invoke_write(target, value)
    }
}

/// Getters, setters and memoized construction protocols of one type.
///
/// Descriptors are built once by discovery and shared through the type
/// registry; the accessor maps never change afterwards.
pub struct TypeDescriptor {
    info: &'static TypeInfo,
    convention: SetterConvention,
    getters: BTreeMap<String, Accessor>,
    setters: BTreeMap<String, Accessor>,
    protocols: ProtocolCache,
}

impl TypeDescriptor {
    pub(crate) fn new(
        info: &'static TypeInfo,
        convention: SetterConvention,
        getters: BTreeMap<String, Accessor>,
        setters: BTreeMap<String, Accessor>,
    ) -> Self {
        Self {
            info,
            convention,
            getters,
            setters,
            protocols: ProtocolCache::default(),
        }
    }

    pub fn info(&self) -> &'static TypeInfo {
        self.info
    }

    pub fn key(&self) -> TypeKey {
        self.info.key()
    }

    pub fn type_name(&self) -> &str {
        self.info.name()
    }

    pub fn convention(&self) -> SetterConvention {
        self.convention
    }

    pub fn getters(&self) -> &BTreeMap<String, Accessor> {
        &self.getters
    }

    pub fn setters(&self) -> &BTreeMap<String, Accessor> {
        &self.setters
    }

    pub fn getter(&self, property: &str) -> Option<&Accessor> {
        self.getters.get(property)
    }

    pub fn setter(&self, property: &str) -> Option<&Accessor> {
        self.setters.get(property)
    }

    /// Fails with [`MapError::UnknownProperty`] listing every name that has
    /// no getter.
    pub fn check_getters_contain(&self, properties: &[&str]) -> Result<()> {
        self.check_contains(&self.getters, properties)
    }

    /// Fails with [`MapError::UnknownProperty`] listing every name that has
    /// no setter.
    pub fn check_setters_contain(&self, properties: &[&str]) -> Result<()> {
        self.check_contains(&self.setters, properties)
    }

    /// Properties this type can read that `destination` can write, sorted.
    pub fn mappable_properties(&self, destination: &TypeDescriptor) -> Vec<String> {
        self.getters
            .keys()
            .filter(|property| destination.setters.contains_key(*property))
            .cloned()
            .collect()
    }

    /// Memoized construction protocol for `mode`, if detection already ran.
    pub fn construction_protocol(&self, mode: ConstructionMode) -> Option<&ConstructionProtocol> {
        self.protocols.get(mode)
    }

    pub(crate) fn memoize_protocol(
        &self,
        mode: ConstructionMode,
        protocol: ConstructionProtocol,
    ) -> &ConstructionProtocol {
        self.protocols.get_or_insert(mode, protocol)
    }

    pub(crate) fn lock_protocol_detection(&self) -> MutexGuard<'_, ()> {
        self.protocols.lock_detection()
    }

    fn check_contains(
        &self,
        accessors: &BTreeMap<String, Accessor>,
        properties: &[&str],
    ) -> Result<()> {
        let mut unknown: Vec<String> = Vec::new();
        for property in properties {
            if !accessors.contains_key(*property) && !unknown.iter().any(|seen| seen == property) {
                unknown.push((*property).to_string());
            }
        }
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(MapError::unknown_property(self.type_name(), unknown))
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name())
            .field("convention", &self.convention)
            .field("getters", &self.getters.keys().collect::<Vec<_>>())
            .field("setters", &self.setters.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} setters)", self.type_name(), self.convention)?;
        for (property, getter) in &self.getters {
            write!(
                f,
                "\n  get {property}: {} via {}",
                getter.value_type(),
                getter.operation_name()
            )?;
        }
        for (property, setter) in &self.setters {
            write!(
                f,
                "\n  set {property}: {} via {}",
                setter.value_type(),
                setter.operation_name()
            )?;
        }
        Ok(())
    }
}
