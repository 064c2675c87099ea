//! Accessor discovery over a type's public operations.

use std::collections::BTreeMap;

use tracing::debug;

use automap_model::{Operation, ScalarKind, TypeInfo, TypeRef};

use crate::descriptor::{Accessor, SetterConvention, TypeDescriptor};

const GETTER_PREFIX: &str = "get";
const BOOLEAN_GETTER_PREFIX: &str = "is";
const SETTER_PREFIX: &str = "set";

/// Which accessor kinds to collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryScope {
    pub getters: bool,
    pub setters: bool,
}

impl DiscoveryScope {
    pub const ALL: Self = Self {
        getters: true,
        setters: true,
    };
    pub const GETTERS: Self = Self {
        getters: true,
        setters: false,
    };
    pub const SETTERS: Self = Self {
        getters: false,
        setters: true,
    };
}

/// Builds the descriptor of `info` from its non-static operations.
///
/// An operation that qualifies as a getter is never also considered as a
/// setter. When two operations resolve to the same property, the one
/// declared last wins.
pub fn discover(
    info: &'static TypeInfo,
    scope: DiscoveryScope,
    convention: SetterConvention,
) -> TypeDescriptor {
    let owner = info.type_ref();
    let mut getters = BTreeMap::new();
    let mut setters = BTreeMap::new();

    for operation in info.operations().iter().filter(|op| !op.is_static()) {
        if scope.getters
            && let Some(property) = getter_property(operation)
        {
            debug!(
                type_name = info.name(),
                property = %property,
                operation = operation.name(),
                value_type = %operation.returns(),
                "discovered getter"
            );
            getters.insert(property.clone(), Accessor::getter(property, operation.clone()));
            continue;
        }
        if scope.setters
            && let Some(property) = setter_property(operation, &owner, convention)
        {
            debug!(
                type_name = info.name(),
                property = %property,
                operation = operation.name(),
                convention = %convention,
                "discovered setter"
            );
            setters.insert(property.clone(), Accessor::setter(property, operation.clone()));
        }
    }

    TypeDescriptor::new(info, convention, getters, setters)
}

/// Property read by `operation`, if it is shaped like a getter.
pub fn getter_property(operation: &Operation) -> Option<String> {
    if !operation.params().is_empty() || operation.returns().is_void() {
        return None;
    }
    let name = operation.name();
    if let Some(rest) = name.strip_prefix(GETTER_PREFIX) {
        return property_name(rest);
    }
    if let Some(rest) = name.strip_prefix(BOOLEAN_GETTER_PREFIX)
        && *operation.returns() == TypeRef::Primitive(ScalarKind::Bool)
    {
        return property_name(rest);
    }
    None
}

/// Property written by `operation` under `convention`, if it is shaped like
/// a setter of a type whose own reference is `owner`.
pub fn setter_property(
    operation: &Operation,
    owner: &TypeRef,
    convention: SetterConvention,
) -> Option<String> {
    if operation.params().len() != 1 {
        return None;
    }
    match convention {
        SetterConvention::Naming => operation
            .name()
            .strip_prefix(SETTER_PREFIX)
            .and_then(property_name),
        SetterConvention::Fluent if operation.returns().is_assignable_from(owner) => {
            property_name(operation.name())
        }
        SetterConvention::Fluent => None,
    }
}

/// Lower-cases the first character; empty names are not properties.
fn property_name(raw: &str) -> Option<String> {
    let mut chars = raw.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}
