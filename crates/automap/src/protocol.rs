//! Construction protocol detection.
//!
//! A destination is produced either through its zero-argument constructor
//! followed by setters, or through a builder obtained from a static factory
//! whose setters are called before `build`. Detection runs once per type and
//! mode; the outcome is memoized on the type's descriptor.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use automap_model::{Operation, TypeInfo, TypeKey, TypeRef};

use crate::descriptor::{SetterConvention, TypeDescriptor};
use crate::error::{MapError, Result};

/// Conventional name of the static operation returning a builder.
pub const BUILDER_FACTORY_NAME: &str = "builder";
/// Conventional name of the builder operation producing the instance.
pub const BUILD_OPERATION_NAME: &str = "build";

/// Chooses the setter convention of the builders of a destination type.
pub type BuilderConventionFn = Arc<dyn Fn(&TypeInfo) -> SetterConvention + Send + Sync>;

/// How a destination is constructed for mapping.
#[derive(Clone)]
pub enum ConstructionProtocol {
    /// Zero-argument constructor, then setters on the instance.
    DefaultConstructor,
    /// Static factory returning a builder described by `builder`.
    Builder {
        factory: Operation,
        builder: Arc<TypeDescriptor>,
    },
}

impl ConstructionProtocol {
    pub fn factory(&self) -> Option<&Operation> {
        match self {
            Self::Builder { factory, .. } => Some(factory),
            Self::DefaultConstructor => None,
        }
    }

    pub fn builder_descriptor(&self) -> Option<&Arc<TypeDescriptor>> {
        match self {
            Self::Builder { builder, .. } => Some(builder),
            Self::DefaultConstructor => None,
        }
    }
}

impl fmt::Debug for ConstructionProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultConstructor => f.write_str("DefaultConstructor"),
            Self::Builder { factory, builder } => f
                .debug_struct("Builder")
                .field("factory", &factory.name())
                .field("builder", &builder.type_name())
                .finish(),
        }
    }
}

/// Which protocol a mapping call asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructionMode {
    /// Instantiate and call setters on the instance.
    Setters,
    /// Obtain a builder and call setters on the builder.
    Builder,
}

/// One memo slot per mode. The first protocol stored wins.
///
/// Builder detection invokes a factory, so it runs under `detection` to
/// happen once per type.
#[derive(Default)]
pub(crate) struct ProtocolCache {
    setters: OnceLock<ConstructionProtocol>,
    builder: OnceLock<ConstructionProtocol>,
    detection: Mutex<()>,
}

impl ProtocolCache {
    fn slot(&self, mode: ConstructionMode) -> &OnceLock<ConstructionProtocol> {
        match mode {
            ConstructionMode::Setters => &self.setters,
            ConstructionMode::Builder => &self.builder,
        }
    }

    pub(crate) fn get(&self, mode: ConstructionMode) -> Option<&ConstructionProtocol> {
        self.slot(mode).get()
    }

    pub(crate) fn get_or_insert(
        &self,
        mode: ConstructionMode,
        protocol: ConstructionProtocol,
    ) -> &ConstructionProtocol {
        self.slot(mode).get_or_init(|| protocol)
    }

    pub(crate) fn lock_detection(&self) -> MutexGuard<'_, ()> {
        self.detection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Accepts `info` as a default-constructed destination.
pub fn check_default_constructor(info: &TypeInfo) -> Result<ConstructionProtocol> {
    if !info.kind().is_instantiable() {
        return Err(MapError::unmappable(
            info.name(),
            format!("{} cannot be instantiated", info.kind().as_str()),
        ));
    }
    if !info.has_constructor() {
        return Err(MapError::unmappable(
            info.name(),
            "no zero-argument constructor",
        ));
    }
    Ok(ConstructionProtocol::DefaultConstructor)
}

/// Finds the static factory returning a builder of `info`.
///
/// A factory named `builder` is preferred. Otherwise the first zero-argument
/// static operation is taken whose return type has a `build` operation
/// producing `info`.
pub fn find_builder_factory(info: &TypeInfo) -> Result<Operation> {
    if !info.kind().is_buildable() {
        return Err(MapError::unmappable(
            info.name(),
            format!("{} cannot be built", info.kind().as_str()),
        ));
    }
    let conventional = info
        .operations()
        .iter()
        .find(|op| op.name() == BUILDER_FACTORY_NAME && is_factory_shaped(op));
    if let Some(factory) = conventional {
        return Ok(factory.clone());
    }
    info.operations()
        .iter()
        .find(|op| is_factory_shaped(op) && builds(op.returns(), info.key()))
        .cloned()
        .ok_or_else(|| MapError::unmappable(info.name(), "no construction protocol found"))
}

/// Default builder convention: naming setters when the destination descends
/// from one of `bases`, fluent setters otherwise.
pub fn ancestry_convention(bases: Vec<String>) -> BuilderConventionFn {
    Arc::new(move |info: &TypeInfo| {
        let named_base = info
            .ancestors()
            .iter()
            .any(|ancestor| bases.iter().any(|base| base == ancestor.name()));
        if named_base {
            SetterConvention::Naming
        } else {
            SetterConvention::Fluent
        }
    })
}

fn is_factory_shaped(operation: &Operation) -> bool {
    operation.is_static()
        && operation.params().is_empty()
        && operation
            .returns()
            .class_info()
            .is_some_and(|returned| returned.kind().is_buildable())
}

fn builds(builder: &TypeRef, built: TypeKey) -> bool {
    builder.class_info().is_some_and(|info| {
        info.operations().iter().any(|op| {
            op.name() == BUILD_OPERATION_NAME
                && !op.is_static()
                && op.params().is_empty()
                && op
                    .returns()
                    .class_info()
                    .is_some_and(|returned| returned.key() == built)
        })
    })
}
