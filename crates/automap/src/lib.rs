//! Property-to-property object mapping.
//!
//! The [`Mapper`] copies values from the getters of a source object into the
//! matching setters of a destination object. Types take part by describing
//! their public operations through [`automap_model::Introspect`]; the mapper
//! discovers accessors from those descriptions, caches them per type and
//! decides how to construct destinations (default constructor or builder).
//!
//! Values whose runtime type does not fit the destination slot are skipped
//! and logged; everything else that goes wrong surfaces as a [`MapError`].

pub mod assignable;
pub mod config;
pub mod descriptor;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod overrides;
pub mod protocol;
pub mod registry;

pub use assignable::is_assignable;
pub use config::{MapperConfig, REDACTED_VALUE};
pub use descriptor::{Accessor, SetterConvention, TypeDescriptor};
pub use engine::Mapper;
pub use error::{MapError, Result};
pub use overrides::{OverrideEntry, OverrideRegistry};
pub use protocol::{BuilderConventionFn, ConstructionMode, ConstructionProtocol};
pub use registry::TypeRegistry;

pub use automap_model::{
    Introspect, ObjectValue, Reflect, ScalarKind, TypeInfo, TypeKind, TypeRef, Value, introspect,
};
