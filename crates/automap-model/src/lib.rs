//! Introspection model for reflective property mapping.
//!
//! Describes types by their public operations so that a mapper can discover
//! properties, construction protocols and value compatibility at run time
//! without the described types implementing any mapping-specific contract.
//!
//! # Module Organization
//!
//! - [`types`]: type identities, kinds and declared slot types
//! - [`value`]: dynamic values and conversions to and from Rust values
//! - [`operation`]: operation signatures and invocable bodies
//! - [`info`]: per-type operation tables and the `Introspect`/`Reflect` traits
//! - [`error`]: failures of invoked operations

#![deny(unsafe_code)]

pub mod error;
pub mod info;
pub mod operation;
pub mod types;
pub mod value;

pub use error::{InvokeError, Result};
pub use info::{Introspect, Reflect, TypeInfo, TypeInfoBuilder};
pub use operation::{Body, CreateFn, Operation, ReadFn, WriteFn};
pub use types::{ScalarKind, TypeHandle, TypeKey, TypeKind, TypeRef};
pub use value::{FromValue, IntoValue, Number, ObjectValue, Value};
