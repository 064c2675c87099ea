//! Public operations of a described type.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{InvokeError, Result};
use crate::info::Reflect;
use crate::types::TypeRef;
use crate::value::Value;

/// Zero-argument instance operation returning a value.
pub type ReadFn = Arc<dyn Fn(&dyn Any) -> Result<Value> + Send + Sync>;
/// One-argument instance operation mutating its receiver.
pub type WriteFn = Arc<dyn Fn(&mut dyn Any, Value) -> Result<()> + Send + Sync>;
/// Zero-argument static operation producing a fresh instance.
pub type CreateFn = Arc<dyn Fn() -> Result<Box<dyn Reflect>> + Send + Sync>;

/// How an operation is invoked.
#[derive(Clone)]
pub enum Body {
    Read(ReadFn),
    Write(WriteFn),
    Create(CreateFn),
    /// Signature only; invoking it fails with [`InvokeError::NotInvocable`].
    Declared,
}

/// A public operation: its signature plus an invocable body.
///
/// The mapper only ever inspects the signature (name, parameter types,
/// return type, static-ness) to decide what an operation is for; the body is
/// used once that decision has been made.
#[derive(Clone)]
pub struct Operation {
    name: String,
    params: Vec<TypeRef>,
    returns: TypeRef,
    is_static: bool,
    body: Body,
}

impl Operation {
    /// Zero-argument instance operation.
    pub fn reader(name: impl Into<String>, returns: TypeRef, body: ReadFn) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns,
            is_static: false,
            body: Body::Read(body),
        }
    }

    /// One-argument instance operation.
    pub fn writer(
        name: impl Into<String>,
        param: TypeRef,
        returns: TypeRef,
        body: WriteFn,
    ) -> Self {
        Self {
            name: name.into(),
            params: vec![param],
            returns,
            is_static: false,
            body: Body::Write(body),
        }
    }

    /// Zero-argument static operation returning a new instance.
    pub fn factory(name: impl Into<String>, returns: TypeRef, body: CreateFn) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns,
            is_static: true,
            body: Body::Create(body),
        }
    }

    /// Operation known by its signature only.
    pub fn declared(
        name: impl Into<String>,
        params: Vec<TypeRef>,
        returns: TypeRef,
        is_static: bool,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
            is_static,
            body: Body::Declared,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    pub fn returns(&self) -> &TypeRef {
        &self.returns
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn invoke_read(&self, receiver: &dyn Any) -> Result<Value> {
        match &self.body {
            Body::Read(read) => read(receiver),
            _ => Err(self.not_invocable("read")),
        }
    }

    pub fn invoke_write(&self, receiver: &mut dyn Any, value: Value) -> Result<()> {
        match &self.body {
            Body::Write(write) => write(receiver, value),
            _ => Err(self.not_invocable("write")),
        }
    }

    pub fn invoke_create(&self) -> Result<Box<dyn Reflect>> {
        match &self.body {
            Body::Create(create) => create(),
            _ => Err(self.not_invocable("factory")),
        }
    }

    fn not_invocable(&self, shape: &'static str) -> InvokeError {
        InvokeError::NotInvocable {
            name: self.name.clone(),
            shape,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_static {
            f.write_str("static ")?;
        }
        write!(f, "{} {}(", self.returns, self.name)?;
        for (idx, param) in self.params.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Operation").field(&self.to_string()).finish()
    }
}
