//! Process-wide store of type descriptors.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use automap_model::{TypeInfo, TypeKey};

use crate::descriptor::{SetterConvention, TypeDescriptor};
use crate::discovery::{DiscoveryScope, discover};

/// Concurrent map from type identity to its shared descriptor.
///
/// Registration on demand is atomic: concurrent callers for the same type
/// receive the same descriptor.
#[derive(Default)]
pub struct TypeRegistry {
    entries: RwLock<HashMap<TypeKey, Arc<TypeDescriptor>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: TypeKey) -> Option<Arc<TypeDescriptor>> {
        self.read().get(&key).cloned()
    }

    pub fn contains(&self, key: TypeKey) -> bool {
        self.read().contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Existing descriptor of `info`, or a freshly discovered one.
    pub fn get_or_register(
        &self,
        info: &'static TypeInfo,
        convention: SetterConvention,
    ) -> Arc<TypeDescriptor> {
        if let Some(existing) = self.get(info.key()) {
            return existing;
        }
        let mut entries = self.write();
        let descriptor = entries.entry(info.key()).or_insert_with(|| {
            debug!(type_name = info.name(), convention = %convention, "registering type");
            Arc::new(discover(info, DiscoveryScope::ALL, convention))
        });
        Arc::clone(descriptor)
    }

    /// Discovers `info` and replaces any existing descriptor.
    pub fn register(
        &self,
        info: &'static TypeInfo,
        convention: SetterConvention,
    ) -> Arc<TypeDescriptor> {
        let descriptor = Arc::new(discover(info, DiscoveryScope::ALL, convention));
        let previous = self.write().insert(info.key(), Arc::clone(&descriptor));
        debug!(
            type_name = info.name(),
            convention = %convention,
            replaced = previous.is_some(),
            "registered type"
        );
        descriptor
    }

    pub fn unregister(&self, key: TypeKey) -> Option<Arc<TypeDescriptor>> {
        self.write().remove(&key)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<TypeKey, Arc<TypeDescriptor>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TypeKey, Arc<TypeDescriptor>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("len", &self.len())
            .finish()
    }
}
