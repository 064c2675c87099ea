//! Explicit property correspondences between a source and a destination type.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use automap_model::TypeKey;

use crate::descriptor::{Accessor, TypeDescriptor};
use crate::error::{MapError, Result};

/// A source property routed into a differently named destination property.
#[derive(Debug, Clone)]
pub struct OverrideEntry {
    source_type: String,
    source: Accessor,
    destination_type: String,
    destination_property: String,
    destination: Option<Accessor>,
}

impl OverrideEntry {
    /// Resolves both sides against their descriptors.
    ///
    /// The destination property must be a setter of `destination`, except on
    /// types only reachable through a builder, where a getter suffices and
    /// the setter is looked up on the builder at mapping time.
    pub(crate) fn resolve(
        source: &TypeDescriptor,
        source_property: &str,
        destination: &TypeDescriptor,
        destination_property: &str,
    ) -> Result<Self> {
        let getter = source.getter(source_property).ok_or_else(|| {
            MapError::unknown_property(source.type_name(), vec![source_property.to_string()])
        })?;
        let setter = destination.setter(destination_property).cloned();
        let builder_only = !destination.info().has_constructor()
            && destination.getter(destination_property).is_some();
        if setter.is_none() && !builder_only {
            return Err(MapError::unknown_property(
                destination.type_name(),
                vec![destination_property.to_string()],
            ));
        }
        Ok(Self {
            source_type: source.type_name().to_string(),
            source: getter.clone(),
            destination_type: destination.type_name().to_string(),
            destination_property: destination_property.to_string(),
            destination: setter,
        })
    }

    /// Same correspondence with its destination re-resolved on a builder.
    pub(crate) fn migrate(&self, builder: &TypeDescriptor) -> Result<Self> {
        let setter = builder.setter(&self.destination_property).ok_or_else(|| {
            MapError::unknown_property(builder.type_name(), vec![self.destination_property.clone()])
        })?;
        Ok(Self {
            destination_type: builder.type_name().to_string(),
            destination: Some(setter.clone()),
            ..self.clone()
        })
    }

    pub fn source_type(&self) -> &str {
        &self.source_type
    }

    pub fn source_property(&self) -> &str {
        self.source.property()
    }

    pub fn destination_type(&self) -> &str {
        &self.destination_type
    }

    pub fn destination_property(&self) -> &str {
        &self.destination_property
    }

    pub(crate) fn source_accessor(&self) -> &Accessor {
        &self.source
    }

    pub(crate) fn destination_accessor(&self) -> Option<&Accessor> {
        self.destination.as_ref()
    }
}

type PairKey = (TypeKey, TypeKey);
type Bucket = BTreeMap<String, OverrideEntry>;

/// Overrides keyed by ordered (source, destination) type pair, at most one
/// per source property.
#[derive(Debug, Default)]
pub struct OverrideRegistry {
    buckets: RwLock<HashMap<PairKey, Arc<RwLock<Bucket>>>>,
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `entry`, returning the override it replaced.
    pub fn insert(
        &self,
        source: TypeKey,
        destination: TypeKey,
        entry: OverrideEntry,
    ) -> Option<OverrideEntry> {
        let bucket = self.bucket_or_create((source, destination));
        let mut entries = bucket.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(entry.source_property().to_string(), entry)
    }

    /// Removes the override of `source_property`. When `destination_property`
    /// is given, only an override targeting that property is removed.
    pub fn remove(
        &self,
        source: TypeKey,
        destination: TypeKey,
        source_property: &str,
        destination_property: Option<&str>,
    ) -> Option<OverrideEntry> {
        let bucket = self.bucket((source, destination))?;
        let mut entries = bucket.write().unwrap_or_else(PoisonError::into_inner);
        let matches = entries.get(source_property).is_some_and(|entry| {
            destination_property.is_none_or(|wanted| entry.destination_property() == wanted)
        });
        if matches {
            entries.remove(source_property)
        } else {
            None
        }
    }

    /// Snapshot of the overrides for a type pair, ordered by source property.
    pub fn entries(&self, source: TypeKey, destination: TypeKey) -> Vec<OverrideEntry> {
        self.bucket((source, destination))
            .map(|bucket| {
                bucket
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .values()
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn bucket(&self, pair: PairKey) -> Option<Arc<RwLock<Bucket>>> {
        self.buckets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&pair)
            .cloned()
    }

    fn bucket_or_create(&self, pair: PairKey) -> Arc<RwLock<Bucket>> {
        if let Some(bucket) = self.bucket(pair) {
            return bucket;
        }
        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(buckets.entry(pair).or_default())
    }
}
