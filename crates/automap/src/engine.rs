//! The mapping engine.
//!
//! Every mapping call reads all values first and writes them afterwards, so
//! a type mapped onto itself sees a consistent snapshot of its source.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, debug_span, info};

use automap_model::{InvokeError, Introspect, Operation, Reflect, TypeInfo, Value};

use crate::assignable::is_assignable;
use crate::config::MapperConfig;
use crate::descriptor::{Accessor, SetterConvention, TypeDescriptor};
use crate::discovery::{DiscoveryScope, discover};
use crate::error::{MapError, Result};
use crate::overrides::{OverrideEntry, OverrideRegistry};
use crate::protocol::{self, BuilderConventionFn, ConstructionMode, ConstructionProtocol};
use crate::registry::TypeRegistry;

/// Where a planned value goes.
struct Assignment<'a> {
    source_type: &'a str,
    source_property: &'a str,
    destination_type: &'a str,
    setter: &'a Accessor,
}

type Plan<'a> = Vec<(Assignment<'a>, Value)>;

/// A fresh builder instance and the descriptor its setters come from.
type NewBuilder = (Box<dyn Reflect>, Arc<TypeDescriptor>);

/// Copies properties between introspectable objects.
///
/// A `Mapper` owns its type and override registries and is safe to share
/// between threads.
pub struct Mapper {
    config: MapperConfig,
    auto_register: AtomicBool,
    types: TypeRegistry,
    overrides: OverrideRegistry,
    builder_convention: BuilderConventionFn,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("config", &self.config())
            .field("types", &self.types)
            .finish_non_exhaustive()
    }
}

impl Mapper {
    pub fn new() -> Self {
        Self::with_config(MapperConfig::default())
    }

    pub fn with_config(config: MapperConfig) -> Self {
        let builder_convention =
            protocol::ancestry_convention(config.setter_builder_bases.clone());
        Self {
            auto_register: AtomicBool::new(config.auto_register),
            config,
            types: TypeRegistry::new(),
            overrides: OverrideRegistry::new(),
            builder_convention,
        }
    }

    /// Mapper restricted to the given types: they are registered up front
    /// and auto-registration is off.
    pub fn with_types(types: &[&'static TypeInfo]) -> Self {
        let mapper = Self::with_config(MapperConfig::default().with_auto_register(false));
        for &info in types {
            mapper.register_type(info, SetterConvention::Naming);
        }
        mapper
    }

    /// Replaces the policy choosing the setter convention of builders.
    pub fn with_builder_convention<F>(mut self, convention: F) -> Self
    where
        F: Fn(&TypeInfo) -> SetterConvention + Send + Sync + 'static,
    {
        self.builder_convention = Arc::new(convention);
        self
    }

    /// Current configuration, including the live auto-registration flag.
    pub fn config(&self) -> MapperConfig {
        MapperConfig {
            auto_register: self.is_auto_register(),
            ..self.config.clone()
        }
    }

    pub fn type_registry(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn override_registry(&self) -> &OverrideRegistry {
        &self.overrides
    }

    pub fn is_auto_register(&self) -> bool {
        self.auto_register.load(Ordering::Acquire)
    }

    pub fn set_auto_register(&self, enabled: bool) {
        self.auto_register.store(enabled, Ordering::Release);
        info!(enabled, "auto registration changed");
    }

    // ---- registration ----

    /// Registers `T` with naming setters, replacing any earlier registration.
    pub fn register<T: Introspect>(&self) -> Arc<TypeDescriptor> {
        self.register_type(T::describe(), SetterConvention::Naming)
    }

    /// Registers `T` with fluent setters, replacing any earlier registration.
    pub fn register_builder<T: Introspect>(&self) -> Arc<TypeDescriptor> {
        self.register_type(T::describe(), SetterConvention::Fluent)
    }

    pub fn register_type(
        &self,
        info: &'static TypeInfo,
        convention: SetterConvention,
    ) -> Arc<TypeDescriptor> {
        self.types.register(info, convention)
    }

    pub fn unregister<T: Introspect>(&self) -> Option<Arc<TypeDescriptor>> {
        self.types.unregister(T::describe().key())
    }

    /// Descriptor of `T`, registering it when auto-registration is on.
    pub fn registration<T: Introspect>(&self) -> Result<Arc<TypeDescriptor>> {
        self.resolve(T::describe())
    }

    /// Properties `S` can read that `D` can write, sorted.
    pub fn mappable_properties<S: Introspect, D: Introspect>(&self) -> Result<Vec<String>> {
        let source = self.resolve(S::describe())?;
        let destination = self.resolve(D::describe())?;
        Ok(source.mappable_properties(&destination))
    }

    fn resolve(&self, info: &'static TypeInfo) -> Result<Arc<TypeDescriptor>> {
        if let Some(descriptor) = self.types.get(info.key()) {
            return Ok(descriptor);
        }
        if !self.is_auto_register() {
            return Err(MapError::UnregisteredType {
                type_name: info.name().to_string(),
            });
        }
        Ok(self.types.get_or_register(info, SetterConvention::Naming))
    }

    fn resolve_forced(&self, info: &'static TypeInfo) -> Arc<TypeDescriptor> {
        self.types.get_or_register(info, SetterConvention::Naming)
    }

    // ---- overrides ----

    /// Routes `S.source_property` into `D.destination_property`, returning
    /// the override it replaced.
    pub fn register_override<S: Introspect, D: Introspect>(
        &self,
        source_property: &str,
        destination_property: &str,
    ) -> Result<Option<OverrideEntry>> {
        self.register_override_for(
            S::describe(),
            source_property,
            D::describe(),
            destination_property,
        )
    }

    pub fn register_override_for(
        &self,
        source: &'static TypeInfo,
        source_property: &str,
        destination: &'static TypeInfo,
        destination_property: &str,
    ) -> Result<Option<OverrideEntry>> {
        let source = self.resolve_forced(source);
        let destination = self.resolve_forced(destination);
        let entry =
            OverrideEntry::resolve(&source, source_property, &destination, destination_property)?;
        info!(
            source_type = source.type_name(),
            source_property,
            destination_type = destination.type_name(),
            destination_property,
            "registered override"
        );
        Ok(self.overrides.insert(source.key(), destination.key(), entry))
    }

    /// Removes the override of `S.source_property`, optionally only when it
    /// targets `destination_property`. Returns whether one was removed.
    pub fn unregister_override<S: Introspect, D: Introspect>(
        &self,
        source_property: &str,
        destination_property: Option<&str>,
    ) -> bool {
        self.unregister_override_for(
            S::describe(),
            source_property,
            D::describe(),
            destination_property,
        )
    }

    pub fn unregister_override_for(
        &self,
        source: &'static TypeInfo,
        source_property: &str,
        destination: &'static TypeInfo,
        destination_property: Option<&str>,
    ) -> bool {
        let removed = self
            .overrides
            .remove(source.key(), destination.key(), source_property, destination_property);
        debug!(
            source_type = source.name(),
            source_property,
            destination_type = destination.name(),
            removed = removed.is_some(),
            "unregister override"
        );
        removed.is_some()
    }

    pub fn overrides<S: Introspect, D: Introspect>(&self) -> Vec<OverrideEntry> {
        self.overrides
            .entries(S::describe().key(), D::describe().key())
    }

    // ---- construction ----

    /// Detects, or returns the memoized, construction protocol of
    /// `destination` for `mode`.
    ///
    /// Detecting the builder protocol invokes the builder factory once.
    pub fn construction_protocol(
        &self,
        destination: &'static TypeInfo,
        mode: ConstructionMode,
    ) -> Result<ConstructionProtocol> {
        let descriptor = self.resolve_forced(destination);
        match mode {
            ConstructionMode::Setters => self.setters_protocol(&descriptor).cloned(),
            ConstructionMode::Builder => {
                if let Some(protocol) = descriptor.construction_protocol(ConstructionMode::Builder)
                {
                    return Ok(protocol.clone());
                }
                self.new_builder(&descriptor)?;
                descriptor
                    .construction_protocol(ConstructionMode::Builder)
                    .cloned()
                    .ok_or_else(|| {
                        MapError::unmappable(
                            descriptor.type_name(),
                            "no construction protocol found",
                        )
                    })
            }
        }
    }

    fn setters_protocol<'a>(
        &self,
        descriptor: &'a TypeDescriptor,
    ) -> Result<&'a ConstructionProtocol> {
        if let Some(protocol) = descriptor.construction_protocol(ConstructionMode::Setters) {
            return Ok(protocol);
        }
        let protocol = protocol::check_default_constructor(descriptor.info())?;
        debug!(type_name = descriptor.type_name(), "default constructor protocol");
        Ok(descriptor.memoize_protocol(ConstructionMode::Setters, protocol))
    }

    fn instantiate(&self, descriptor: &TypeDescriptor) -> Result<Box<dyn Reflect>> {
        self.setters_protocol(descriptor)?;
        descriptor
            .info()
            .instantiate()
            .map_err(|cause| MapError::Construction {
                type_name: descriptor.type_name().to_string(),
                cause,
            })
    }

    /// Fresh builder of `destination` with its descriptor.
    fn new_builder(&self, destination: &TypeDescriptor) -> Result<NewBuilder> {
        if let Some(memoized) = memoized_builder(destination) {
            return memoized;
        }
        let _detecting = destination.lock_protocol_detection();
        if let Some(memoized) = memoized_builder(destination) {
            return memoized;
        }

        let factory = protocol::find_builder_factory(destination.info())?;
        let instance = invoke_factory(destination, &factory)?;
        // The factory may declare an abstract builder type; the instance
        // tells which builder is actually used.
        let convention = (self.builder_convention)(destination.info());
        let builder = self.builder_type(instance.type_info(), convention);
        debug!(
            type_name = destination.type_name(),
            factory = factory.name(),
            builder_type = builder.type_name(),
            convention = %builder.convention(),
            "builder protocol"
        );
        let protocol = destination.memoize_protocol(
            ConstructionMode::Builder,
            ConstructionProtocol::Builder { factory, builder },
        );
        let builder = protocol.builder_descriptor().cloned().ok_or_else(|| {
            MapError::unmappable(destination.type_name(), "no construction protocol found")
        })?;
        Ok((instance, builder))
    }

    /// Descriptor of a builder type with setters of `convention`.
    ///
    /// A registration under another convention is left in place and the
    /// builder gets its own descriptor.
    fn builder_type(
        &self,
        info: &'static TypeInfo,
        convention: SetterConvention,
    ) -> Arc<TypeDescriptor> {
        let registered = self.types.get_or_register(info, convention);
        if registered.convention() == convention {
            return registered;
        }
        debug!(
            type_name = info.name(),
            registered = %registered.convention(),
            convention = %convention,
            "builder registered with other setters"
        );
        Arc::new(discover(info, DiscoveryScope::ALL, convention))
    }

    // ---- mapping ----

    /// Copies every compatible property of `source` into `destination`,
    /// skipping the `exclusions`.
    pub fn map(
        &self,
        source: &dyn Reflect,
        destination: &mut dyn Reflect,
        exclusions: &[&str],
    ) -> Result<()> {
        let src = self.resolve(source.type_info())?;
        let dst = self.resolve(destination.type_info())?;
        let _span =
            debug_span!("map", source = src.type_name(), destination = dst.type_name()).entered();
        let overrides = self.overrides.entries(src.key(), dst.key());
        let plan = self.plan(source, &src, &dst, &overrides, exclusions)?;
        self.apply(plan, destination)
    }

    /// Maps `target` onto itself, which only has an effect through
    /// overrides between properties of its own type.
    pub fn map_self(&self, target: &mut dyn Reflect, exclusions: &[&str]) -> Result<()> {
        let descriptor = self.resolve(target.type_info())?;
        let _span = debug_span!("map_self", type_name = descriptor.type_name()).entered();
        let overrides = self.overrides.entries(descriptor.key(), descriptor.key());
        let plan = self.plan(&*target, &descriptor, &descriptor, &overrides, exclusions)?;
        self.apply(plan, target)
    }

    /// New default-constructed `destination` populated from `source`.
    pub fn map_to_new_instance(
        &self,
        source: &dyn Reflect,
        destination: &'static TypeInfo,
        exclusions: &[&str],
    ) -> Result<Box<dyn Reflect>> {
        let descriptor = self.resolve(destination)?;
        let mut instance = self.instantiate(&descriptor)?;
        self.map(source, &mut *instance, exclusions)?;
        Ok(instance)
    }

    pub fn map_to_new<T: Introspect>(
        &self,
        source: &dyn Reflect,
        exclusions: &[&str],
    ) -> Result<T> {
        let instance = self.map_to_new_instance(source, T::describe(), exclusions)?;
        downcast_instance(instance)
    }

    /// New builder of `destination` populated from `source`, ready to build.
    ///
    /// Overrides registered towards `destination` are applied to the matching
    /// builder setters, except those whose source property is excluded.
    pub fn map_to_builder(
        &self,
        source: &dyn Reflect,
        destination: &'static TypeInfo,
        exclusions: &[&str],
    ) -> Result<Box<dyn Reflect>> {
        let src = self.resolve(source.type_info())?;
        let dst = self.resolve_forced(destination);
        let (mut builder, builder_descriptor) = self.new_builder(&dst)?;
        let _span = debug_span!(
            "map_to_builder",
            source = src.type_name(),
            destination = dst.type_name(),
            builder = builder_descriptor.type_name()
        )
        .entered();
        let overrides = self
            .overrides
            .entries(src.key(), dst.key())
            .iter()
            .filter(|entry| !exclusions.contains(&entry.source_property()))
            .map(|entry| entry.migrate(&builder_descriptor))
            .collect::<Result<Vec<_>>>()?;
        let plan = self.plan(source, &src, &builder_descriptor, &overrides, exclusions)?;
        self.apply(plan, &mut *builder)?;
        Ok(builder)
    }

    /// Typed [`Mapper::map_to_builder`]: `B` is the builder type of `D`.
    pub fn map_to_builder_as<D: Introspect, B: Introspect>(
        &self,
        source: &dyn Reflect,
        exclusions: &[&str],
    ) -> Result<B> {
        let builder = self.map_to_builder(source, D::describe(), exclusions)?;
        downcast_instance(builder)
    }

    /// Reads every value to transfer and pairs it with its setter.
    fn plan<'a>(
        &self,
        source: &dyn Reflect,
        src: &'a TypeDescriptor,
        dst: &'a TypeDescriptor,
        overrides: &'a [OverrideEntry],
        exclusions: &[&str],
    ) -> Result<Plan<'a>> {
        src.check_getters_contain(exclusions)?;
        let excluded: HashSet<&str> = exclusions.iter().copied().collect();
        let overridden: HashSet<&str> =
            overrides.iter().map(OverrideEntry::source_property).collect();
        let mut plan = Vec::new();

        for (property, getter) in src.getters() {
            if excluded.contains(property.as_str()) {
                debug!(source_type = src.type_name(), property = %property, "excluded");
                continue;
            }
            if overridden.contains(property.as_str()) {
                continue;
            }
            match dst.setter(property) {
                Some(setter) => self.plan_property(source, src, getter, dst, setter, &mut plan)?,
                None => debug!(
                    source_type = src.type_name(),
                    property = %property,
                    destination_type = dst.type_name(),
                    "no matching setter"
                ),
            }
        }

        for entry in overrides {
            if excluded.contains(entry.source_property()) {
                debug!(
                    source_type = src.type_name(),
                    property = entry.source_property(),
                    "excluded override"
                );
                continue;
            }
            let setter = entry.destination_accessor().ok_or_else(|| {
                MapError::unknown_property(
                    dst.type_name(),
                    vec![entry.destination_property().to_string()],
                )
            })?;
            self.plan_property(source, src, entry.source_accessor(), dst, setter, &mut plan)?;
        }

        Ok(plan)
    }

    fn plan_property<'a>(
        &self,
        source: &dyn Reflect,
        src: &'a TypeDescriptor,
        getter: &'a Accessor,
        dst: &'a TypeDescriptor,
        setter: &'a Accessor,
        plan: &mut Plan<'a>,
    ) -> Result<()> {
        let value = getter
            .read(source.as_any())
            .map_err(|cause| MapError::Accessor {
                type_name: src.type_name().to_string(),
                operation: getter.operation_name().to_string(),
                cause,
            })?;
        let runtime_type = value.runtime_type(getter.value_type());
        if !is_assignable(&runtime_type, setter.value_type()) {
            info!(
                source_type = src.type_name(),
                source_property = getter.property(),
                runtime_type = %runtime_type,
                destination_type = dst.type_name(),
                destination_property = setter.property(),
                declared_type = %setter.value_type(),
                "incompatible types, property skipped"
            );
            return Ok(());
        }
        let assignment = Assignment {
            source_type: src.type_name(),
            source_property: getter.property(),
            destination_type: dst.type_name(),
            setter,
        };
        plan.push((assignment, value));
        Ok(())
    }

    fn apply(&self, plan: Plan<'_>, destination: &mut dyn Reflect) -> Result<()> {
        for (assignment, value) in plan {
            info!(
                source_type = assignment.source_type,
                source_property = assignment.source_property,
                destination_type = assignment.destination_type,
                destination_property = assignment.setter.property(),
                value = %self.config.loggable(&value),
                "mapping property"
            );
            if let Err(cause) = assignment.setter.write(destination.as_any_mut(), value) {
                return Err(write_error(&assignment, cause));
            }
        }
        Ok(())
    }
}

fn write_error(assignment: &Assignment<'_>, cause: InvokeError) -> MapError {
    match cause {
        InvokeError::NullValue { .. } | InvokeError::TypeMismatch { .. } => MapError::Coercion {
            source_type: assignment.source_type.to_string(),
            source_property: assignment.source_property.to_string(),
            destination_type: assignment.destination_type.to_string(),
            destination_property: assignment.setter.property().to_string(),
            cause,
        },
        cause => MapError::Accessor {
            type_name: assignment.destination_type.to_string(),
            operation: assignment.setter.operation_name().to_string(),
            cause,
        },
    }
}

fn invoke_factory(destination: &TypeDescriptor, factory: &Operation) -> Result<Box<dyn Reflect>> {
    factory
        .invoke_create()
        .map_err(|cause| MapError::Construction {
            type_name: destination.type_name().to_string(),
            cause,
        })
}

/// A new builder from the memoized builder protocol, if one was detected.
fn memoized_builder(destination: &TypeDescriptor) -> Option<Result<NewBuilder>> {
    match destination.construction_protocol(ConstructionMode::Builder)? {
        ConstructionProtocol::Builder { factory, builder } => Some(
            invoke_factory(destination, factory).map(|instance| (instance, Arc::clone(builder))),
        ),
        ConstructionProtocol::DefaultConstructor => None,
    }
}

fn downcast_instance<T: Introspect>(instance: Box<dyn Reflect>) -> Result<T> {
    let found = instance.type_info().name().to_string();
    instance
        .downcast::<T>()
        .map(|boxed| *boxed)
        .ok_or_else(|| MapError::InstanceType {
            expected: T::describe().name().to_string(),
            found,
        })
}
