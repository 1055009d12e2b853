//! Core functionality for registering bindings and resolving instances.
//!
//! A [Container] resolves two kinds of keys:
//!
//! * symbolic names, which need a binding installed with [Container::singleton],
//! [Container::transient] or [Container::context] beforehand,
//! * [Injectable] type references, which are constructed automatically by recursively
//! resolving the dependencies listed in their capability record.
//!
//! Both address spaces are separate - a type reference never resolves a symbolic binding and
//! vice versa.
//!
//! ```
//! use armature_di::binding::Resolver;
//! use armature_di::container::Container;
//!
//! #[derive(Default)]
//! struct Email {
//!     sent: u32,
//! }
//!
//! let mut container = Container::default();
//! container.singleton("email", Resolver::factory(Email::default)).unwrap();
//!
//! let first = container.resolve_typed::<Email>("email").unwrap();
//! let second = container.resolve_typed::<Email>("email").unwrap();
//!
//! assert!(armature_di::instance::InstancePtr::ptr_eq(&first, &second));
//! assert_eq!(first.sent, 0);
//! assert!(container.has("email"));
//! assert!(!container.has("missing"));
//! ```

use crate::binding::{Binding, BindingEntry, Lifetime, Resolver};
use crate::cache::{CacheKey, InstanceCache};
use crate::error::{BindingKind, ContainerError};
use crate::injectable::{CapabilityRecord, DependencyType, Injectable, TypeReference};
use crate::instance::{InstanceAnyPtr, InstanceBound, InstancePtr};
use derivative::Derivative;
use fxhash::{FxHashMap, FxHashSet};
use itertools::Itertools;
use std::any::{type_name, TypeId};
use std::fmt::Display;
#[cfg(not(feature = "threadsafe"))]
use std::cell::RefCell;
#[cfg(not(feature = "threadsafe"))]
use std::rc::Rc;
#[cfg(feature = "threadsafe")]
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, trace};

/// Key accepted by [Container::resolve_key].
#[derive(Clone, Debug)]
pub enum Key {
    Name(String),
    Type(TypeReference),
}

impl Key {
    #[inline]
    pub fn of<T: Injectable>() -> Self {
        Self::Type(TypeReference::of::<T>())
    }
}

impl From<&str> for Key {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for Key {
    #[inline]
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

impl From<TypeReference> for Key {
    #[inline]
    fn from(value: TypeReference) -> Self {
        Self::Type(value)
    }
}

/// Builder for [Container] with sensible defaults, for easy construction.
#[derive(Clone, Copy, Debug)]
pub struct ContainerBuilder {
    allow_binding_overriding: bool,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self {
            allow_binding_overriding: true,
        }
    }
}

impl ContainerBuilder {
    /// Creates a new builder with a default configuration.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether plain bindings can be replaced by later [Container::singleton] or
    /// [Container::transient] calls for the same key.
    pub fn with_binding_overriding(mut self, allow_binding_overriding: bool) -> Self {
        self.allow_binding_overriding = allow_binding_overriding;
        self
    }

    /// Builds resulting [Container].
    pub fn build(self) -> Container {
        Container::new(self.allow_binding_overriding)
    }
}

/// Binding registry and resolved instance storage. Meant to be used from a single logical
/// thread of control - all methods take `&mut self` and run to completion. Use
/// [SharedContainer] to hand the container to multiple owners.
pub struct Container {
    bindings: FxHashMap<String, BindingEntry>,
    cache: InstanceCache,
    keys_under_construction: FxHashSet<CacheKey>,
    allow_binding_overriding: bool,
}

impl Default for Container {
    fn default() -> Self {
        ContainerBuilder::default().build()
    }
}

impl Container {
    pub fn new(allow_binding_overriding: bool) -> Self {
        Self {
            bindings: Default::default(),
            cache: Default::default(),
            keys_under_construction: Default::default(),
            allow_binding_overriding,
        }
    }

    /// Installs a plain singleton binding.
    #[inline]
    pub fn singleton<K: ToString>(
        &mut self,
        key: K,
        resolver: Resolver,
    ) -> Result<(), ContainerError> {
        self.bind(key, resolver, Lifetime::Singleton)
    }

    /// Installs a plain transient binding.
    #[inline]
    pub fn transient<K: ToString>(
        &mut self,
        key: K,
        resolver: Resolver,
    ) -> Result<(), ContainerError> {
        self.bind(key, resolver, Lifetime::Transient)
    }

    /// Installs a plain binding with given lifetime. Fails if the key holds a contextual group.
    /// Replacing a previous plain binding also drops its cached instance.
    pub fn bind<K: ToString>(
        &mut self,
        key: K,
        resolver: Resolver,
        lifetime: Lifetime,
    ) -> Result<(), ContainerError> {
        let key = key.to_string();
        match self.bindings.get(&key) {
            Some(BindingEntry::Contextual(_)) => {
                return Err(ContainerError::BindingCollision {
                    key,
                    existing: BindingKind::Contextual,
                })
            }
            Some(BindingEntry::Plain(_)) if !self.allow_binding_overriding => {
                return Err(ContainerError::BindingOverride(key))
            }
            Some(BindingEntry::Plain(_)) => {
                debug!(%key, "Overriding binding.");
                self.cache.evict(&CacheKey::name(&key));
            }
            None => {}
        }

        debug!(%key, ?lifetime, "Binding.");

        self.bindings.insert(
            key,
            BindingEntry::Plain(Binding::new(resolver, lifetime)),
        );
        Ok(())
    }

    /// Installs a singleton entry in the contextual group of given key.
    #[inline]
    pub fn context<K: ToString, C: ToString>(
        &mut self,
        key: K,
        context: C,
        resolver: Resolver,
    ) -> Result<(), ContainerError> {
        self.context_with_lifetime(key, context, resolver, Lifetime::Singleton)
    }

    /// Installs an entry in the contextual group of given key, creating the group if the key is
    /// unbound. Fails, without changing anything, if the key holds a plain binding.
    pub fn context_with_lifetime<K: ToString, C: ToString>(
        &mut self,
        key: K,
        context: C,
        resolver: Resolver,
        lifetime: Lifetime,
    ) -> Result<(), ContainerError> {
        let key = key.to_string();
        let context = context.to_string();

        let group = match self
            .bindings
            .entry(key.clone())
            .or_insert_with(|| BindingEntry::Contextual(Default::default()))
        {
            BindingEntry::Contextual(group) => group,
            BindingEntry::Plain(_) => {
                return Err(ContainerError::BindingCollision {
                    key,
                    existing: BindingKind::Plain,
                })
            }
        };

        debug!(%key, %context, ?lifetime, "Binding contextual entry.");

        if group
            .insert(context.clone(), Binding::new(resolver, lifetime))
            .is_some()
        {
            self.cache.evict(&CacheKey::context(key, context));
        }

        Ok(())
    }

    /// Checks if there's any binding for given key.
    #[inline]
    pub fn has(&self, key: &str) -> bool {
        self.bindings.contains_key(key)
    }

    /// Checks if given key holds a contextual group with given context entry.
    pub fn has_context(&self, key: &str, context: &str) -> bool {
        matches!(
            self.bindings.get(key),
            Some(BindingEntry::Contextual(group)) if group.contains_key(context)
        )
    }

    /// Checks if given key holds a contextual group.
    #[inline]
    pub fn is_contextual(&self, key: &str) -> bool {
        matches!(self.bindings.get(key), Some(BindingEntry::Contextual(_)))
    }

    /// Checks if an instance of given type has already been constructed by type reference.
    #[inline]
    pub fn is_resolved_type<T: Injectable>(&self) -> bool {
        self.cache.contains(&CacheKey::Type(TypeId::of::<T>()))
    }

    /// Resolves a plain binding. Use [Container::resolve_contextual] for contextual ones.
    #[inline]
    pub fn resolve(&mut self, key: &str) -> Result<InstanceAnyPtr, ContainerError> {
        self.resolve_name(key, None)
    }

    /// Resolves a binding within given context.
    #[inline]
    pub fn resolve_contextual(
        &mut self,
        key: &str,
        context: &str,
    ) -> Result<InstanceAnyPtr, ContainerError> {
        self.resolve_name(key, Some(context))
    }

    /// Typesafe version of [Container::resolve].
    pub fn resolve_typed<T: InstanceBound>(
        &mut self,
        key: &str,
    ) -> Result<InstancePtr<T>, ContainerError> {
        Self::downcast(key, self.resolve(key)?)
    }

    /// Typesafe version of [Container::resolve_contextual].
    pub fn resolve_contextual_typed<T: InstanceBound>(
        &mut self,
        key: &str,
        context: &str,
    ) -> Result<InstancePtr<T>, ContainerError> {
        Self::downcast(key, self.resolve_contextual(key, context)?)
    }

    /// Resolves an instance of given type by automatic construction. The instance is cached
    /// under the type itself.
    pub fn resolve_type<T: Injectable>(&mut self) -> Result<InstancePtr<T>, ContainerError> {
        Self::downcast(
            type_name::<T>(),
            self.resolve_reference(&TypeReference::of::<T>())?,
        )
    }

    /// Resolves any [Key]. The context is only taken into account for symbolic keys.
    pub fn resolve_key(
        &mut self,
        key: &Key,
        context: Option<&str>,
    ) -> Result<InstanceAnyPtr, ContainerError> {
        match key {
            Key::Name(name) => self.resolve_name(name, context),
            Key::Type(reference) => self.resolve_reference(reference),
        }
    }

    fn resolve_name(
        &mut self,
        key: &str,
        context: Option<&str>,
    ) -> Result<InstanceAnyPtr, ContainerError> {
        let (cache_key, binding) = match self.bindings.get(key) {
            None => return Err(ContainerError::UnboundKey(key.to_string())),
            Some(BindingEntry::Contextual(group)) => {
                let context =
                    context.ok_or_else(|| ContainerError::ContextRequired(key.to_string()))?;
                let binding = group
                    .get(context)
                    .ok_or_else(|| ContainerError::UnboundContext {
                        key: key.to_string(),
                        context: context.to_string(),
                    })?;

                (CacheKey::context(key, context), binding.clone())
            }
            Some(BindingEntry::Plain(binding)) => (CacheKey::name(key), binding.clone()),
        };

        if let Some(instance) = self.cache.instance(&cache_key) {
            trace!(%cache_key, "Using cached instance.");
            return Ok(instance);
        }

        let instance = self.construct(&cache_key, &cache_key, |container| {
            binding.resolver.resolve(container)
        })?;

        if binding.lifetime == Lifetime::Singleton {
            self.cache.store_instance(cache_key, instance.clone());
        }

        Ok(instance)
    }

    fn resolve_reference(
        &mut self,
        reference: &TypeReference,
    ) -> Result<InstanceAnyPtr, ContainerError> {
        let cache_key = CacheKey::Type(reference.type_id);
        if let Some(instance) = self.cache.instance(&cache_key) {
            trace!(type_name = reference.type_name, "Using cached instance.");
            return Ok(instance);
        }

        debug!(type_name = reference.type_name, "Constructing instance.");

        let instance = self.construct(&cache_key, &reference.type_name, reference.construct)?;

        self.cache.store_instance(cache_key, instance.clone());
        Ok(instance)
    }

    /// Resolves all dependencies from given record, in order. Primitive dependencies fail
    /// immediately. Type dependencies reuse any cached instance of matching runtime type
    /// before falling back to automatic construction.
    pub(crate) fn resolve_dependencies(
        &mut self,
        record: &CapabilityRecord,
    ) -> Result<Vec<InstanceAnyPtr>, ContainerError> {
        record
            .dependencies
            .iter()
            .enumerate()
            .map(|(index, dependency)| match dependency {
                DependencyType::Primitive(primitive) => {
                    Err(ContainerError::UnresolvableDependency {
                        index,
                        expected: primitive.to_string(),
                        owner: record.owner,
                    })
                }
                DependencyType::Type(reference) => {
                    match self.cache.find_by_type(reference.type_id) {
                        Some(instance) => Ok(instance),
                        None => self.resolve_reference(reference),
                    }
                }
                DependencyType::Binding { key, context, .. } => {
                    self.resolve_name(key, context.as_deref())
                }
            })
            .try_collect()
    }

    fn construct<F>(
        &mut self,
        cache_key: &CacheKey,
        description: &dyn Display,
        factory: F,
    ) -> Result<InstanceAnyPtr, ContainerError>
    where
        F: FnOnce(&mut Container) -> Result<InstanceAnyPtr, ContainerError>,
    {
        if !self.keys_under_construction.insert(cache_key.clone()) {
            return Err(ContainerError::DependencyCycle(description.to_string()));
        }

        let instance = factory(self);
        self.keys_under_construction.remove(cache_key);

        instance
    }

    fn downcast<T: InstanceBound>(
        key: &str,
        instance: InstanceAnyPtr,
    ) -> Result<InstancePtr<T>, ContainerError> {
        instance
            .downcast::<T>()
            .map_err(|_| ContainerError::IncompatibleInstance {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }
}

#[cfg(feature = "threadsafe")]
type SharedContainerPtr = Arc<Mutex<Container>>;
#[cfg(not(feature = "threadsafe"))]
type SharedContainerPtr = Rc<RefCell<Container>>;

/// Clonable handle to a single [Container]. Access is serialized: with the `threadsafe` feature
/// a mutex guards the whole container, so concurrent callers cannot construct the same
/// singleton twice. The container must not be accessed through the same handle from within a
/// factory - use [Resolver::with_container] instead.
#[derive(Clone, Default, Derivative)]
#[derivative(Debug)]
pub struct SharedContainer {
    #[derivative(Debug = "ignore")]
    container: SharedContainerPtr,
}

impl From<Container> for SharedContainer {
    fn from(value: Container) -> Self {
        Self::new(value)
    }
}

impl SharedContainer {
    #[cfg(feature = "threadsafe")]
    pub fn new(container: Container) -> Self {
        Self {
            container: Arc::new(Mutex::new(container)),
        }
    }

    #[cfg(not(feature = "threadsafe"))]
    pub fn new(container: Container) -> Self {
        Self {
            container: Rc::new(RefCell::new(container)),
        }
    }

    /// Runs given function with exclusive access to the container.
    #[cfg(feature = "threadsafe")]
    pub fn with<R, F: FnOnce(&mut Container) -> R>(&self, f: F) -> R {
        let mut container = self
            .container
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut container)
    }

    /// Runs given function with exclusive access to the container.
    #[cfg(not(feature = "threadsafe"))]
    pub fn with<R, F: FnOnce(&mut Container) -> R>(&self, f: F) -> R {
        f(&mut self.container.borrow_mut())
    }
}
