//! Bindings describe how to produce a value for a symbolic key. Each [Binding] couples a
//! [Resolver] with a [Lifetime], which decides if the produced instance is cached.
//!
//! A key holds either a single plain binding or a group of contextual bindings, selected by an
//! additional context key at resolution time:
//!
//! ```
//! use armature_di::binding::{Lifetime, Resolver};
//! use armature_di::container::Container;
//!
//! struct Connection(&'static str);
//!
//! let mut container = Container::default();
//! container.singleton("clock", Resolver::factory(|| 42_u64)).unwrap();
//! container
//!     .context("db", "primary", Resolver::factory(|| Connection("primary")))
//!     .unwrap();
//! container
//!     .context_with_lifetime(
//!         "db",
//!         "replica",
//!         Resolver::factory(|| Connection("replica")),
//!         Lifetime::Transient,
//!     )
//!     .unwrap();
//!
//! let connection = container
//!     .resolve_contextual_typed::<Connection>("db", "replica")
//!     .unwrap();
//! assert_eq!(connection.0, "replica");
//! ```

use crate::container::Container;
use crate::error::{BindingKind, ContainerError};
use crate::instance::{erase, ErrorPtr, FactoryBound, InstanceAnyPtr, InstanceBound};
use derivative::Derivative;
use fxhash::FxHashMap;
#[cfg(not(feature = "threadsafe"))]
use std::rc::Rc;
#[cfg(feature = "threadsafe")]
use std::sync::Arc;

#[cfg(not(feature = "threadsafe"))]
pub type FactoryFn = Rc<dyn Fn(&mut Container) -> Result<InstanceAnyPtr, ContainerError>>;
#[cfg(feature = "threadsafe")]
pub type FactoryFn =
    Arc<dyn Fn(&mut Container) -> Result<InstanceAnyPtr, ContainerError> + Send + Sync>;

/// Lifetime of resolved instances.
#[derive(Clone, Copy, Default, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum Lifetime {
    /// Constructed once and cached for the lifetime of the container.
    #[default]
    Singleton,
    /// Constructed on every resolution and never cached.
    Transient,
}

/// Recipe for an instance: either a factory to call or an already built value.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub enum Resolver {
    Factory(#[derivative(Debug = "ignore")] FactoryFn),
    Value(#[derivative(Debug = "ignore")] InstanceAnyPtr),
}

impl Resolver {
    /// Creates a resolver calling a zero-argument factory.
    pub fn factory<T, F>(factory: F) -> Self
    where
        T: InstanceBound,
        F: Fn() -> T + FactoryBound,
    {
        Self::Factory(Self::wrap(move |_| Ok(erase(factory()))))
    }

    /// Creates a resolver calling a fallible zero-argument factory.
    pub fn try_factory<T, F>(factory: F) -> Self
    where
        T: InstanceBound,
        F: Fn() -> Result<T, ErrorPtr> + FactoryBound,
    {
        Self::Factory(Self::wrap(move |_| {
            factory().map(erase).map_err(ContainerError::FactoryError)
        }))
    }

    /// Creates a resolver whose factory can resolve other bindings from the container. The
    /// factory must not resolve its own key - doing so results in
    /// [ContainerError::DependencyCycle].
    pub fn with_container<T, F>(factory: F) -> Self
    where
        T: InstanceBound,
        F: Fn(&mut Container) -> Result<T, ContainerError> + FactoryBound,
    {
        Self::Factory(Self::wrap(move |container| factory(container).map(erase)))
    }

    /// Creates a resolver for an already built value.
    pub fn value<T: InstanceBound>(value: T) -> Self {
        Self::Value(erase(value))
    }

    /// Creates a resolver for an already built, type-erased instance.
    pub fn instance(instance: InstanceAnyPtr) -> Self {
        Self::Value(instance)
    }

    /// Produces an instance: calls the factory or hands out the stored value.
    pub fn resolve(&self, container: &mut Container) -> Result<InstanceAnyPtr, ContainerError> {
        match self {
            Resolver::Factory(factory) => factory(container),
            Resolver::Value(value) => Ok(value.clone()),
        }
    }

    #[cfg(feature = "threadsafe")]
    fn wrap<F>(factory: F) -> FactoryFn
    where
        F: Fn(&mut Container) -> Result<InstanceAnyPtr, ContainerError> + Send + Sync + 'static,
    {
        Arc::new(factory)
    }

    #[cfg(not(feature = "threadsafe"))]
    fn wrap<F>(factory: F) -> FactoryFn
    where
        F: Fn(&mut Container) -> Result<InstanceAnyPtr, ContainerError> + 'static,
    {
        Rc::new(factory)
    }
}

/// A [Resolver] with its [Lifetime].
#[derive(Clone, Debug)]
pub struct Binding {
    pub resolver: Resolver,
    pub lifetime: Lifetime,
}

impl Binding {
    #[inline]
    pub fn new(resolver: Resolver, lifetime: Lifetime) -> Self {
        Self { resolver, lifetime }
    }
}

/// Everything bound under a single key. A key is classified as plain or contextual on first
/// write and keeps that classification.
#[derive(Clone, Debug)]
pub enum BindingEntry {
    Plain(Binding),
    Contextual(FxHashMap<String, Binding>),
}

impl BindingEntry {
    #[inline]
    pub fn kind(&self) -> BindingKind {
        match self {
            BindingEntry::Plain(_) => BindingKind::Plain,
            BindingEntry::Contextual(_) => BindingKind::Contextual,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::binding::{BindingEntry, Lifetime, Resolver};
    use crate::container::Container;
    use crate::error::{BindingKind, ContainerError};
    use crate::instance::{error_ptr, ErrorPtr, InstancePtr};
    use std::fmt::{Display, Formatter};

    #[derive(Debug)]
    struct TestError;

    impl Display for TestError {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            write!(f, "test error")
        }
    }

    impl std::error::Error for TestError {}

    #[test]
    fn should_default_to_singleton() {
        assert_eq!(Lifetime::default(), Lifetime::Singleton);
    }

    #[test]
    fn should_call_factory_on_each_resolve() {
        let mut container = Container::default();
        let resolver = Resolver::factory(|| 5_i32);

        let first = resolver.resolve(&mut container).unwrap();
        let second = resolver.resolve(&mut container).unwrap();

        assert!(!InstancePtr::ptr_eq(&first, &second));
        assert_eq!(first.downcast_ref::<i32>(), Some(&5));
    }

    #[test]
    fn should_return_stored_value() {
        let mut container = Container::default();
        let resolver = Resolver::value("value".to_string());

        let first = resolver.resolve(&mut container).unwrap();
        let second = resolver.resolve(&mut container).unwrap();

        assert!(InstancePtr::ptr_eq(&first, &second));
    }

    #[test]
    fn should_forward_factory_error() {
        let mut container = Container::default();
        let resolver =
            Resolver::try_factory(|| -> Result<i32, ErrorPtr> { Err(error_ptr(TestError)) });

        assert!(matches!(
            resolver.resolve(&mut container).unwrap_err(),
            ContainerError::FactoryError(_)
        ));
    }

    #[test]
    fn should_classify_entries() {
        let entry = BindingEntry::Contextual(Default::default());
        assert_eq!(entry.kind(), BindingKind::Contextual);
    }
}
