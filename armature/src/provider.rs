//! Service providers group related bindings. Each provider gets the shared
//! [Container](armature_di::container::Container) at construction time, installs its bindings in
//! [ServiceProvider::register] and can resolve services in [ServiceProvider::boot], which runs
//! only after every provider has registered.
//!
//! Providers are discovered statically with [register_provider](crate::register_provider):
//!
//! ```
//! use armature::provider::{FromContainer, ServiceProvider};
//! use armature::register_provider;
//! use armature_di::binding::Resolver;
//! use armature_di::container::SharedContainer;
//! use armature_di::instance::{error_ptr, ErrorPtr};
//!
//! struct MailProvider {
//!     container: SharedContainer,
//! }
//!
//! impl FromContainer for MailProvider {
//!     fn from_container(container: SharedContainer) -> Self {
//!         Self { container }
//!     }
//! }
//!
//! impl ServiceProvider for MailProvider {
//!     fn register(&self) -> Result<(), ErrorPtr> {
//!         self.container
//!             .with(|container| container.singleton("mail.host", Resolver::value("localhost")))
//!             .map_err(error_ptr)
//!     }
//! }
//!
//! register_provider!("mail", MailProvider);
//! ```

use armature_di::container::SharedContainer;
use armature_di::instance::{ErrorPtr, InstanceBound};
use derive_more::Constructor;
#[cfg(test)]
use mockall::automock;
use std::fmt::{Debug, Formatter};

#[cfg(feature = "threadsafe")]
pub type ServiceProviderPtr = Box<dyn ServiceProvider + Send + Sync>;

#[cfg(not(feature = "threadsafe"))]
pub type ServiceProviderPtr = Box<dyn ServiceProvider>;

/// Unit of application setup, run by the [Application](crate::application::Application).
#[cfg_attr(test, automock)]
pub trait ServiceProvider {
    /// Installs bindings in the container. Called exactly once.
    fn register(&self) -> Result<(), ErrorPtr>;

    /// Runs after all providers have registered. Called exactly once. Default no-op.
    fn boot(&self) -> Result<(), ErrorPtr> {
        Ok(())
    }

    /// Returns the priority for this provider. Higher priorities get registered first. Default 0.
    fn priority(&self) -> i8 {
        0
    }
}

/// Construction of a provider from the shared container.
pub trait FromContainer: Sized {
    fn from_container(container: SharedContainer) -> Self;
}

/// Named recipe for a provider.
#[derive(Clone, Copy, Constructor)]
pub struct ProviderDefinition {
    pub name: &'static str,
    pub create: fn(SharedContainer) -> ServiceProviderPtr,
}

impl Debug for ProviderDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDefinition")
            .field("name", &self.name)
            .finish()
    }
}

/// Creates a boxed provider of given type. Used by [register_provider](crate::register_provider).
pub fn create_provider<P>(container: SharedContainer) -> ServiceProviderPtr
where
    P: ServiceProvider + FromContainer + InstanceBound,
{
    Box::new(P::from_container(container))
}

/// Returns all definitions submitted with [register_provider](crate::register_provider).
pub fn discovered_providers() -> impl Iterator<Item = &'static ProviderDefinition> {
    inventory::iter::<ProviderDefinition>.into_iter()
}

inventory::collect!(ProviderDefinition);

/// Registers a provider type under a name for discovery by the
/// [Application](crate::application::Application). The type must implement both
/// [ServiceProvider] and [FromContainer].
#[macro_export]
macro_rules! register_provider {
    ($name:expr, $provider:ty) => {
        $crate::provider::internal::submit! {
            $crate::provider::ProviderDefinition {
                name: $name,
                create: $crate::provider::create_provider::<$provider>,
            }
        }
    };
}

#[doc(hidden)]
pub mod internal {
    pub use inventory::submit;
}
