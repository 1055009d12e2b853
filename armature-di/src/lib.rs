//! Runtime dependency injection container.
//!
//! Values are registered as [bindings](binding) under symbolic keys, with a singleton or
//! transient lifetime, optionally split into per-context variants. Types implementing
//! [Injectable](injectable::Injectable) can additionally be resolved by type reference, in which
//! case the [Container](container::Container) constructs them by recursively resolving the
//! dependencies declared in their capability record.
//!
//! ### Features
//!
//! * `threadsafe` - use threadsafe pointers and `Send + Sync` trait bounds
//! * `derive` - automatically derive [Injectable](injectable::Injectable) for structs

pub mod binding;
pub mod cache;
pub mod container;
mod error;
pub mod injectable;
pub mod instance;

pub use error::{BindingKind, ContainerError};

#[cfg(feature = "derive")]
pub use armature_di_derive::Injectable;
