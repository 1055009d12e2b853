use crate::instance::ErrorPtr;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Classification of an existing binding, reported on collisions.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum BindingKind {
    Plain,
    Contextual,
}

impl Display for BindingKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingKind::Plain => write!(f, "plain"),
            BindingKind::Contextual => write!(f, "contextual"),
        }
    }
}

/// Errors related to registering bindings and resolving instances.
#[derive(Error, Clone, Debug)]
pub enum ContainerError {
    #[error("Cannot bind '{key}': key already holds a {existing} binding")]
    BindingCollision { key: String, existing: BindingKind },
    #[error("Attempted to override an existing binding with key: {0}")]
    BindingOverride(String),
    #[error("Binding not found for key: {0}")]
    UnboundKey(String),
    #[error("Context key required to resolve contextual binding: {0}")]
    ContextRequired(String),
    #[error("Binding not found for key '{key}' in context '{context}'")]
    UnboundContext { key: String, context: String },
    #[error("Cannot resolve parameter #{index} of type {expected} for {owner}; bind it by key")]
    UnresolvableDependency {
        index: usize,
        expected: String,
        owner: &'static str,
    },
    #[error("Detected dependency cycle while resolving: {0}")]
    DependencyCycle(String),
    #[error("Instance bound to '{key}' is not of type {expected}")]
    IncompatibleInstance { key: String, expected: &'static str },
    #[error("Error in instance factory: {0}")]
    FactoryError(ErrorPtr),
}
