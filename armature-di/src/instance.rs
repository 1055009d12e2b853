//! Pointer types used to hand out resolved instances. With the `threadsafe` feature (default)
//! instances are shared via [Arc] and must be `Send + Sync`; without it, [Rc] is used and no
//! thread bounds apply.

use std::any::Any;
use std::error::Error;
#[cfg(not(feature = "threadsafe"))]
use std::rc::Rc;
#[cfg(feature = "threadsafe")]
use std::sync::Arc;

#[cfg(not(feature = "threadsafe"))]
pub type InstancePtr<T> = Rc<T>;
#[cfg(feature = "threadsafe")]
pub type InstancePtr<T> = Arc<T>;

#[cfg(not(feature = "threadsafe"))]
pub type InstanceAnyPtr = InstancePtr<dyn Any + 'static>;
#[cfg(feature = "threadsafe")]
pub type InstanceAnyPtr = InstancePtr<dyn Any + Send + Sync + 'static>;

#[cfg(not(feature = "threadsafe"))]
pub type ErrorPtr = InstancePtr<dyn Error + 'static>;
#[cfg(feature = "threadsafe")]
pub type ErrorPtr = InstancePtr<dyn Error + Send + Sync + 'static>;

/// Bounds required from every value stored in a [Container](crate::container::Container).
#[cfg(feature = "threadsafe")]
pub trait InstanceBound: Any + Send + Sync {}

#[cfg(feature = "threadsafe")]
impl<T: Any + Send + Sync> InstanceBound for T {}

/// Bounds required from every value stored in a [Container](crate::container::Container).
#[cfg(not(feature = "threadsafe"))]
pub trait InstanceBound: Any {}

#[cfg(not(feature = "threadsafe"))]
impl<T: Any> InstanceBound for T {}

/// Bounds required from factory closures.
#[cfg(feature = "threadsafe")]
pub trait FactoryBound: Send + Sync + 'static {}

#[cfg(feature = "threadsafe")]
impl<T: Send + Sync + 'static> FactoryBound for T {}

/// Bounds required from factory closures.
#[cfg(not(feature = "threadsafe"))]
pub trait FactoryBound: 'static {}

#[cfg(not(feature = "threadsafe"))]
impl<T: 'static> FactoryBound for T {}

/// Wraps any error into an [ErrorPtr].
#[cfg(feature = "threadsafe")]
pub fn error_ptr<E: Error + Send + Sync + 'static>(error: E) -> ErrorPtr {
    Arc::new(error) as ErrorPtr
}

/// Wraps any error into an [ErrorPtr].
#[cfg(not(feature = "threadsafe"))]
pub fn error_ptr<E: Error + 'static>(error: E) -> ErrorPtr {
    Rc::new(error) as ErrorPtr
}

/// Erases the type of given value.
#[inline]
pub fn erase<T: InstanceBound>(value: T) -> InstanceAnyPtr {
    InstancePtr::new(value) as InstanceAnyPtr
}
