//! Types constructible by injection implement [Injectable]. The trait attaches a
//! [CapabilityRecord] to the type - the ordered list of the types its constructor depends on -
//! which the [Container](crate::container::Container) reads to build instances automatically.
//!
//! ## Marking types
//!
//! With the `derive` feature enabled, the record is generated from the struct fields:
//!
//! ```
//! use armature_di::container::Container;
//! use armature_di::instance::InstancePtr;
//! use armature_di::Injectable;
//!
//! #[derive(Injectable)]
//! struct Mailer;
//!
//! #[derive(Injectable)]
//! struct Newsletter {
//!     // resolved by type reference
//!     mailer: InstancePtr<Mailer>,
//!     // resolved from a symbolic binding
//!     #[inject(key = "sender")]
//!     sender: String,
//!     // not a dependency at all
//!     #[inject(default)]
//!     sent: u32,
//! }
//!
//! let mut container = Container::default();
//! container
//!     .singleton("sender", armature_di::binding::Resolver::value("news@example.com".to_string()))
//!     .unwrap();
//!
//! let newsletter = container.resolve_type::<Newsletter>().unwrap();
//! assert_eq!(newsletter.sender, "news@example.com");
//! ```
//!
//! ### Field mapping
//!
//! * `Arc<T>`, `Rc<T>` or `InstancePtr<T>` - dependency on the injectable type `T`
//! * string, numeric, boolean and character primitives - recorded as a [PrimitiveType], which
//! cannot be constructed and fails resolution, unless the field has a `key`
//! * any other type - recorded as [PrimitiveType::Untyped]
//!
//! ### Supported `#[inject]` field configuration
//!
//! * `key = "name"` - resolve the field from the binding under `name`
//! * `context = "ctx"` - together with `key`, resolve from the contextual binding `ctx`
//! * `default` - use `Default::default()` initialization, not a dependency
//! * `default = "expr"` - call `expr()` for initialization, not a dependency
//!
//! The record is built once per type and never changes afterwards.

use crate::container::Container;
use crate::error::ContainerError;
use crate::instance::{erase, InstanceAnyPtr, InstanceBound, InstancePtr};
use derivative::Derivative;
use std::any::{type_name, TypeId};
use std::fmt::{Display, Formatter};

/// Base trait for types constructible by injection.
pub trait Injectable: InstanceBound + Sized {
    /// Returns the record of constructor dependencies for this type.
    fn capability() -> &'static CapabilityRecord;

    /// Creates an instance from dependencies resolved in the order of the
    /// [capability record](Injectable::capability).
    fn construct(dependencies: &mut Dependencies) -> Result<Self, ContainerError>;
}

/// Non-constructible dependency kinds.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum PrimitiveType {
    String,
    Number,
    Boolean,
    Character,
    BigInteger,
    /// No usable type information.
    Untyped,
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PrimitiveType::String => "string",
            PrimitiveType::Number => "number",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Character => "character",
            PrimitiveType::BigInteger => "big integer",
            PrimitiveType::Untyped => "untyped",
        };

        write!(f, "{name}")
    }
}

/// Reference to an [Injectable] type, usable as a resolution key.
#[derive(Derivative, Clone, Copy)]
#[derivative(Debug, PartialEq, Eq, Hash)]
pub struct TypeReference {
    pub type_id: TypeId,
    #[derivative(PartialEq = "ignore", Hash = "ignore")]
    pub type_name: &'static str,
    #[derivative(Debug = "ignore", PartialEq = "ignore", Hash = "ignore")]
    pub construct: fn(&mut Container) -> Result<InstanceAnyPtr, ContainerError>,
}

impl TypeReference {
    pub fn of<T: Injectable>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            construct: construct_erased::<T>,
        }
    }
}

fn construct_erased<T: Injectable>(
    container: &mut Container,
) -> Result<InstanceAnyPtr, ContainerError> {
    let record = T::capability();
    let instances = container.resolve_dependencies(record)?;

    T::construct(&mut Dependencies::new(record, instances)).map(erase)
}

/// Single constructor dependency.
#[derive(Clone, Debug)]
pub enum DependencyType {
    Primitive(PrimitiveType),
    Type(TypeReference),
    /// Explicit binding looked up by symbolic key, optionally within a context.
    Binding {
        key: String,
        context: Option<String>,
        type_name: &'static str,
    },
}

impl DependencyType {
    #[inline]
    pub fn of<T: Injectable>() -> Self {
        Self::Type(TypeReference::of::<T>())
    }

    #[inline]
    pub fn binding<T: ?Sized>(key: &str, context: Option<&str>) -> Self {
        Self::Binding {
            key: key.to_string(),
            context: context.map(str::to_string),
            type_name: type_name::<T>(),
        }
    }
}

impl Display for DependencyType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DependencyType::Primitive(primitive) => write!(f, "{primitive}"),
            DependencyType::Type(reference) => write!(f, "{}", reference.type_name),
            DependencyType::Binding {
                key,
                context: Some(context),
                type_name,
            } => write!(f, "{type_name} (bound to '{key}' in context '{context}')"),
            DependencyType::Binding {
                key,
                context: None,
                type_name,
            } => write!(f, "{type_name} (bound to '{key}')"),
        }
    }
}

/// Ordered constructor dependencies of a type.
#[derive(Clone, Debug)]
pub struct CapabilityRecord {
    pub owner: &'static str,
    pub dependencies: Vec<DependencyType>,
}

impl CapabilityRecord {
    #[inline]
    pub fn new<T: ?Sized>(dependencies: Vec<DependencyType>) -> Self {
        Self {
            owner: type_name::<T>(),
            dependencies,
        }
    }
}

/// Resolved dependency instances handed to [Injectable::construct], addressed by their position
/// in the capability record.
pub struct Dependencies {
    record: &'static CapabilityRecord,
    instances: Vec<Option<InstanceAnyPtr>>,
}

impl Dependencies {
    pub fn new(record: &'static CapabilityRecord, instances: Vec<InstanceAnyPtr>) -> Self {
        Self {
            record,
            instances: instances.into_iter().map(Some).collect(),
        }
    }

    /// Takes the instance at given position.
    pub fn instance<T: InstanceBound>(
        &mut self,
        index: usize,
    ) -> Result<InstancePtr<T>, ContainerError> {
        self.take(index)?
            .downcast::<T>()
            .map_err(|_| self.incompatible::<T>(index))
    }

    /// Takes a copy of the value at given position.
    pub fn value<T: InstanceBound + Clone>(&mut self, index: usize) -> Result<T, ContainerError> {
        self.take(index)?
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| self.incompatible::<T>(index))
    }

    /// Fails for a dependency which cannot be constructed.
    pub fn unresolvable<T>(&self, index: usize) -> Result<T, ContainerError> {
        Err(self.unresolvable_error(index))
    }

    fn take(&mut self, index: usize) -> Result<InstanceAnyPtr, ContainerError> {
        self.instances
            .get_mut(index)
            .and_then(Option::take)
            .ok_or_else(|| self.unresolvable_error(index))
    }

    fn unresolvable_error(&self, index: usize) -> ContainerError {
        ContainerError::UnresolvableDependency {
            index,
            expected: self.expected(index),
            owner: self.record.owner,
        }
    }

    fn expected(&self, index: usize) -> String {
        self.record
            .dependencies
            .get(index)
            .map(|dependency| dependency.to_string())
            .unwrap_or_else(|| PrimitiveType::Untyped.to_string())
    }

    fn incompatible<T>(&self, index: usize) -> ContainerError {
        ContainerError::IncompatibleInstance {
            key: format!("{}#{index}", self.record.owner),
            expected: type_name::<T>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::container::Container;
    use crate::error::ContainerError;
    use crate::injectable::{
        CapabilityRecord, Dependencies, DependencyType, Injectable, PrimitiveType, TypeReference,
    };
    use crate::instance::{erase, InstancePtr};
    use std::any::TypeId;
    use std::sync::OnceLock;

    #[derive(Debug)]
    struct TestDependency;

    impl Injectable for TestDependency {
        fn capability() -> &'static CapabilityRecord {
            static RECORD: OnceLock<CapabilityRecord> = OnceLock::new();
            RECORD.get_or_init(|| CapabilityRecord::new::<Self>(vec![]))
        }

        fn construct(_dependencies: &mut Dependencies) -> Result<Self, ContainerError> {
            Ok(Self)
        }
    }

    fn record() -> &'static CapabilityRecord {
        static RECORD: OnceLock<CapabilityRecord> = OnceLock::new();
        RECORD.get_or_init(|| {
            CapabilityRecord::new::<TestDependency>(vec![
                DependencyType::of::<TestDependency>(),
                DependencyType::binding::<String>("name", None),
                DependencyType::Primitive(PrimitiveType::Number),
            ])
        })
    }

    #[test]
    fn should_compare_type_references_by_type() {
        assert_eq!(
            TypeReference::of::<TestDependency>(),
            TypeReference::of::<TestDependency>()
        );
        assert_eq!(
            TypeReference::of::<TestDependency>().type_id,
            TypeId::of::<TestDependency>()
        );
    }

    #[test]
    fn should_construct_through_type_reference() {
        let mut container = Container::default();
        let instance = (TypeReference::of::<TestDependency>().construct)(&mut container).unwrap();

        assert!(instance.is::<TestDependency>());
    }

    #[test]
    fn should_take_dependencies_by_position() {
        let dependency = erase(TestDependency);
        let mut dependencies =
            Dependencies::new(record(), vec![dependency.clone(), erase("n".to_string())]);

        assert!(InstancePtr::ptr_eq(
            &dependencies.instance::<TestDependency>(0).unwrap(),
            &dependency.downcast::<TestDependency>().unwrap()
        ));
        assert_eq!(dependencies.value::<String>(1).unwrap(), "n");
    }

    #[test]
    fn should_report_unresolvable_dependency() {
        let dependencies = Dependencies::new(record(), vec![]);

        match dependencies.unresolvable::<u8>(2).unwrap_err() {
            ContainerError::UnresolvableDependency {
                index,
                expected,
                owner,
            } => {
                assert_eq!(index, 2);
                assert_eq!(expected, "number");
                assert!(owner.ends_with("TestDependency"));
            }
            error => panic!("unexpected error: {error}"),
        }
    }

    #[test]
    fn should_reject_incompatible_dependency() {
        let mut dependencies = Dependencies::new(record(), vec![erase(0_u8)]);

        assert!(matches!(
            dependencies.instance::<TestDependency>(0).unwrap_err(),
            ContainerError::IncompatibleInstance { .. }
        ));
    }
}
