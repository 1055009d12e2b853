//! Storage for resolved instances. Symbolic singletons, contextual singletons and instances
//! resolved by type reference each live in their own address space, expressed by [CacheKey].
//!
//! Note: [InstanceCache::find_by_type] powers opportunistic reuse during automatic
//! construction: any cached instance of the requested runtime type is accepted, regardless of
//! the key it was cached under. This assumes a single live instance per concrete type - when
//! two differently keyed singletons produce the same type, the one cached first wins.

use crate::instance::InstanceAnyPtr;
use fxhash::FxHashMap;
use std::any::{Any, TypeId};
use std::fmt::{Display, Formatter};

/// Effective key of a cached instance.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum CacheKey {
    /// Plain singleton bound under a symbolic key.
    Name(String),
    /// Singleton of a contextual binding group.
    Context { key: String, context: String },
    /// Instance resolved by type reference.
    Type(TypeId),
}

impl CacheKey {
    #[inline]
    pub fn name<T: ToString>(key: T) -> Self {
        Self::Name(key.to_string())
    }

    #[inline]
    pub fn context<K: ToString, C: ToString>(key: K, context: C) -> Self {
        Self::Context {
            key: key.to_string(),
            context: context.to_string(),
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Name(key) => write!(f, "{key}"),
            CacheKey::Context { key, context } => write!(f, "{key}:{context}"),
            CacheKey::Type(type_id) => write!(f, "{type_id:?}"),
        }
    }
}

#[derive(Default)]
pub struct InstanceCache {
    instances: FxHashMap<CacheKey, (u64, InstanceAnyPtr)>,
    next_sequence: u64,
}

impl InstanceCache {
    /// Gets an instance stored under the given key.
    #[inline]
    pub fn instance(&self, key: &CacheKey) -> Option<InstanceAnyPtr> {
        self.instances.get(key).map(|(_, instance)| instance.clone())
    }

    /// Stores given instance. An existing instance under the same key gets replaced.
    pub fn store_instance(&mut self, key: CacheKey, instance: InstanceAnyPtr) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.instances.insert(key, (sequence, instance));
    }

    /// Removes an instance, returning it if present.
    #[inline]
    pub fn evict(&mut self, key: &CacheKey) -> Option<InstanceAnyPtr> {
        self.instances.remove(key).map(|(_, instance)| instance)
    }

    #[inline]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.instances.contains_key(key)
    }

    /// Finds a cached instance with the given runtime type. An instance cached under the exact
    /// type key is preferred; otherwise the earliest cached matching instance is returned.
    pub fn find_by_type(&self, type_id: TypeId) -> Option<InstanceAnyPtr> {
        self.instance(&CacheKey::Type(type_id)).or_else(|| {
            self.instances
                .values()
                .filter(|(_, instance)| {
                    let instance: &dyn Any = &**instance;
                    instance.type_id() == type_id
                })
                .min_by_key(|(sequence, _)| *sequence)
                .map(|(_, instance)| instance.clone())
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
