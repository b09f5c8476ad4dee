//! Specialized collection types

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub use slotmap::{DefaultKey, SlotMap};

/// Handle-based map using slot map for stable references
pub type HandleMap<T> = SlotMap<DefaultKey, T>;

/// Handle type for stable references
pub type Handle = DefaultKey;

/// Typed handle for type-safe references into a [`HandleMap`]
///
/// The marker is `fn() -> T` so the handle stays `Copy`, `Send` and `Sync`
/// regardless of `T`.
pub struct TypedHandle<T> {
    key: DefaultKey,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> TypedHandle<T> {
    /// Create a new typed handle from a key
    pub fn new(key: DefaultKey) -> Self {
        Self {
            key,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying key
    pub fn key(&self) -> DefaultKey {
        self.key
    }
}

impl<T> Clone for TypedHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedHandle<T> {}

impl<T> PartialEq for TypedHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for TypedHandle<T> {}

impl<T> Hash for TypedHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T> fmt::Debug for TypedHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedHandle").field(&self.key).finish()
    }
}

/// Slot map storage that hands out typed handles
pub struct TypedHandleMap<T> {
    slots: HandleMap<T>,
}

impl<T> Default for TypedHandleMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TypedHandleMap<T> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            slots: HandleMap::new(),
        }
    }

    /// Insert a value and return its handle
    pub fn insert(&mut self, value: T) -> TypedHandle<T> {
        TypedHandle::new(self.slots.insert(value))
    }

    /// Remove a value; stale handles return `None` afterwards
    pub fn remove(&mut self, handle: TypedHandle<T>) -> Option<T> {
        self.slots.remove(handle.key())
    }

    /// Borrow a value
    pub fn get(&self, handle: TypedHandle<T>) -> Option<&T> {
        self.slots.get(handle.key())
    }

    /// Mutably borrow a value
    pub fn get_mut(&mut self, handle: TypedHandle<T>) -> Option<&mut T> {
        self.slots.get_mut(handle.key())
    }

    /// Whether the handle still refers to a live value
    pub fn contains(&self, handle: TypedHandle<T>) -> bool {
        self.slots.contains_key(handle.key())
    }

    /// Number of live values
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Remove every value
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Iterate over handles and values
    pub fn iter(&self) -> impl Iterator<Item = (TypedHandle<T>, &T)> {
        self.slots.iter().map(|(key, value)| (TypedHandle::new(key), value))
    }

    /// Iterate mutably over handles and values
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (TypedHandle<T>, &mut T)> {
        self.slots
            .iter_mut()
            .map(|(key, value)| (TypedHandle::new(key), value))
    }
}
