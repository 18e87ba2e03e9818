//! [`DecisionStore`] – typed, key-addressed decision table.
//!
//! Each entry is addressed by a string key *and* the Rust type of its value.
//! Reading a key that was never set, was cleared, or was set under another
//! type returns `None`; absence is an ordinary result, never an error.
//!
//! # Example
//!
//! ```
//! use junction_store::DecisionStore;
//!
//! let mut store = DecisionStore::new();
//! store.set("stop_start/1017", 42.0_f64);
//!
//! assert_eq!(store.get::<f64>("stop_start/1017"), Some(&42.0));
//! // Same key, different type: independent entry.
//! assert_eq!(store.get::<String>("stop_start/1017"), None);
//!
//! store.clear::<f64>("stop_start/1017");
//! assert!(store.is_empty());
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;

type Slot = Box<dyn Any + Send>;

/// Key-addressed table of typed values that lives for the owning session.
#[derive(Default)]
pub struct DecisionStore {
    entries: HashMap<String, HashMap<TypeId, Slot>>,
}

impl DecisionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the value stored under `key` with type `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.entries
            .get(key)?
            .get(&TypeId::of::<T>())?
            .downcast_ref::<T>()
    }

    /// Mutably borrow the value stored under `key` with type `T`.
    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.entries
            .get_mut(key)?
            .get_mut(&TypeId::of::<T>())?
            .downcast_mut::<T>()
    }

    /// Store `value` under `key`, overwriting any previous value of the same
    /// type.  Returns the previous value, if any.
    pub fn set<T: Any + Send>(&mut self, key: &str, value: T) -> Option<T> {
        let previous = self
            .entries
            .entry(key.to_string())
            .or_default()
            .insert(TypeId::of::<T>(), Box::new(value))?;
        previous.downcast::<T>().ok().map(|boxed| *boxed)
    }

    /// Remove the `T`-typed entry under `key`, returning it.
    ///
    /// Entries of other types under the same key are untouched.
    pub fn clear<T: Any>(&mut self, key: &str) -> Option<T> {
        let slots = self.entries.get_mut(key)?;
        let removed = slots.remove(&TypeId::of::<T>());
        if slots.is_empty() {
            self.entries.remove(key);
        }
        removed?.downcast::<T>().ok().map(|boxed| *boxed)
    }

    /// Remove every entry under `key` regardless of type.  Returns the number
    /// of entries removed.
    pub fn clear_key(&mut self, key: &str) -> usize {
        self.entries.remove(key).map_or(0, |slots| slots.len())
    }

    /// `true` when a `T`-typed entry exists under `key`.
    pub fn contains<T: Any>(&self, key: &str) -> bool {
        self.get::<T>(key).is_some()
    }

    /// `true` when `key` holds at least one entry, but none of type `T`.
    pub fn holds_other_type<T: Any>(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|slots| !slots.contains_key(&TypeId::of::<T>()))
    }

    /// Keys that currently hold at least one entry.  Order is unspecified.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Total number of typed entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for DecisionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionStore")
            .field("keys", &self.entries.len())
            .field("entries", &self.len())
            .finish()
    }
}
