//! String-keyed state maps for component and global state.
//!
//! Values are stored type-erased and read back by type, so one map can hold
//! a counter, a flag and a list side by side:
//!
//! ```ignore
//! let mut state = State::new();
//! state.insert("count", 0i64);
//! state.update("count", || 0i64, |n| *n += 1);
//! assert_eq!(state.get::<i64>("count"), Some(1));
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A heterogeneous map from names to values.
#[derive(Default)]
pub struct State {
    values: HashMap<String, Box<dyn Any>>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clone of the value under `key`, if present with type `T`.
    pub fn get<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        self.get_ref::<T>(key).cloned()
    }

    pub fn get_ref<T: 'static>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|b| b.downcast_ref::<T>())
    }

    /// The value under `key`, or `default` when absent or of another type.
    pub fn get_or<T: Clone + 'static>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Store a value, replacing whatever was under `key`.
    pub fn insert<T: 'static>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    /// Mutate the value under `key` in place, initializing it first when it
    /// is absent or holds another type.
    pub fn update<T: 'static>(
        &mut self,
        key: &str,
        init: impl FnOnce() -> T,
        f: impl FnOnce(&mut T),
    ) {
        let needs_init = match self.values.get(key) {
            Some(existing) if existing.is::<T>() => false,
            Some(_) => {
                tracing::debug!("state key `{}` changes type; reinitializing", key);
                true
            }
            None => true,
        };
        if needs_init {
            self.values.insert(key.to_owned(), Box::new(init()));
        }
        if let Some(value) = self.values.get_mut(key).and_then(|b| b.downcast_mut::<T>()) {
            f(value);
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State").field("keys", &self.keys()).finish()
    }
}

/// A shared handle to a [`State`].
///
/// Used for component state: the instance owns one handle and event handlers
/// created during a pass hold clones.
#[derive(Clone, Default)]
pub struct StateCell(Rc<RefCell<State>>);

impl StateCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        self.0.borrow().get(key)
    }

    pub fn get_or<T: Clone + 'static>(&self, key: &str, default: T) -> T {
        self.0.borrow().get_or(key, default)
    }

    pub fn set<T: 'static>(&self, key: impl Into<String>, value: T) {
        self.0.borrow_mut().insert(key, value);
    }

    pub fn update<T: 'static>(&self, key: &str, init: impl FnOnce() -> T, f: impl FnOnce(&mut T)) {
        self.0.borrow_mut().update(key, init, f);
    }

    pub fn with<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        f(&self.0.borrow())
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    /// Whether both handles share one map.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for StateCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0.borrow(), f)
    }
}
