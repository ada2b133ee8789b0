//! The process-wide state store.
//!
//! One [`Store`] is created at hydration time and lives as long as the
//! application. Components reach it through [`Context::state`], which also
//! records them as subscribers for the current pass. Mutation goes through
//! [`Store::set`] only, which applies the change and asks the bound
//! scheduler for a refresh; the scheduler collapses a burst of requests made
//! while one event is being handled into a single pass.
//!
//! [`Context::state`]: crate::context::Context::state

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexSet;

use crate::context::RefreshHandle;
use crate::registry::InstanceId;
use crate::state::State;

#[derive(Default)]
struct StoreInner {
    state: RefCell<State>,
    /// Subscribers recorded by the last completed pass.
    subscribers: RefCell<IndexSet<InstanceId>>,
    /// Subscribers recorded so far by the running pass.
    recording: RefCell<Option<IndexSet<InstanceId>>>,
    refresh: RefCell<RefreshHandle>,
}

/// Shared handle to the global state.
#[derive(Clone, Default)]
pub struct Store {
    inner: Rc<StoreInner>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with initial values.
    pub fn with_state(state: State) -> Self {
        let store = Self::default();
        *store.inner.state.borrow_mut() = state;
        store
    }

    /// Route refresh requests raised by [`Store::set`] to `refresh`.
    pub fn bind(&self, refresh: RefreshHandle) {
        *self.inner.refresh.borrow_mut() = refresh;
    }

    /// Read the state.
    pub fn get<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Apply a mutation, then request one refresh.
    pub fn set(&self, mutator: impl FnOnce(&mut State)) {
        mutator(&mut self.inner.state.borrow_mut());
        let refresh = self.inner.refresh.borrow().clone();
        refresh.refresh();
    }

    /// Instances subscribed as of the last completed pass.
    pub fn subscribers(&self) -> Vec<InstanceId> {
        self.inner.subscribers.borrow().iter().copied().collect()
    }

    pub fn is_subscribed(&self, instance: InstanceId) -> bool {
        self.inner.subscribers.borrow().contains(&instance)
    }

    /// Start recording subscribers for a new pass.
    pub fn begin_pass(&self) {
        *self.inner.recording.borrow_mut() = Some(IndexSet::new());
    }

    /// Replace the subscriber list with what the pass recorded, dropping
    /// instances that did not read the store this time.
    pub fn end_pass(&self) {
        if let Some(recorded) = self.inner.recording.borrow_mut().take() {
            let dropped = self
                .inner
                .subscribers
                .borrow()
                .iter()
                .filter(|id| !recorded.contains(*id))
                .count();
            if dropped > 0 {
                tracing::trace!(dropped, "store subscribers dropped");
            }
            *self.inner.subscribers.borrow_mut() = recorded;
        }
    }

    /// Forget every subscriber, e.g. on unmount.
    pub fn clear_subscribers(&self) {
        self.inner.subscribers.borrow_mut().clear();
        self.inner.recording.borrow_mut().take();
    }

    /// Record `instance` as a reader of the current pass. Reads outside a
    /// pass (from event handlers) record nothing.
    pub(crate) fn track(&self, instance: InstanceId) {
        if let Some(recording) = self.inner.recording.borrow_mut().as_mut() {
            recording.insert(instance);
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.inner.state.borrow())
            .field("subscribers", &*self.inner.subscribers.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RefreshTarget;
    use std::cell::Cell;
    use std::rc::Weak;

    struct Counter(Cell<usize>);

    impl RefreshTarget for Counter {
        fn request_refresh(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn set_mutates_then_requests_refresh() {
        let target = Rc::new(Counter(Cell::new(0)));
        let store = Store::new();
        store.bind(RefreshHandle::new(
            Rc::downgrade(&target) as Weak<dyn RefreshTarget>
        ));

        store.set(|s| s.insert("flag", true));
        assert_eq!(store.get(|s| s.get::<bool>("flag")), Some(true));
        assert_eq!(target.0.get(), 1);
    }

    #[test]
    fn subscribers_follow_the_latest_pass() {
        let store = Store::new();

        store.begin_pass();
        store.track(InstanceId(1));
        store.track(InstanceId(2));
        store.end_pass();
        assert_eq!(store.subscribers(), [InstanceId(1), InstanceId(2)]);

        store.begin_pass();
        store.track(InstanceId(2));
        store.end_pass();
        assert_eq!(store.subscribers(), [InstanceId(2)]);
        assert!(!store.is_subscribed(InstanceId(1)));
    }

    #[test]
    fn reads_outside_a_pass_do_not_subscribe() {
        let store = Store::new();
        store.track(InstanceId(9));
        assert!(store.subscribers().is_empty());
    }

    #[test]
    fn seeded_state_is_visible() {
        let mut seed = State::new();
        seed.insert("count", 5i64);
        let store = Store::with_state(seed);
        assert_eq!(store.get(|s| s.get::<i64>("count")), Some(5));
    }
}
