//! Event handler values carried by virtual nodes.
//!
//! Handlers are rebuilt on every render pass, so they are compared by
//! pointer identity: a handler that survives unchanged between two trees
//! (the same `Rc`) is never rebound, anything else is.

use std::fmt;
use std::rc::Rc;

use crate::surface::NodeId;

/// An event delivered to a bound handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// The event name, e.g. `"click"`.
    pub name: String,
    /// The live node the handler is bound to.
    pub target: NodeId,
}

/// A cloneable event callback.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    /// Create a handler from a closure.
    pub fn new<F: Fn(&Event) + 'static>(f: F) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the handler.
    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    /// Whether both values wrap the same closure allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<F: Fn(&Event) + 'static> From<F> for EventHandler {
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventHandler(...)")
    }
}

/// Compare two handler lists by identity, position by position.
pub fn same_handlers(a: &[EventHandler], b: &[EventHandler]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.ptr_eq(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn call_invokes_closure() {
        let called = Rc::new(Cell::new(0));
        let called_clone = Rc::clone(&called);
        let handler = EventHandler::new(move |event| {
            assert_eq!(event.name, "click");
            called_clone.set(called_clone.get() + 1);
        });

        handler.call(&Event {
            name: "click".into(),
            target: NodeId(3),
        });
        assert_eq!(called.get(), 1);
    }

    #[test]
    fn identity_follows_the_allocation() {
        let a = EventHandler::new(|_| {});
        let b = a.clone();
        let c = EventHandler::new(|_| {});

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert!(same_handlers(&[a.clone(), b.clone()], &[b, a.clone()]));
        assert!(!same_handlers(&[a.clone()], &[c]));
        assert!(!same_handlers(&[a.clone()], &[]));
    }
}
