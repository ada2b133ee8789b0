//! The presentation surface: the native element primitives the reconciler
//! drives.
//!
//! twig never creates native elements itself. A [`Surface`] is injected at
//! hydration time and receives small, self-contained mutations. The
//! [`MemorySurface`] implementation keeps a document in memory and is what
//! tests and the demo run against.

mod memory;

pub use memory::{MemorySurface, Mutation};

use std::fmt;

use crate::events::EventHandler;
use crate::node::Value;

/// Handle to a live node owned by a surface.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Native element capability used by the reconciler.
pub trait Surface {
    /// Find the first element matching `selector` in document order.
    fn query(&self, selector: &str) -> Option<NodeId>;

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Create a detached text node.
    fn create_text(&mut self, text: &str) -> NodeId;

    /// Replace the content of a text node.
    fn set_text(&mut self, node: NodeId, text: &str);

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &Value);

    fn remove_attribute(&mut self, node: NodeId, name: &str);

    /// Assign a property (as opposed to markup attributes).
    fn set_property(&mut self, node: NodeId, name: &str, value: &Value);

    fn remove_property(&mut self, node: NodeId, name: &str);

    fn add_class(&mut self, node: NodeId, class: &str);

    fn remove_class(&mut self, node: NodeId, class: &str);

    /// Bind a handler. Several handlers may be bound under one event name.
    fn add_listener(&mut self, node: NodeId, event: &str, handler: EventHandler);

    /// Unbind the handler that is pointer-identical to `handler`.
    fn remove_listener(&mut self, node: NodeId, event: &str, handler: &EventHandler);

    /// Handlers currently bound to `node` for `event`, in binding order.
    fn listeners(&self, node: NodeId, event: &str) -> Vec<EventHandler>;

    /// Insert `node` under `parent` before `before`, or append when `None`.
    fn insert(&mut self, parent: NodeId, node: NodeId, before: Option<NodeId>);

    /// Detach `node` from `parent` and drop its subtree.
    fn remove(&mut self, parent: NodeId, node: NodeId);

    /// Concatenated text of `node` and its descendants.
    fn text_content(&self, node: NodeId) -> String;

    /// Serialized markup of the children of `node`.
    fn inner_html(&self, node: NodeId) -> String;
}
