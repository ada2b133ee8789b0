//! An in-memory document implementing [`Surface`].

use std::fmt::Write as _;

use indexmap::{IndexMap, IndexSet};

use super::{NodeId, Surface};
use crate::events::EventHandler;
use crate::node::Value;

/// Escape text for inclusion in markup or a quoted attribute.
pub fn html_escape_string(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// One primitive applied to the surface, as recorded in the mutation log.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateElement { node: NodeId, tag: String },
    CreateText { node: NodeId, text: String },
    SetText { node: NodeId, text: String },
    SetAttribute { node: NodeId, name: String, value: Value },
    RemoveAttribute { node: NodeId, name: String },
    SetProperty { node: NodeId, name: String, value: Value },
    RemoveProperty { node: NodeId, name: String },
    AddClass { node: NodeId, class: String },
    RemoveClass { node: NodeId, class: String },
    AddListener { node: NodeId, event: String },
    RemoveListener { node: NodeId, event: String },
    Insert { parent: NodeId, node: NodeId, before: Option<NodeId> },
    Remove { parent: NodeId, node: NodeId },
}

#[derive(Default)]
struct ElementData {
    tag: String,
    attributes: IndexMap<String, Value>,
    properties: IndexMap<String, Value>,
    classes: IndexSet<String>,
    listeners: IndexMap<String, Vec<EventHandler>>,
}

enum Content {
    Element(ElementData),
    Text(String),
}

struct LiveNode {
    content: Content,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A document kept in memory.
///
/// The root is a `body` element at [`MemorySurface::root`]. Every primitive
/// the reconciler applies is appended to a mutation log, which is how tests
/// check that a pass changed nothing.
///
/// Slots freed by [`Surface::remove`] are reused, so a removed node's id may
/// later name another node.
pub struct MemorySurface {
    nodes: Vec<Option<LiveNode>>,
    free: Vec<NodeId>,
    log: Vec<Mutation>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    pub fn new() -> Self {
        let body = LiveNode {
            content: Content::Element(ElementData {
                tag: "body".into(),
                ..Default::default()
            }),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![Some(body)],
            free: Vec::new(),
            log: Vec::new(),
        }
    }

    /// A document whose body holds one `<div id="{id}">` host element.
    pub fn with_host(id: &str) -> Self {
        let mut surface = Self::new();
        surface.create_host("div", id);
        surface
    }

    /// The `body` element.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append an element with the given `id` attribute to the body.
    ///
    /// Setup only: not recorded in the mutation log.
    pub fn create_host(&mut self, tag: &str, id: &str) -> NodeId {
        let node = self.alloc(Content::Element(ElementData {
            tag: tag.to_owned(),
            attributes: IndexMap::from([("id".to_owned(), Value::from(id))]),
            ..Default::default()
        }));
        self.attach(self.root(), node, None);
        node
    }

    // ------------------------------------------------------------------------
    // Mutation log
    // ------------------------------------------------------------------------

    pub fn mutations(&self) -> &[Mutation] {
        &self.log
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.log)
    }

    pub fn mutation_count(&self) -> usize {
        self.log.len()
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// Whether `node` exists (attached or not).
    pub fn contains(&self, node: NodeId) -> bool {
        self.live(node).is_some()
    }

    /// Whether `node` is reachable from the root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.root() {
                return true;
            }
            current = self.live(id).and_then(|n| n.parent);
        }
        false
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag.as_str())
    }

    /// The content of a text node.
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.live(node)?.content {
            Content::Text(text) => Some(text),
            Content::Element(_) => None,
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&Value> {
        self.element(node)?.attributes.get(name)
    }

    /// Attribute names in insertion order.
    pub fn attribute_names(&self, node: NodeId) -> Vec<String> {
        self.element(node)
            .map(|e| e.attributes.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn property(&self, node: NodeId, name: &str) -> Option<&Value> {
        self.element(node)?.properties.get(name)
    }

    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.element(node)
            .map(|e| e.classes.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.live(node).map(|n| n.children.clone()).unwrap_or_default()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.live(node)?.parent
    }

    /// Number of live nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Serialized markup of `node` itself.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    /// Serialized markup of the whole document.
    pub fn to_html(&self) -> String {
        self.outer_html(self.root())
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn alloc(&mut self, content: Content) -> NodeId {
        let live = LiveNode {
            content,
            parent: None,
            children: Vec::new(),
        };
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = Some(live);
                id
            }
            None => {
                self.nodes.push(Some(live));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn live(&self, node: NodeId) -> Option<&LiveNode> {
        self.nodes.get(node.0).and_then(Option::as_ref)
    }

    fn live_mut(&mut self, node: NodeId) -> Option<&mut LiveNode> {
        self.nodes.get_mut(node.0).and_then(Option::as_mut)
    }

    fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.live(node)?.content {
            Content::Element(el) => Some(el),
            Content::Text(_) => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        let found = match self.live_mut(node) {
            Some(LiveNode {
                content: Content::Element(el),
                ..
            }) => Some(el),
            _ => None,
        };
        if found.is_none() {
            tracing::warn!(%node, "element operation on a missing or text node");
        }
        found
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.live(node).and_then(|n| n.parent) {
            if let Some(p) = self.live_mut(parent) {
                p.children.retain(|&c| c != node);
            }
        }
        if let Some(n) = self.live_mut(node) {
            n.parent = None;
        }
    }

    fn attach(&mut self, parent: NodeId, node: NodeId, before: Option<NodeId>) -> bool {
        if self.live(parent).is_none() || self.live(node).is_none() {
            tracing::warn!(%parent, %node, "insert with a missing node");
            return false;
        }
        self.detach(node);
        let Some(p) = self.live_mut(parent) else {
            return false;
        };
        let index = before.and_then(|b| p.children.iter().position(|&c| c == b));
        if before.is_some() && index.is_none() {
            tracing::warn!(%parent, "insertion anchor is not a child; appending");
        }
        match index {
            Some(i) => p.children.insert(i, node),
            None => p.children.push(node),
        }
        if let Some(n) = self.live_mut(node) {
            n.parent = Some(parent);
        }
        true
    }

    fn drop_subtree(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(live) = self.nodes.get_mut(id.0).and_then(Option::take) {
                stack.extend(live.children);
                self.free.push(id);
            }
        }
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(live) = self.live(node) else {
            return;
        };
        match &live.content {
            Content::Text(text) => out.push_str(&html_escape_string(text)),
            Content::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                let mut class_tokens: Vec<&str> = Vec::new();
                for (name, value) in &el.attributes {
                    match value {
                        Value::Bool(false) => {}
                        Value::Bool(true) => {
                            let _ = write!(out, " {name}");
                        }
                        _ if name == "class" => {
                            if let Value::Str(s) = value {
                                class_tokens.extend(s.split_whitespace());
                            }
                        }
                        _ => {
                            let _ = write!(
                                out,
                                " {}=\"{}\"",
                                name,
                                html_escape_string(&value.to_string())
                            );
                        }
                    }
                }
                for class in &el.classes {
                    if !class_tokens.contains(&class.as_str()) {
                        class_tokens.push(class);
                    }
                }
                if !class_tokens.is_empty() {
                    let _ = write!(
                        out,
                        " class=\"{}\"",
                        html_escape_string(&class_tokens.join(" "))
                    );
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                    return;
                }
                for &child in &live.children {
                    self.write_html(child, out);
                }
                let _ = write!(out, "</{}>", el.tag);
            }
        }
    }

    fn matches(&self, node: NodeId, selector: &str) -> bool {
        let Some(el) = self.element(node) else {
            return false;
        };
        if let Some(id) = selector.strip_prefix('#') {
            el.attributes.get("id").and_then(Value::as_str) == Some(id)
        } else if let Some(class) = selector.strip_prefix('.') {
            el.classes.contains(class)
                || el
                    .attributes
                    .get("class")
                    .and_then(Value::as_str)
                    .is_some_and(|s| s.split_whitespace().any(|t| t == class))
        } else {
            el.tag == selector
        }
    }
}

impl Surface for MemorySurface {
    fn query(&self, selector: &str) -> Option<NodeId> {
        let selector = selector.trim();
        if selector.is_empty() {
            return None;
        }
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            if self.matches(node, selector) {
                return Some(node);
            }
            if let Some(live) = self.live(node) {
                stack.extend(live.children.iter().rev());
            }
        }
        None
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        let node = self.alloc(Content::Element(ElementData {
            tag: tag.to_owned(),
            ..Default::default()
        }));
        self.log.push(Mutation::CreateElement {
            node,
            tag: tag.to_owned(),
        });
        node
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        let node = self.alloc(Content::Text(text.to_owned()));
        self.log.push(Mutation::CreateText {
            node,
            text: text.to_owned(),
        });
        node
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        match self.live_mut(node) {
            Some(LiveNode {
                content: Content::Text(current),
                ..
            }) => {
                *current = text.to_owned();
                self.log.push(Mutation::SetText {
                    node,
                    text: text.to_owned(),
                });
            }
            _ => tracing::warn!(%node, "set_text on a missing or element node"),
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &Value) {
        if let Some(el) = self.element_mut(node) {
            el.attributes.insert(name.to_owned(), value.clone());
            self.log.push(Mutation::SetAttribute {
                node,
                name: name.to_owned(),
                value: value.clone(),
            });
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(el) = self.element_mut(node) {
            el.attributes.shift_remove(name);
            self.log.push(Mutation::RemoveAttribute {
                node,
                name: name.to_owned(),
            });
        }
    }

    fn set_property(&mut self, node: NodeId, name: &str, value: &Value) {
        if let Some(el) = self.element_mut(node) {
            el.properties.insert(name.to_owned(), value.clone());
            self.log.push(Mutation::SetProperty {
                node,
                name: name.to_owned(),
                value: value.clone(),
            });
        }
    }

    fn remove_property(&mut self, node: NodeId, name: &str) {
        if let Some(el) = self.element_mut(node) {
            el.properties.shift_remove(name);
            self.log.push(Mutation::RemoveProperty {
                node,
                name: name.to_owned(),
            });
        }
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element_mut(node) {
            el.classes.insert(class.to_owned());
            self.log.push(Mutation::AddClass {
                node,
                class: class.to_owned(),
            });
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element_mut(node) {
            el.classes.shift_remove(class);
            self.log.push(Mutation::RemoveClass {
                node,
                class: class.to_owned(),
            });
        }
    }

    fn add_listener(&mut self, node: NodeId, event: &str, handler: EventHandler) {
        if let Some(el) = self.element_mut(node) {
            el.listeners.entry(event.to_owned()).or_default().push(handler);
            self.log.push(Mutation::AddListener {
                node,
                event: event.to_owned(),
            });
        }
    }

    fn remove_listener(&mut self, node: NodeId, event: &str, handler: &EventHandler) {
        if let Some(el) = self.element_mut(node) {
            if let Some(bound) = el.listeners.get_mut(event) {
                if let Some(i) = bound.iter().position(|h| h.ptr_eq(handler)) {
                    bound.remove(i);
                    if bound.is_empty() {
                        el.listeners.shift_remove(event);
                    }
                    self.log.push(Mutation::RemoveListener {
                        node,
                        event: event.to_owned(),
                    });
                }
            }
        }
    }

    fn listeners(&self, node: NodeId, event: &str) -> Vec<EventHandler> {
        self.element(node)
            .and_then(|el| el.listeners.get(event))
            .cloned()
            .unwrap_or_default()
    }

    fn insert(&mut self, parent: NodeId, node: NodeId, before: Option<NodeId>) {
        if self.attach(parent, node, before) {
            self.log.push(Mutation::Insert {
                parent,
                node,
                before,
            });
        }
    }

    fn remove(&mut self, parent: NodeId, node: NodeId) {
        if self.live(node).and_then(|n| n.parent) != Some(parent) {
            tracing::warn!(%parent, %node, "remove of a node that is not a child");
            return;
        }
        self.detach(node);
        self.drop_subtree(node);
        self.log.push(Mutation::Remove { parent, node });
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Some(live) = self.live(id) else {
                continue;
            };
            if let Content::Text(text) = &live.content {
                out.push_str(text);
            }
            stack.extend(live.children.iter().rev());
        }
        out
    }

    fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.write_html(child, &mut out);
        }
        out
    }
}
