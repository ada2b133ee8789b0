//! The reconciler: diffs a new node tree against the retained tree of the
//! previous pass and applies the difference to the surface immediately.
//!
//! Matching is positional. Child `i` of the previous tree is compared with
//! child `i` of the next one; a change of kind or tag at a position rebuilds
//! that position from scratch, surplus trailing children are created or
//! removed. Reordering a list therefore rebuilds everything after the first
//! changed index.
//!
//! Components are expanded where they appear: the instance for the position
//! is resolved in the [`Registry`], the body runs with a fresh [`Context`],
//! and the node it returns is diffed in the component's place. A component
//! boundary never changes how the nodes underneath are matched.
//!
//! One [`Reconciler`] covers one render pass:
//!
//! ```ignore
//! let mut pass = Reconciler::new(&mut surface, &mut registry, &store, refresh);
//! let rendered = pass.reconcile(host, previous, &tree);
//! let outcome = pass.finish(); // sweep, then mount hooks
//! ```

use std::fmt;

use crate::context::{Context, MountContext, RefreshHandle, Refs};
use crate::events::same_handlers;
use crate::node::{Element, Node, NodeKind};
use crate::registry::{InstanceId, Registry};
use crate::store::Store;
use crate::surface::{NodeId, Surface};

// ============================================================================
// Retained tree
// ============================================================================

/// The tree as it was applied, with the live nodes backing it.
#[derive(Debug, Clone)]
pub enum Rendered {
    Element {
        live: NodeId,
        /// The descriptor without its children.
        element: Element,
        children: Vec<Rendered>,
    },
    Text {
        live: NodeId,
        text: String,
    },
    Fragment {
        children: Vec<Rendered>,
    },
    Component {
        instance: InstanceId,
        child: Box<Rendered>,
    },
}

impl Rendered {
    /// The kind of node behind any component layers.
    pub fn kind(&self) -> NodeKind {
        match self {
            Rendered::Element { .. } => NodeKind::Element,
            Rendered::Text { .. } => NodeKind::Text,
            Rendered::Fragment { .. } => NodeKind::Fragment,
            Rendered::Component { child, .. } => child.kind(),
        }
    }

    /// The first top-level live node, in document order.
    pub fn first_live(&self) -> Option<NodeId> {
        match self {
            Rendered::Element { live, .. } | Rendered::Text { live, .. } => Some(*live),
            Rendered::Fragment { children } => children.iter().find_map(Rendered::first_live),
            Rendered::Component { child, .. } => child.first_live(),
        }
    }

    /// Top-level live nodes: the nodes this tree inserted into its parent.
    pub fn live_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_live(&mut out);
        out
    }

    fn collect_live(&self, out: &mut Vec<NodeId>) {
        match self {
            Rendered::Element { live, .. } | Rendered::Text { live, .. } => out.push(*live),
            Rendered::Fragment { children } => {
                for child in children {
                    child.collect_live(out);
                }
            }
            Rendered::Component { child, .. } => child.collect_live(out),
        }
    }

    /// Detach this tree's live nodes from `parent`.
    pub fn remove_from(&self, surface: &mut dyn Surface, parent: NodeId) -> usize {
        let nodes = self.live_nodes();
        for &node in &nodes {
            surface.remove(parent, node);
        }
        nodes.len()
    }

    /// Strip component layers.
    fn into_content(self) -> Rendered {
        match self {
            Rendered::Component { child, .. } => child.into_content(),
            other => other,
        }
    }
}

// ============================================================================
// Pass results
// ============================================================================

/// Counts of the live mutations one pass applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchStats {
    pub created: usize,
    pub removed: usize,
    pub texts: usize,
    pub attributes: usize,
    pub properties: usize,
    pub classes: usize,
    pub listeners: usize,
}

impl PatchStats {
    /// Whether the pass left the surface untouched.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for PatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "+{} -{} text:{} attr:{} prop:{} class:{} listen:{}",
            self.created,
            self.removed,
            self.texts,
            self.attributes,
            self.properties,
            self.classes,
            self.listeners
        )
    }
}

/// What a finished pass leaves behind.
#[derive(Debug, Default)]
pub struct PassOutcome {
    /// Live elements recorded under their `ref` names.
    pub refs: Refs,
    pub stats: PatchStats,
    /// Instances swept at the end of the pass.
    pub torn_down: Vec<InstanceId>,
}

// ============================================================================
// Reconciler
// ============================================================================

/// Position of a node relative to the nearest enclosing component.
struct Scope {
    parent: Option<InstanceId>,
    path: Vec<usize>,
}

impl Scope {
    fn new(parent: Option<InstanceId>) -> Self {
        Self {
            parent,
            path: Vec::new(),
        }
    }
}

/// Applies one render pass.
pub struct Reconciler<'a> {
    surface: &'a mut dyn Surface,
    registry: &'a mut Registry,
    store: &'a Store,
    refresh: RefreshHandle,
    refs: Refs,
    stats: PatchStats,
    /// Instances whose bodies ran, in document order.
    mounted: Vec<InstanceId>,
}

impl<'a> Reconciler<'a> {
    /// Start a pass.
    pub fn new(
        surface: &'a mut dyn Surface,
        registry: &'a mut Registry,
        store: &'a Store,
        refresh: RefreshHandle,
    ) -> Self {
        registry.begin_pass();
        store.begin_pass();
        Self {
            surface,
            registry,
            store,
            refresh,
            refs: Refs::default(),
            stats: PatchStats::default(),
            mounted: Vec::new(),
        }
    }

    /// Diff `next` against `previous` (absent on first mount) under `parent`.
    pub fn reconcile(&mut self, parent: NodeId, previous: Option<Rendered>, next: &Node) -> Rendered {
        let mut scope = Scope::new(None);
        self.patch(parent, previous, next, &mut scope, None)
    }

    /// End the pass: tear down instances the pass did not reach, then run
    /// mount hooks parent-first in document order.
    pub fn finish(self) -> PassOutcome {
        self.store.end_pass();
        let torn_down = self.registry.end_pass();

        let ctx_surface: &dyn Surface = &*self.surface;
        for &instance in &self.mounted {
            let hooks = self.registry.mount_hooks(instance);
            if hooks.is_empty() {
                continue;
            }
            let ctx = MountContext {
                instance,
                refs: &self.refs,
                surface: ctx_surface,
            };
            for hook in hooks {
                hook.call(&ctx);
            }
        }

        PassOutcome {
            refs: self.refs,
            stats: self.stats,
            torn_down,
        }
    }

    fn patch(
        &mut self,
        parent: NodeId,
        previous: Option<Rendered>,
        next: &Node,
        scope: &mut Scope,
        before: Option<NodeId>,
    ) -> Rendered {
        let previous = previous.map(Rendered::into_content);

        match next {
            Node::Component(component) => {
                let (instance, state) = self.registry.resolve(scope.parent, &scope.path, component);
                let ctx = Context::new(instance, state, self.store.clone(), self.refresh.clone());
                let tree = component.render(&ctx);
                let (mount_hooks, cleanups) = ctx.into_hooks();
                self.registry.record_hooks(instance, mount_hooks, cleanups);
                self.mounted.push(instance);

                let mut inner = Scope::new(Some(instance));
                let child = self.patch(parent, previous, &tree, &mut inner, before);
                Rendered::Component {
                    instance,
                    child: Box::new(child),
                }
            }

            Node::Text(text) => match previous {
                None => {
                    let live = self.surface.create_text(text);
                    self.surface.insert(parent, live, before);
                    self.stats.created += 1;
                    tracing::trace!(%live, "text created");
                    Rendered::Text {
                        live,
                        text: text.clone(),
                    }
                }
                Some(Rendered::Text { live, text: old }) => {
                    if old != *text {
                        self.surface.set_text(live, text);
                        self.stats.texts += 1;
                        tracing::trace!(%live, "text updated");
                    }
                    Rendered::Text {
                        live,
                        text: text.clone(),
                    }
                }
                Some(other) => self.replace(parent, other, next, scope, before),
            },

            Node::Element(element) => match previous {
                None => self.create_element(parent, element, scope, before),
                Some(Rendered::Element {
                    live,
                    element: old,
                    children,
                }) if old.tag == element.tag => {
                    self.patch_element(live, &old, element);
                    let children = self.patch_children(live, children, &element.children, scope, None);
                    if let Some(name) = &element.reference {
                        self.refs.insert(name, live);
                    }
                    Rendered::Element {
                        live,
                        element: element.shallow(),
                        children,
                    }
                }
                Some(other) => self.replace(parent, other, next, scope, before),
            },

            Node::Fragment(children) => match previous {
                None => Rendered::Fragment {
                    children: self.patch_children(parent, Vec::new(), children, scope, before),
                },
                Some(Rendered::Fragment { children: old }) => Rendered::Fragment {
                    children: self.patch_children(parent, old, children, scope, before),
                },
                Some(other) => self.replace(parent, other, next, scope, before),
            },
        }
    }

    /// Build `next` where `previous` stood, then drop `previous`.
    fn replace(
        &mut self,
        parent: NodeId,
        previous: Rendered,
        next: &Node,
        scope: &mut Scope,
        before: Option<NodeId>,
    ) -> Rendered {
        tracing::trace!(from = ?previous.kind(), to = ?next.kind(), "replacing node");
        let anchor = previous.first_live().or(before);
        let created = self.patch(parent, None, next, scope, anchor);
        self.remove(parent, previous);
        created
    }

    fn create_element(
        &mut self,
        parent: NodeId,
        element: &Element,
        scope: &mut Scope,
        before: Option<NodeId>,
    ) -> Rendered {
        let live = self.surface.create_element(&element.tag);
        self.stats.created += 1;
        tracing::trace!(%live, tag = %element.tag, "element created");

        for (name, value) in &element.attributes {
            self.surface.set_attribute(live, name, value);
        }
        for (name, value) in &element.properties {
            self.surface.set_property(live, name, value);
        }
        for class in &element.classes {
            self.surface.add_class(live, class);
        }
        for (event, handlers) in &element.events {
            for handler in handlers {
                self.surface.add_listener(live, event, handler.clone());
            }
        }

        let children = self.patch_children(live, Vec::new(), &element.children, scope, None);
        self.surface.insert(parent, live, before);
        if let Some(name) = &element.reference {
            self.refs.insert(name, live);
        }

        Rendered::Element {
            live,
            element: element.shallow(),
            children,
        }
    }

    /// Symmetric-difference update of everything but the children.
    fn patch_element(&mut self, live: NodeId, old: &Element, new: &Element) {
        let before = self.stats;
        for name in old.attributes.keys() {
            if !new.attributes.contains_key(name) {
                self.surface.remove_attribute(live, name);
                self.stats.attributes += 1;
            }
        }
        for (name, value) in &new.attributes {
            if old.attributes.get(name) != Some(value) {
                self.surface.set_attribute(live, name, value);
                self.stats.attributes += 1;
            }
        }

        for name in old.properties.keys() {
            if !new.properties.contains_key(name) {
                self.surface.remove_property(live, name);
                self.stats.properties += 1;
            }
        }
        for (name, value) in &new.properties {
            if old.properties.get(name) != Some(value) {
                self.surface.set_property(live, name, value);
                self.stats.properties += 1;
            }
        }

        for class in old.classes.difference(&new.classes) {
            self.surface.remove_class(live, class);
            self.stats.classes += 1;
        }
        for class in new.classes.difference(&old.classes) {
            self.surface.add_class(live, class);
            self.stats.classes += 1;
        }

        for (event, handlers) in &old.events {
            let unchanged = new
                .events
                .get(event)
                .is_some_and(|next| same_handlers(handlers, next));
            if !unchanged {
                for handler in handlers {
                    self.surface.remove_listener(live, event, handler);
                }
                self.stats.listeners += 1;
            }
        }
        for (event, handlers) in &new.events {
            let unchanged = old
                .events
                .get(event)
                .is_some_and(|prev| same_handlers(prev, handlers));
            if !unchanged {
                for handler in handlers {
                    self.surface.add_listener(live, event, handler.clone());
                }
                self.stats.listeners += 1;
            }
        }

        if self.stats != before {
            tracing::trace!(%live, tag = %new.tag, "element patched");
        }
    }

    /// Index-aligned child reconciliation. `end` is the live node the
    /// children must stay in front of, if any.
    fn patch_children(
        &mut self,
        parent: NodeId,
        previous: Vec<Rendered>,
        next: &[Node],
        scope: &mut Scope,
        end: Option<NodeId>,
    ) -> Vec<Rendered> {
        let mut previous: Vec<Option<Rendered>> = previous.into_iter().map(Some).collect();
        let mut out = Vec::with_capacity(next.len());

        for (index, child) in next.iter().enumerate() {
            let old = previous.get_mut(index).and_then(Option::take);
            let anchor = previous
                .iter()
                .skip(index + 1)
                .flatten()
                .find_map(Rendered::first_live)
                .or(end);

            scope.path.push(index);
            out.push(self.patch(parent, old, child, scope, anchor));
            scope.path.pop();
        }

        for surplus in previous.into_iter().skip(next.len()).flatten() {
            self.remove(parent, surplus);
        }
        out
    }

    /// Remove a retained subtree. Instances inside it are left to the sweep.
    fn remove(&mut self, parent: NodeId, previous: Rendered) {
        let removed = previous.remove_from(&mut *self.surface, parent);
        self.stats.removed += removed;
        tracing::trace!(%parent, removed, "subtree removed");
    }
}
