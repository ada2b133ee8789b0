//! The context handed to component bodies and mount hooks.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::registry::InstanceId;
use crate::state::StateCell;
use crate::store::Store;
use crate::surface::{NodeId, Surface};

// ============================================================================
// Refresh
// ============================================================================

/// Something that can run a refresh pass on request.
pub trait RefreshTarget {
    fn request_refresh(&self);
}

/// The `refresh` capability given to components and event handlers.
///
/// Holds the application weakly, so handlers stored on live nodes do not
/// keep a dropped application alive.
#[derive(Clone, Default)]
pub struct RefreshHandle(Option<Weak<dyn RefreshTarget>>);

impl RefreshHandle {
    pub fn new(target: Weak<dyn RefreshTarget>) -> Self {
        Self(Some(target))
    }

    /// A handle that refreshes nothing.
    pub fn detached() -> Self {
        Self(None)
    }

    /// Request a re-render of the whole application.
    pub fn refresh(&self) {
        match self.0.as_ref().and_then(Weak::upgrade) {
            Some(target) => target.request_refresh(),
            None => tracing::debug!("refresh requested with no live application"),
        }
    }
}

impl fmt::Debug for RefreshHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshHandle(...)")
    }
}

// ============================================================================
// Refs
// ============================================================================

/// Live elements recorded under their `ref` names during a render pass.
#[derive(Debug, Clone, Default)]
pub struct Refs(HashMap<String, NodeId>);

impl Refs {
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.0.get(name).copied()
    }

    /// Like [`Refs::get`], reporting a missing name as an error.
    pub fn require(&self, name: &str) -> Result<NodeId> {
        self.get(name)
            .ok_or_else(|| Error::StaleReference(name.to_owned()))
    }

    pub(crate) fn insert(&mut self, name: &str, node: NodeId) {
        if let Some(previous) = self.0.insert(name.to_owned(), node) {
            if previous != node {
                tracing::warn!("ref `{}` used by more than one element; keeping the last", name);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

// ============================================================================
// Hooks
// ============================================================================

/// What a mount hook can see once its subtree is attached.
pub struct MountContext<'a> {
    pub(crate) instance: InstanceId,
    pub(crate) refs: &'a Refs,
    pub(crate) surface: &'a dyn Surface,
}

impl<'a> MountContext<'a> {
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn refs(&self) -> &'a Refs {
        self.refs
    }

    /// The live element recorded under `name` in this pass.
    pub fn reference(&self, name: &str) -> Option<NodeId> {
        self.refs.get(name)
    }

    /// Read access to the surface.
    pub fn surface(&self) -> &'a dyn Surface {
        self.surface
    }
}

/// A callback run after a component's subtree is attached.
#[derive(Clone)]
pub struct MountHook(Rc<dyn Fn(&MountContext<'_>)>);

impl MountHook {
    pub fn new<F: Fn(&MountContext<'_>) + 'static>(f: F) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, ctx: &MountContext<'_>) {
        (self.0)(ctx)
    }
}

impl fmt::Debug for MountHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MountHook(...)")
    }
}

/// A callback run once when an instance is torn down.
pub type Cleanup = Box<dyn FnOnce()>;

pub(crate) type MountHooks = IndexMap<String, MountHook>;
pub(crate) type Cleanups = IndexMap<String, Cleanup>;

// ============================================================================
// Context
// ============================================================================

/// The injected context of one component invocation.
///
/// A fresh context is built every time a component body runs. Anything that
/// must outlive the pass lives in [`Context::component_state`] or in the
/// global [`Store`]; event handlers should capture those handles rather than
/// values computed during the pass.
pub struct Context {
    instance: InstanceId,
    component_state: StateCell,
    store: Store,
    refresh: RefreshHandle,
    mount_hooks: RefCell<MountHooks>,
    cleanups: RefCell<Cleanups>,
}

impl Context {
    pub(crate) fn new(
        instance: InstanceId,
        component_state: StateCell,
        store: Store,
        refresh: RefreshHandle,
    ) -> Self {
        Self {
            instance,
            component_state,
            store,
            refresh,
            mount_hooks: RefCell::new(IndexMap::new()),
            cleanups: RefCell::new(IndexMap::new()),
        }
    }

    /// The instance this invocation renders.
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// The global store. Reading it subscribes this instance for the pass.
    pub fn state(&self) -> Store {
        self.store.track(self.instance);
        self.store.clone()
    }

    /// This instance's private state, kept across passes until unmount.
    pub fn component_state(&self) -> StateCell {
        self.component_state.clone()
    }

    pub fn refresh(&self) -> RefreshHandle {
        self.refresh.clone()
    }

    /// Register a hook to run once this pass has attached the subtree.
    ///
    /// Registering the same name twice in one pass keeps the later hook.
    pub fn on_mount<F>(&self, name: impl Into<String>, hook: F)
    where
        F: Fn(&MountContext<'_>) + 'static,
    {
        self.mount_hooks
            .borrow_mut()
            .insert(name.into(), MountHook::new(hook));
    }

    /// Register a callback to run when this instance is torn down.
    ///
    /// The callback registered under a name in the latest pass replaces the
    /// one from earlier passes.
    pub fn on_unmount<F>(&self, name: impl Into<String>, cleanup: F)
    where
        F: FnOnce() + 'static,
    {
        self.cleanups
            .borrow_mut()
            .insert(name.into(), Box::new(cleanup));
    }

    pub(crate) fn into_hooks(self) -> (MountHooks, Cleanups) {
        (self.mount_hooks.into_inner(), self.cleanups.into_inner())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("instance", &self.instance)
            .field("mount_hooks", &self.mount_hooks.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counter(Cell<usize>);

    impl RefreshTarget for Counter {
        fn request_refresh(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn refresh_handle_reaches_live_target_only() {
        let target = Rc::new(Counter(Cell::new(0)));
        let weak: Weak<dyn RefreshTarget> = Rc::downgrade(&target) as Weak<dyn RefreshTarget>;
        let handle = RefreshHandle::new(weak);

        handle.refresh();
        handle.clone().refresh();
        assert_eq!(target.0.get(), 2);

        drop(target);
        handle.refresh();
        RefreshHandle::detached().refresh();
    }

    #[test]
    fn refs_report_stale_names() {
        let mut refs = Refs::default();
        refs.insert("btn", NodeId(4));
        assert_eq!(refs.get("btn"), Some(NodeId(4)));
        assert_eq!(refs.require("btn"), Ok(NodeId(4)));
        assert_eq!(
            refs.require("missing"),
            Err(Error::StaleReference("missing".into()))
        );
    }

    #[test]
    fn hooks_are_collected_by_name() {
        let ctx = Context::new(
            InstanceId(1),
            StateCell::default(),
            Store::default(),
            RefreshHandle::detached(),
        );
        ctx.on_mount("focus", |_| {});
        ctx.on_mount("focus", |_| {});
        ctx.on_mount("measure", |_| {});
        ctx.on_unmount("log", || {});

        let (mounts, cleanups) = ctx.into_hooks();
        assert_eq!(mounts.keys().collect::<Vec<_>>(), ["focus", "measure"]);
        assert_eq!(cleanups.len(), 1);
    }
}
