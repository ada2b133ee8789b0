//! Component instance registry.
//!
//! Every component the reconciler meets is resolved to an [`Instance`]: the
//! stable, stateful slot that component occupies across render passes.
//!
//! # Identity
//!
//! An instance is keyed by its [`Slot`] (the enclosing instance plus the
//! positional path from that instance's render root) together with the
//! component's type. The same component at the same position in two
//! consecutive passes resolves to the same instance and keeps its state. A
//! different component at that position replaces the instance; state does
//! not carry over a type change.
//!
//! # Sweep
//!
//! [`Registry::end_pass`] tears down every instance the pass did not
//! resolve: unmount callbacks run in registration order and the private
//! state is dropped. Teardown therefore happens at the end of the pass that
//! stopped rendering the slot, in instance creation order.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::context::{Cleanups, MountHook, MountHooks};
use crate::node::Component;
use crate::state::StateCell;

/// Stable identity of a mounted component.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A structural position: the enclosing instance and the child-index path
/// from its render root.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Slot {
    pub parent: Option<InstanceId>,
    pub path: Vec<usize>,
}

/// Runtime record of one mounted component.
pub struct Instance {
    id: InstanceId,
    kind: TypeId,
    name: &'static str,
    slot: Slot,
    state: StateCell,
    mount_hooks: MountHooks,
    cleanups: Cleanups,
    last_pass: u64,
}

impl Instance {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Type name of the component function.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    pub fn state(&self) -> &StateCell {
        &self.state
    }

    pub fn mount_hook_names(&self) -> Vec<String> {
        self.mount_hooks.keys().cloned().collect()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("slot", &self.slot)
            .field("state", &self.state)
            .finish()
    }
}

/// Snapshot of an instance for inspection tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    pub id: InstanceId,
    pub component: &'static str,
    pub parent: Option<InstanceId>,
    pub path: Vec<usize>,
    pub state_keys: Vec<String>,
    pub mount_hooks: Vec<String>,
}

/// Tracks instances across render passes.
#[derive(Default)]
pub struct Registry {
    slots: HashMap<Slot, InstanceId>,
    instances: BTreeMap<InstanceId, Instance>,
    next_id: u64,
    pass: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a render pass.
    pub fn begin_pass(&mut self) {
        self.pass += 1;
    }

    /// Resolve the instance for `component` at `parent` + `path`, creating
    /// it on first encounter.
    pub fn resolve(
        &mut self,
        parent: Option<InstanceId>,
        path: &[usize],
        component: &Component,
    ) -> (InstanceId, StateCell) {
        let slot = Slot {
            parent,
            path: path.to_vec(),
        };

        if let Some(&id) = self.slots.get(&slot) {
            match self.instances.get_mut(&id) {
                Some(instance) if instance.kind == component.kind() => {
                    instance.last_pass = self.pass;
                    return (id, instance.state.clone());
                }
                Some(instance) => {
                    tracing::debug!(
                        instance = %id,
                        from = instance.name,
                        to = component.name(),
                        "component type changed at slot"
                    );
                    self.teardown(id);
                }
                None => {
                    self.slots.remove(&slot);
                }
            }
        }

        self.next_id += 1;
        let id = InstanceId(self.next_id);
        let state = StateCell::new();
        tracing::debug!(instance = %id, component = component.name(), "instance created");
        self.slots.insert(slot.clone(), id);
        self.instances.insert(
            id,
            Instance {
                id,
                kind: component.kind(),
                name: component.name(),
                slot,
                state: state.clone(),
                mount_hooks: MountHooks::new(),
                cleanups: Cleanups::new(),
                last_pass: self.pass,
            },
        );
        (id, state)
    }

    /// Store the hooks an invocation registered. Mount hooks are replaced
    /// wholesale; unmount callbacks are replaced name by name.
    pub(crate) fn record_hooks(&mut self, id: InstanceId, mount_hooks: MountHooks, cleanups: Cleanups) {
        if let Some(instance) = self.instances.get_mut(&id) {
            instance.mount_hooks = mount_hooks;
            instance.cleanups.extend(cleanups);
        }
    }

    /// The mount hooks collected for `id` in its latest invocation.
    pub fn mount_hooks(&self, id: InstanceId) -> Vec<MountHook> {
        self.instances
            .get(&id)
            .map(|i| i.mount_hooks.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Finish a pass: tear down every instance it did not resolve.
    ///
    /// Returns the removed ids in teardown order.
    pub fn end_pass(&mut self) -> Vec<InstanceId> {
        let stale: Vec<InstanceId> = self
            .instances
            .values()
            .filter(|i| i.last_pass != self.pass)
            .map(|i| i.id)
            .collect();
        for &id in &stale {
            self.teardown(id);
        }
        stale
    }

    /// Tear one instance down: run its unmount callbacks, drop its state.
    pub fn teardown(&mut self, id: InstanceId) -> bool {
        let Some(instance) = self.instances.remove(&id) else {
            return false;
        };
        if self.slots.get(&instance.slot) == Some(&id) {
            self.slots.remove(&instance.slot);
        }
        tracing::debug!(instance = %id, component = instance.name, "instance torn down");
        for (_, cleanup) in instance.cleanups {
            cleanup();
        }
        true
    }

    /// Tear every instance down, in creation order.
    pub fn teardown_all(&mut self) -> Vec<InstanceId> {
        let ids: Vec<InstanceId> = self.instances.keys().copied().collect();
        for &id in &ids {
            self.teardown(id);
        }
        ids
    }

    pub fn get(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(&id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.instances.contains_key(&id)
    }

    /// The instance currently occupying a slot.
    pub fn find(&self, parent: Option<InstanceId>, path: &[usize]) -> Option<InstanceId> {
        self.slots
            .get(&Slot {
                parent,
                path: path.to_vec(),
            })
            .copied()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Snapshot of every live instance, in creation order.
    pub fn instances(&self) -> Vec<InstanceInfo> {
        self.instances
            .values()
            .map(|i| InstanceInfo {
                id: i.id,
                component: i.name,
                parent: i.slot.parent,
                path: i.slot.path.clone(),
                state_keys: i.state.with(|s| s.keys()),
                mount_hooks: i.mount_hook_names(),
            })
            .collect()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("pass", &self.pass)
            .field("instances", &self.instances.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Cleanup;
    use crate::node::{Node, text};
    use std::cell::Cell;
    use std::rc::Rc;

    fn alpha(_: &crate::context::Context) -> Node {
        text("alpha")
    }

    fn beta(_: &crate::context::Context) -> Node {
        text("beta")
    }

    #[test]
    fn same_slot_same_component_keeps_state() {
        let mut registry = Registry::new();
        let a = Component::new(alpha);

        registry.begin_pass();
        let (id1, state1) = registry.resolve(None, &[0], &a);
        state1.set("count", 1i64);
        assert!(registry.end_pass().is_empty());

        registry.begin_pass();
        let (id2, state2) = registry.resolve(None, &[0], &a);
        registry.end_pass();

        assert_eq!(id1, id2);
        assert_eq!(state2.get::<i64>("count"), Some(1));
    }

    #[test]
    fn type_change_replaces_instance() {
        let mut registry = Registry::new();

        let cleaned = Rc::new(Cell::new(false));

        registry.begin_pass();
        let (id1, state1) = registry.resolve(None, &[0], &Component::new(alpha));
        state1.set("count", 1i64);
        let flag = Rc::clone(&cleaned);
        let mut cleanups = Cleanups::new();
        cleanups.insert("log".into(), Box::new(move || flag.set(true)) as Cleanup);
        registry.record_hooks(id1, MountHooks::new(), cleanups);
        registry.end_pass();
        assert!(!cleaned.get());

        registry.begin_pass();
        let (id2, state2) = registry.resolve(None, &[0], &Component::new(beta));
        assert!(cleaned.get());
        assert!(registry.end_pass().is_empty());

        assert_ne!(id1, id2);
        assert!(!registry.contains(id1));
        assert_eq!(state2.get::<i64>("count"), None);
    }

    #[test]
    fn parameterized_components_share_identity() {
        fn labelled(label: &'static str) -> Component {
            Component::new(move |_| text(label))
        }

        let mut registry = Registry::new();
        registry.begin_pass();
        let (id1, _) = registry.resolve(None, &[], &labelled("one"));
        registry.end_pass();
        registry.begin_pass();
        let (id2, _) = registry.resolve(None, &[], &labelled("two"));
        registry.end_pass();

        assert_eq!(id1, id2);
    }

    #[test]
    fn unresolved_instances_are_swept_with_cleanups() {
        let mut registry = Registry::new();
        let a = Component::new(alpha);
        let cleaned = Rc::new(Cell::new(false));

        registry.begin_pass();
        let (root, _) = registry.resolve(None, &[], &a);
        let (child, _) = registry.resolve(Some(root), &[1], &a);
        let flag = Rc::clone(&cleaned);
        let mut cleanups = Cleanups::new();
        cleanups.insert("log".into(), Box::new(move || flag.set(true)) as Cleanup);
        registry.record_hooks(child, MountHooks::new(), cleanups);
        registry.end_pass();
        assert_eq!(registry.len(), 2);

        registry.begin_pass();
        registry.resolve(None, &[], &a);
        let removed = registry.end_pass();

        assert_eq!(removed, [child]);
        assert!(cleaned.get());
        assert_eq!(registry.find(Some(root), &[1]), None);

        registry.begin_pass();
        let (again, state) = registry.resolve(Some(root), &[1], &a);
        registry.end_pass();
        assert_ne!(again, child);
        assert!(state.with(|s| s.is_empty()));
    }

    #[test]
    fn snapshot_lists_state_and_hooks() {
        let mut registry = Registry::new();
        registry.begin_pass();
        let (id, state) = registry.resolve(None, &[], &Component::new(alpha));
        state.set("b", 1u8);
        state.set("a", 2u8);
        let mut hooks = MountHooks::new();
        hooks.insert("focus".into(), MountHook::new(|_| {}));
        registry.record_hooks(id, hooks, Cleanups::new());
        registry.end_pass();

        let info = registry.instances();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].state_keys, ["a", "b"]);
        assert_eq!(info[0].mount_hooks, ["focus"]);
        assert!(info[0].component.ends_with("alpha"));
        assert_eq!(registry.mount_hooks(id).len(), 1);

        assert_eq!(registry.teardown_all(), [id]);
        assert!(registry.is_empty());
    }
}
