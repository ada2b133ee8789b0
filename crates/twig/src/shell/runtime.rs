//! Runtime - hydration, the refresh scheduler and event dispatch.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use twig_core::{
    Component, Error, Event, InstanceInfo, Node, NodeId, PatchStats, Reconciler, RefreshHandle,
    RefreshTarget, Refs, Registry, Rendered, Result, Store, Surface,
};

use super::config::Config;
use crate::router::{RouteTable, parse_fragment};

/// What an application renders at its root.
#[derive(Debug, Clone)]
pub enum RootSpec {
    /// A single root component.
    Component(Component),
    /// A route table; the active fragment selects the root component.
    Routes(RouteTable),
}

impl From<Component> for RootSpec {
    fn from(component: Component) -> Self {
        RootSpec::Component(component)
    }
}

impl From<RouteTable> for RootSpec {
    fn from(table: RouteTable) -> Self {
        RootSpec::Routes(table)
    }
}

/// Scheduler flags.
#[derive(Default)]
struct Schedule {
    /// A render pass is running.
    rendering: Cell<bool>,
    /// Nesting depth of `batch` calls.
    batch_depth: Cell<usize>,
    /// A refresh was requested inside a batch.
    pending: Cell<bool>,
    passes: Cell<u64>,
    mounted: Cell<bool>,
}

struct AppInner<S: Surface> {
    surface: RefCell<S>,
    host: NodeId,
    root: RootSpec,
    config: Config,
    registry: RefCell<Registry>,
    store: Store,
    rendered: RefCell<Option<Rendered>>,
    refs: RefCell<Refs>,
    /// Normalized location fragment.
    route: RefCell<String>,
    /// Table key the last pass rendered.
    active_route: RefCell<Option<String>>,
    last_stats: Cell<PatchStats>,
    schedule: Schedule,
    refresh: RefreshHandle,
}

impl<S: Surface + 'static> RefreshTarget for AppInner<S> {
    fn request_refresh(&self) {
        if self.schedule.rendering.get() || self.schedule.batch_depth.get() > 0 {
            self.schedule.pending.set(true);
        } else if let Err(e) = self.render() {
            tracing::error!("refresh failed: {}", e);
        }
    }
}

impl<S: Surface + 'static> AppInner<S> {
    fn root_component(&self) -> Result<(Component, Option<String>)> {
        match &self.root {
            RootSpec::Component(component) => Ok((component.clone(), None)),
            RootSpec::Routes(table) => {
                let route = self.route.borrow();
                let fragment = (!route.is_empty()).then_some(route.as_str());
                let resolved = table.resolve_with(fragment, &self.config)?;
                Ok((resolved.component, Some(resolved.key)))
            }
        }
    }

    /// Run one full pass, plus one follow-up pass when mount hooks or
    /// cleanups requested a refresh while it ran.
    fn render(&self) -> Result<PatchStats> {
        let stats = self.render_pass()?;
        if !self.schedule.pending.replace(false) {
            return Ok(stats);
        }

        tracing::debug!("refresh requested during the pass; running a follow-up pass");
        let stats = self.render_pass()?;
        if self.schedule.pending.replace(false) {
            tracing::warn!("refresh requested during a follow-up pass; ignoring");
        }
        Ok(stats)
    }

    /// Re-invoke the root and reconcile against the previous tree.
    fn render_pass(&self) -> Result<PatchStats> {
        if !self.schedule.mounted.get() {
            tracing::debug!("refresh on an unmounted application");
            return Ok(PatchStats::default());
        }

        let (component, route_key) = match self.root_component() {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::error!("{}; keeping the previous tree", e);
                return Err(e);
            }
        };

        let pass = self.schedule.passes.get() + 1;
        let _span = tracing::debug_span!("render", pass).entered();
        self.schedule.rendering.set(true);

        let outcome = {
            let mut surface = self.surface.borrow_mut();
            let mut registry = self.registry.borrow_mut();
            let previous = self.rendered.borrow_mut().take();
            let mut reconciler = Reconciler::new(
                &mut *surface,
                &mut registry,
                &self.store,
                self.refresh.clone(),
            );
            let rendered = reconciler.reconcile(self.host, previous, &Node::Component(component));
            let outcome = reconciler.finish();
            *self.rendered.borrow_mut() = Some(rendered);
            outcome
        };

        self.schedule.rendering.set(false);
        self.schedule.passes.set(pass);
        self.last_stats.set(outcome.stats);
        *self.refs.borrow_mut() = outcome.refs;
        *self.active_route.borrow_mut() = route_key;

        if self.config.report_patches {
            tracing::info!(pass, torn_down = outcome.torn_down.len(), "patched {}", outcome.stats);
        } else {
            tracing::debug!(pass, torn_down = outcome.torn_down.len(), "patched {}", outcome.stats);
        }
        Ok(outcome.stats)
    }

    fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        let depth = &self.schedule.batch_depth;
        depth.set(depth.get() + 1);
        let result = f();
        depth.set(depth.get() - 1);

        if depth.get() == 0 && self.schedule.pending.replace(false) {
            if let Err(e) = self.render() {
                tracing::error!("refresh failed: {}", e);
            }
        }
        result
    }
}

/// A hydrated application.
///
/// Cloning yields another handle to the same application.
pub struct App<S: Surface + 'static> {
    inner: Rc<AppInner<S>>,
}

impl<S: Surface + 'static> Clone for App<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: Surface + 'static> App<S> {
    fn new(surface: S, host: NodeId, root: RootSpec, config: Config) -> Self {
        let route = config
            .initial_route
            .as_deref()
            .map(parse_fragment)
            .unwrap_or_default();
        let inner = Rc::new_cyclic(|this: &Weak<AppInner<S>>| {
            let refresh = RefreshHandle::new(this.clone() as Weak<dyn RefreshTarget>);
            let store = Store::new();
            store.bind(refresh.clone());
            AppInner {
                surface: RefCell::new(surface),
                host,
                root,
                config,
                registry: RefCell::new(Registry::new()),
                store,
                rendered: RefCell::new(None),
                refs: RefCell::new(Refs::default()),
                route: RefCell::new(route),
                active_route: RefCell::new(None),
                last_stats: Cell::new(PatchStats::default()),
                schedule: Schedule::default(),
                refresh,
            }
        });
        Self { inner }
    }

    /// Re-render the whole application.
    ///
    /// Inside [`App::batch`] or an event dispatch the pass is deferred until
    /// the outermost batch ends. During a render pass (from a mount hook or
    /// an unmount cleanup) it schedules one follow-up pass.
    pub fn refresh(&self) {
        self.inner.request_refresh();
    }

    /// A refresh capability that can be moved into handlers.
    pub fn refresh_handle(&self) -> RefreshHandle {
        self.inner.refresh.clone()
    }

    /// Run `f`, collapsing every refresh it requests into one pass at the end.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        self.inner.batch(f)
    }

    /// Deliver `event` to the handlers bound on `node`, then run at most one
    /// pass for all the refreshes they requested.
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch(&self, node: NodeId, event: &str) -> usize {
        let handlers = self.inner.surface.borrow().listeners(node, event);
        if handlers.is_empty() {
            tracing::debug!(%node, event, "no handlers bound");
            return 0;
        }
        let delivered = Event {
            name: event.to_owned(),
            target: node,
        };
        tracing::debug!(%node, event, handlers = handlers.len(), "dispatching event");
        self.batch(|| {
            for handler in &handlers {
                handler.call(&delivered);
            }
        });
        handlers.len()
    }

    /// Dispatch to the element recorded under the `ref` name `name`.
    pub fn dispatch_ref(&self, name: &str, event: &str) -> Result<usize> {
        let node = self.require_ref(name)?;
        Ok(self.dispatch(node, event))
    }

    /// Switch the active route and re-render.
    ///
    /// The fragment is rejected, and the current route kept, when it
    /// resolves to nothing.
    pub fn navigate(&self, fragment: &str) -> Result<()> {
        let route = parse_fragment(fragment);
        if let RootSpec::Routes(table) = &self.inner.root {
            let lookup = (!route.is_empty()).then_some(route.as_str());
            table.resolve_with(lookup, &self.inner.config)?;
        } else {
            tracing::debug!("navigate on an application without routes");
        }
        tracing::debug!("navigating to `{}`", route);
        *self.inner.route.borrow_mut() = route;
        self.refresh();
        Ok(())
    }

    /// The normalized location fragment.
    pub fn route(&self) -> String {
        self.inner.route.borrow().clone()
    }

    /// The route table key rendered by the last pass.
    pub fn active_route(&self) -> Option<String> {
        self.inner.active_route.borrow().clone()
    }

    /// The live element recorded under `name` by the last pass.
    pub fn lookup_ref(&self, name: &str) -> Option<NodeId> {
        self.inner.refs.borrow().get(name)
    }

    /// Like [`App::lookup_ref`], reporting a stale name as an error.
    pub fn require_ref(&self, name: &str) -> Result<NodeId> {
        self.inner.refs.borrow().require(name)
    }

    /// The host element the application is mounted in.
    pub fn host(&self) -> NodeId {
        self.inner.host
    }

    pub fn surface(&self) -> Ref<'_, S> {
        self.inner.surface.borrow()
    }

    pub fn surface_mut(&self) -> RefMut<'_, S> {
        self.inner.surface.borrow_mut()
    }

    /// Serialized markup of the host's content.
    pub fn html(&self) -> String {
        self.surface().inner_html(self.inner.host)
    }

    /// The global store.
    pub fn store(&self) -> Store {
        self.inner.store.clone()
    }

    /// Number of completed render passes.
    pub fn passes(&self) -> u64 {
        self.inner.schedule.passes.get()
    }

    /// Patch counts of the last pass.
    pub fn last_stats(&self) -> PatchStats {
        self.inner.last_stats.get()
    }

    /// Snapshot of the mounted component instances.
    pub fn instances(&self) -> Vec<InstanceInfo> {
        self.inner.registry.borrow().instances()
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.schedule.mounted.get()
    }

    /// Remove the live structure and tear every instance down.
    pub fn unmount(&self) {
        if !self.inner.schedule.mounted.replace(false) {
            return;
        }
        if let Some(rendered) = self.inner.rendered.borrow_mut().take() {
            let mut surface = self.inner.surface.borrow_mut();
            rendered.remove_from(&mut *surface, self.inner.host);
        }
        let torn_down = self.inner.registry.borrow_mut().teardown_all();
        self.inner.store.clear_subscribers();
        *self.inner.refs.borrow_mut() = Refs::default();
        *self.inner.active_route.borrow_mut() = None;
        tracing::info!(instances = torn_down.len(), "application unmounted");
    }
}

impl<S: Surface + 'static> fmt::Debug for App<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("host", &self.inner.host)
            .field("route", &*self.inner.route.borrow())
            .field("passes", &self.inner.schedule.passes.get())
            .field("mounted", &self.inner.schedule.mounted.get())
            .finish()
    }
}

/// Mount `root` into the element matching `selector` with the default
/// configuration.
pub fn hydrate<S>(surface: S, selector: &str, root: impl Into<RootSpec>) -> Result<App<S>>
where
    S: Surface + 'static,
{
    hydrate_with(surface, selector, root, Config::default())
}

/// Mount `root` into the element matching `selector` and run the first pass.
///
/// Fails with [`Error::UnresolvedHost`] when nothing matches the selector,
/// and with [`Error::MissingReservedRoute`] for a route table lacking a
/// reserved route when [`Config::strict_routes`] is set.
pub fn hydrate_with<S>(
    surface: S,
    selector: &str,
    root: impl Into<RootSpec>,
    config: Config,
) -> Result<App<S>>
where
    S: Surface + 'static,
{
    let Some(host) = surface.query(selector) else {
        tracing::error!("no host element matches `{}`", selector);
        return Err(Error::UnresolvedHost(selector.to_owned()));
    };

    let root = root.into();
    if let RootSpec::Routes(table) = &root {
        for key in table.missing_reserved(&config) {
            if config.strict_routes {
                tracing::error!("route table has no `{}` entry", key);
                return Err(Error::MissingReservedRoute(key.to_owned()));
            }
            tracing::warn!("route table has no `{}` entry", key);
        }
    }

    tracing::info!(selector, "hydrating");
    let app = App::new(surface, host, root, config);
    app.inner.schedule.mounted.set(true);
    app.inner.render()?;
    Ok(app)
}
