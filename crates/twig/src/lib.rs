//! twig - a small client-side rendering engine.
//!
//! Components are plain functions from a [`Context`] to a [`Node`] tree.
//! Every refresh re-runs the root, diffs the new tree against the previous
//! one position by position, and patches the injected [`Surface`].
//!
//! # Quick Start
//!
//! ```ignore
//! use twig::prelude::*;
//!
//! fn counter(ctx: &Context) -> Node {
//!     let state = ctx.component_state();
//!     let count = state.get_or("count", 0i64);
//!     let refresh = ctx.refresh();
//!
//!     view! {
//!         p { {count} }
//!         button {
//!             ref: "increment",
//!             onclick: move |_| {
//!                 state.update("count", || 0i64, |n| *n += 1);
//!                 refresh.refresh();
//!             },
//!             "+1"
//!         }
//!     }
//! }
//!
//! fn main() -> twig::Result<()> {
//!     twig::init_tracing();
//!     let app = twig::hydrate(MemorySurface::with_host("app"), "#app", Component::new(counter))?;
//!     app.dispatch_ref("increment", "click")?;
//!     println!("{}", app.html());
//!     Ok(())
//! }
//! ```
//!
//! # Routing
//!
//! Pass a [`RouteTable`] instead of a component to select the root by
//! location fragment. The `/` and `/404` entries are reserved:
//!
//! ```ignore
//! let routes = RouteTable::new()
//!     .route("/", Component::new(home))
//!     .route("/about", Component::new(about))
//!     .route("/404", Component::new(not_found));
//! let app = twig::hydrate(surface, "#app", routes)?;
//! app.navigate("#/about")?;
//! ```
//!
//! # State
//!
//! | Where | Lifetime | Access |
//! |-------|----------|--------|
//! | [`Context::component_state`] | until the instance's position stops rendering | the instance and its handlers |
//! | [`Context::state`] | the application | every component; writes through [`Store::set`] refresh |

pub mod router;
pub mod shell;

pub mod prelude {
    //! Common imports for twig applications.
    pub use crate::router::RouteTable;
    pub use crate::shell::{App, Config, hydrate, hydrate_with};
    pub use twig_core::node;
    pub use twig_core::{
        Component, Context, Event, EventHandler, MemorySurface, MountContext, Node, NodeId,
        Options, State, StateCell, Store, Surface, Value, fragment, text,
    };
    pub use twig_macros::view;
}

// Re-export core types at crate root
pub use router::{Resolved, RouteTable, parse_fragment};
pub use shell::{App, Config, RootSpec, hydrate, hydrate_with};
pub use twig_core::node;
pub use twig_core::{
    Component, Context, Error, Event, EventHandler, InstanceId, InstanceInfo, MemorySurface,
    MountContext, Mutation, Node, NodeId, Options, PatchStats, RefreshHandle, Result, State,
    StateCell, Store, Surface, Value, fragment, text,
};
pub use twig_macros::view;

pub use twig_core as core;

/// Install a `tracing` subscriber writing to stderr.
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}
