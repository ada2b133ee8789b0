//! Core types for twig: the node model, component instances, state and the
//! reconciler.

pub mod context;
pub mod error;
pub mod events;
pub mod node;
pub mod reconcile;
pub mod registry;
pub mod state;
pub mod store;
pub mod surface;

pub use error::{Error, Result};

// Node construction
pub use node::{
    Arg, ClassList, Component, Element, Node, NodeKind, OptionValue, Options, Value, fragment,
    is_tag_name, text,
};

// Component contract
pub use context::{Cleanup, Context, MountContext, MountHook, RefreshHandle, RefreshTarget, Refs};
pub use events::{Event, EventHandler};
pub use state::{State, StateCell};
pub use store::Store;

// Rendering
pub use reconcile::{PassOutcome, PatchStats, Reconciler, Rendered};
pub use registry::{InstanceId, InstanceInfo, Registry};
pub use surface::{MemorySurface, Mutation, NodeId, Surface};
