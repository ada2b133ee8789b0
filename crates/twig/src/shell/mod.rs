//! Application shell: hydration, scheduling and configuration.

mod config;
mod runtime;

pub use config::Config;
pub use runtime::{App, RootSpec, hydrate, hydrate_with};
