//! Error taxonomy shared by the core and the runtime.

use thiserror::Error;

/// Errors surfaced by twig.
///
/// Descriptor problems are repaired in place and only reported through
/// logging; the remaining variants are integration errors handed back to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An option entry had an unknown key or a shape its key does not accept.
    #[error("malformed descriptor option `{key}`: {reason}")]
    MalformedDescriptor { key: String, reason: &'static str },

    /// The mount selector matched no element on the surface.
    #[error("no host element matches selector `{0}`")]
    UnresolvedHost(String),

    /// A route key had no entry and no fallback route was registered.
    #[error("no route matches `{0}` and no fallback route is registered")]
    UnresolvedRoute(String),

    /// A route table was mounted without one of its reserved keys.
    #[error("route table is missing reserved route `{0}`")]
    MissingReservedRoute(String),

    /// A `ref` was looked up before any element was attached under that name.
    #[error("reference `{0}` is not attached")]
    StaleReference(String),
}

/// Result alias used across twig.
pub type Result<T> = std::result::Result<T, Error>;
