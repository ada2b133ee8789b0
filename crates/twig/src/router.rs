//! Route tables: fragment-keyed root components.
//!
//! A route table maps keys such as `/` or `/about` to components. The
//! application resolves the active location fragment against it on first
//! render and on every [`App::navigate`](crate::App::navigate), and renders
//! the resolved component as its root.
//!
//! Two keys are reserved: the default route (`/`), used when the fragment
//! is empty, and the fallback route (`/404`), used when nothing matches.

use std::fmt;

use indexmap::IndexMap;
use twig_core::{Component, Error, Result};

use crate::shell::Config;

/// Normalize a location fragment to a route key.
///
/// Strips a leading `#`, surrounding whitespace and any query string, and
/// ensures a leading `/`. An empty fragment stays empty.
///
/// ```ignore
/// assert_eq!(parse_fragment("#/about"), "/about");
/// assert_eq!(parse_fragment("#about?tab=2"), "/about");
/// assert_eq!(parse_fragment(""), "");
/// ```
pub fn parse_fragment(fragment: &str) -> String {
    let trimmed = fragment.trim();
    let trimmed = trimmed.strip_prefix('#').unwrap_or(trimmed);
    let path = trimmed.split('?').next().unwrap_or_default().trim();
    if path.is_empty() {
        String::new()
    } else if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

/// The outcome of a route lookup.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The table key that matched (after default/fallback substitution).
    pub key: String,
    pub component: Component,
}

/// Mapping from route keys to root components.
#[derive(Clone, Default)]
pub struct RouteTable {
    routes: IndexMap<String, Component>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route. Keys are expected to start with `/`; one is prepended
    /// otherwise.
    pub fn route(mut self, key: impl Into<String>, component: Component) -> Self {
        self.insert(key, component);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, component: Component) {
        let mut key = key.into();
        if !key.starts_with('/') {
            tracing::warn!("route key `{}` does not start with `/`; using `/{}`", key, key);
            key.insert(0, '/');
        }
        if self.routes.insert(key.clone(), component).is_some() {
            tracing::debug!("route `{}` redefined", key);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Component> {
        self.routes.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.routes.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Reserved routes the table lacks under `config`.
    pub fn missing_reserved<'a>(&self, config: &'a Config) -> Vec<&'a str> {
        [config.default_route.as_str(), config.fallback_route.as_str()]
            .into_iter()
            .filter(|key| !self.contains(key))
            .collect()
    }

    /// Resolve a fragment with the standard reserved routes.
    pub fn resolve(&self, fragment: Option<&str>) -> Result<Resolved> {
        self.resolve_with(fragment, &Config::default())
    }

    /// Resolve a fragment: empty or absent selects the default route, an
    /// unknown key selects the fallback route.
    pub fn resolve_with(&self, fragment: Option<&str>, config: &Config) -> Result<Resolved> {
        let key = fragment.map(parse_fragment).unwrap_or_default();
        let wanted = if key.is_empty() {
            config.default_route.clone()
        } else {
            key
        };

        if let Some(component) = self.routes.get(&wanted) {
            return Ok(Resolved {
                key: wanted,
                component: component.clone(),
            });
        }

        match self.routes.get(&config.fallback_route) {
            Some(component) => {
                tracing::debug!("no route for `{}`; using `{}`", wanted, config.fallback_route);
                Ok(Resolved {
                    key: config.fallback_route.clone(),
                    component: component.clone(),
                })
            }
            None => Err(Error::UnresolvedRoute(wanted)),
        }
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.routes.keys()).finish()
    }
}
