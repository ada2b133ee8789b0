//! Runtime configuration for a hydrated application.

/// Settings read once at hydration time.
#[derive(Debug, Clone)]
pub struct Config {
    /// Route used when the location fragment is empty.
    pub default_route: String,
    /// Route used when the fragment matches no entry.
    pub fallback_route: String,
    /// Fragment to resolve on first render.
    pub initial_route: Option<String>,
    /// Fail hydration when a route table lacks the default or fallback entry.
    pub strict_routes: bool,
    /// Log each pass's patch counts at info level.
    pub report_patches: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_route: "/".into(),
            fallback_route: "/404".into(),
            initial_route: None,
            strict_routes: false,
            report_patches: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the route used for an empty fragment.
    pub fn with_default_route(mut self, route: impl Into<String>) -> Self {
        self.default_route = route.into();
        self
    }

    /// Set the route used when nothing matches.
    pub fn with_fallback_route(mut self, route: impl Into<String>) -> Self {
        self.fallback_route = route.into();
        self
    }

    /// Start on the given fragment instead of the default route.
    pub fn with_initial_route(mut self, fragment: impl Into<String>) -> Self {
        self.initial_route = Some(fragment.into());
        self
    }

    pub fn with_strict_routes(mut self, strict: bool) -> Self {
        self.strict_routes = strict;
        self
    }

    pub fn with_report_patches(mut self, report: bool) -> Self {
        self.report_patches = report;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_reserved_routes() {
        let config = Config::default();
        assert_eq!(config.default_route, "/");
        assert_eq!(config.fallback_route, "/404");
        assert!(config.initial_route.is_none());
        assert!(!config.strict_routes);
        assert!(!config.report_patches);
    }

    #[test]
    fn builder_overrides() {
        let config = Config::new()
            .with_default_route("/home")
            .with_fallback_route("/missing")
            .with_initial_route("#/about")
            .with_strict_routes(true)
            .with_report_patches(true);
        assert_eq!(config.default_route, "/home");
        assert_eq!(config.fallback_route, "/missing");
        assert_eq!(config.initial_route.as_deref(), Some("#/about"));
        assert!(config.strict_routes);
        assert!(config.report_patches);
    }
}
