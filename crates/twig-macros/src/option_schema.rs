//! Option keys recognized inside a `view!` element body.

/// How a recognized key is lowered onto the `Options` builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// `attr`: a `(name, value)` tuple or a collection of pairs.
    Attr,
    /// `props`: like `attr`, for properties.
    Props,
    /// `class`: anything convertible to a class list.
    Class,
    /// `event`: a `(name, handler)` tuple or an array of them.
    Event,
    /// `ref`: the name the live element is recorded under.
    Ref,
    /// `on<name>`: a handler for one event.
    Handler,
}

/// A recognized option key.
#[derive(Debug, Clone, Copy)]
pub struct OptionSchema {
    pub name: &'static str,
    pub kind: OptionKind,
}

impl OptionSchema {
    const fn new(name: &'static str, kind: OptionKind) -> Self {
        Self { name, kind }
    }
}

static OPTIONS: &[OptionSchema] = &[
    OptionSchema::new("attr", OptionKind::Attr),
    OptionSchema::new("props", OptionKind::Props),
    OptionSchema::new("class", OptionKind::Class),
    OptionSchema::new("event", OptionKind::Event),
    OptionSchema::new("ref", OptionKind::Ref),
];

/// Classify an option key. `None` for unknown keys.
pub fn option_kind(name: &str) -> Option<OptionKind> {
    if let Some(schema) = OPTIONS.iter().find(|o| o.name == name) {
        return Some(schema.kind);
    }
    event_name(name).map(|_| OptionKind::Handler)
}

/// The event an `on<name>` key binds, e.g. `click` for `onclick`.
pub fn event_name(key: &str) -> Option<&str> {
    key.strip_prefix("on").filter(|rest| !rest.is_empty())
}

/// All named option keys.
pub fn option_names() -> Vec<&'static str> {
    OPTIONS.iter().map(|o| o.name).collect()
}
