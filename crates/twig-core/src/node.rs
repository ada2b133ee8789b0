//! Virtual nodes and the argument normalizer that builds them.
//!
//! A render pass describes the UI as a tree of [`Node`]s. Trees are built
//! either with the typed builders ([`Element`], [`Options`]) or with the
//! variadic [`node()`] entry point, which classifies every argument once,
//! at construction time, into one canonical shape:
//!
//! - a tag name (first argument only, when it looks like a tag),
//! - an options group ([`Options`]) merged into the element,
//! - a child (text, number or another node).
//!
//! ```ignore
//! use twig_core::node;
//! use twig_core::node::Options;
//!
//! let button = node![
//!     "button",
//!     Options::new().attr("type", "button").class("btn primary"),
//!     "Click me",
//! ];
//! ```
//!
//! Calling the builder without a tag yields a fragment, which is how several
//! roots are returned without a wrapper element.

use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::events::{Event, EventHandler};

/// Build a node from a variadic argument list.
///
/// Each argument is converted with [`Arg::from`]; see [`node()`] for the
/// classification rules.
#[macro_export]
macro_rules! node {
    ($($arg:expr),* $(,)?) => {
        $crate::node::node::<::std::vec::Vec<$crate::node::Arg>>(
            ::std::vec![$($crate::node::Arg::from($arg)),*]
        )
    };
}

// ============================================================================
// Values
// ============================================================================

/// An attribute or property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// The string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Value::Int(i64::from(n))
            }
        })*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

// Values past `i64::MAX` keep their decimal text.
macro_rules! value_from_wide_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                i64::try_from(n).map_or_else(|_| Value::Str(n.to_string()), Value::Int)
            }
        })*
    };
}

value_from_wide_int!(u64, usize, isize);

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(f64::from(x))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

// ============================================================================
// Classes
// ============================================================================

/// Class tokens in first-appearance order.
///
/// Accepts a single (possibly space-joined) string or a sequence of such
/// strings; every form is split on whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassList(Vec<String>);

impl ClassList {
    fn push_tokens(&mut self, input: &str) {
        for token in input.split_whitespace() {
            if !self.0.iter().any(|t| t == token) {
                self.0.push(token.to_owned());
            }
        }
    }

    fn from_strs<'a>(inputs: impl IntoIterator<Item = &'a str>) -> Self {
        let mut list = ClassList::default();
        for input in inputs {
            list.push_tokens(input);
        }
        list
    }

    /// The normalized tokens.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for ClassList {
    fn from(s: &str) -> Self {
        ClassList::from_strs([s])
    }
}

impl From<String> for ClassList {
    fn from(s: String) -> Self {
        ClassList::from_strs([s.as_str()])
    }
}

impl From<&String> for ClassList {
    fn from(s: &String) -> Self {
        ClassList::from_strs([s.as_str()])
    }
}

impl From<&[&str]> for ClassList {
    fn from(items: &[&str]) -> Self {
        ClassList::from_strs(items.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for ClassList {
    fn from(items: [&str; N]) -> Self {
        ClassList::from_strs(items)
    }
}

impl<const N: usize> From<[String; N]> for ClassList {
    fn from(items: [String; N]) -> Self {
        ClassList::from_strs(items.iter().map(String::as_str))
    }
}

impl From<Vec<&str>> for ClassList {
    fn from(items: Vec<&str>) -> Self {
        ClassList::from_strs(items)
    }
}

impl From<Vec<String>> for ClassList {
    fn from(items: Vec<String>) -> Self {
        ClassList::from_strs(items.iter().map(String::as_str))
    }
}

// ============================================================================
// Options
// ============================================================================

/// A dynamically shaped option value, accepted by [`Options::entry`].
///
/// This mirrors the loose shapes a markup author might hand over: a plain
/// value, a name/value map, a list of either, or named handlers.
#[derive(Debug, Clone)]
pub enum OptionValue {
    Value(Value),
    Map(Vec<(String, Value)>),
    Events(Vec<(String, EventHandler)>),
    List(Vec<OptionValue>),
}

impl OptionValue {
    /// A name/value map.
    pub fn map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        OptionValue::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// A single named handler.
    pub fn event<F: Fn(&Event) + 'static>(name: impl Into<String>, f: F) -> Self {
        OptionValue::Events(vec![(name.into(), EventHandler::new(f))])
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Value(Value::from(s))
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Value(Value::Str(s))
    }
}

impl From<Value> for OptionValue {
    fn from(v: Value) -> Self {
        OptionValue::Value(v)
    }
}

impl From<Vec<OptionValue>> for OptionValue {
    fn from(items: Vec<OptionValue>) -> Self {
        OptionValue::List(items)
    }
}

/// The option keys an options group recognizes.
pub const OPTION_KEYS: &[&str] = &["attr", "props", "class", "event", "ref"];

/// One options group: attributes, properties, classes, events and a ref.
///
/// Groups are merged into an element in argument order; for attributes,
/// properties and events a later group overrides earlier ones key by key,
/// classes accumulate, and the last `ref` wins.
#[derive(Debug, Clone, Default)]
pub struct Options {
    attributes: IndexMap<String, Value>,
    properties: IndexMap<String, Value>,
    classes: IndexSet<String>,
    events: IndexMap<String, Vec<EventHandler>>,
    reference: Option<String>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one markup attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set several markup attributes; later pairs override earlier ones.
    pub fn attrs<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        for (k, v) in pairs {
            self.attributes.insert(k.into(), v.into());
        }
        self
    }

    /// Set one DOM property.
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Set several DOM properties.
    pub fn props<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        for (k, v) in pairs {
            self.properties.insert(k.into(), v.into());
        }
        self
    }

    /// Add class tokens.
    pub fn class(mut self, classes: impl Into<ClassList>) -> Self {
        self.classes.extend(classes.into().0);
        self
    }

    /// Bind a handler. Repeated calls for one event bind every handler.
    pub fn on<F: Fn(&Event) + 'static>(self, event: impl Into<String>, f: F) -> Self {
        self.on_handler(event, EventHandler::new(f))
    }

    pub fn on_handler(mut self, event: impl Into<String>, handler: EventHandler) -> Self {
        self.events.entry(event.into()).or_default().push(handler);
        self
    }

    /// Name the live element for lookup from mount hooks.
    pub fn reference(mut self, name: impl Into<String>) -> Self {
        self.reference = Some(name.into());
        self
    }

    /// Apply a dynamically shaped entry, ignoring it if malformed.
    pub fn entry(mut self, key: &str, value: OptionValue) -> Self {
        if let Err(err) = self.apply_entry(key, value) {
            tracing::debug!("ignoring option entry: {}", err);
        }
        self
    }

    /// Apply a dynamically shaped entry.
    ///
    /// On error, parts of a list that were well formed have still been
    /// applied.
    pub fn apply_entry(&mut self, key: &str, value: OptionValue) -> Result<()> {
        match (key, value) {
            (_, OptionValue::List(items)) if key != "ref" => {
                let mut first_error = None;
                for item in items {
                    if let Err(err) = self.apply_entry(key, item) {
                        first_error.get_or_insert(err);
                    }
                }
                first_error.map_or(Ok(()), Err)
            }
            ("attr", OptionValue::Map(pairs)) => {
                self.attributes.extend(pairs);
                Ok(())
            }
            ("props", OptionValue::Map(pairs)) => {
                self.properties.extend(pairs);
                Ok(())
            }
            ("class", OptionValue::Value(Value::Str(s))) => {
                self.classes.extend(ClassList::from(s).0);
                Ok(())
            }
            ("event", OptionValue::Events(handlers)) => {
                for (name, handler) in handlers {
                    self.events.entry(name).or_default().push(handler);
                }
                Ok(())
            }
            ("ref", OptionValue::Value(Value::Str(s))) => {
                self.reference = Some(s);
                Ok(())
            }
            (key, _) if OPTION_KEYS.contains(&key) => Err(Error::MalformedDescriptor {
                key: key.to_owned(),
                reason: "value shape not accepted for this key",
            }),
            (key, _) => Err(Error::MalformedDescriptor {
                key: key.to_owned(),
                reason: "unknown option key",
            }),
        }
    }

    /// Merge a later group into this one.
    pub fn merge(&mut self, later: Options) {
        self.attributes.extend(later.attributes);
        self.properties.extend(later.properties);
        self.classes.extend(later.classes);
        self.events.extend(later.events);
        if later.reference.is_some() {
            self.reference = later.reference;
        }
    }

    fn apply_to(self, element: &mut Element) {
        element.attributes.extend(self.attributes);
        element.properties.extend(self.properties);
        element.classes.extend(self.classes);
        element.events.extend(self.events);
        if self.reference.is_some() {
            element.reference = self.reference;
        }
    }
}

// ============================================================================
// Components
// ============================================================================

/// A component function: `(context) -> Node`.
///
/// Identity across render passes is the Rust type of the function, so a
/// component produced by a parameterized factory keeps its instance as long
/// as the same factory fills the same position.
#[derive(Clone)]
pub struct Component {
    render: Rc<dyn Fn(&Context) -> Node>,
    kind: TypeId,
    name: &'static str,
}

impl Component {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Node + 'static,
    {
        Self {
            render: Rc::new(f),
            kind: TypeId::of::<F>(),
            name: std::any::type_name::<F>(),
        }
    }

    /// The identity of the component function.
    pub fn kind(&self) -> TypeId {
        self.kind
    }

    /// The type name of the component function, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Invoke the component body.
    pub fn render(&self, ctx: &Context) -> Node {
        (self.render)(ctx)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// An element descriptor.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    pub attributes: IndexMap<String, Value>,
    pub properties: IndexMap<String, Value>,
    pub classes: IndexSet<String>,
    pub events: IndexMap<String, Vec<EventHandler>>,
    pub reference: Option<String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Merge an options group.
    pub fn with(mut self, options: Options) -> Self {
        options.apply_to(&mut self);
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Copy of everything but the children.
    pub(crate) fn shallow(&self) -> Element {
        Element {
            tag: self.tag.clone(),
            attributes: self.attributes.clone(),
            properties: self.properties.clone(),
            classes: self.classes.clone(),
            events: self.events.clone(),
            reference: self.reference.clone(),
            children: Vec::new(),
        }
    }
}

/// The kind of a node, as seen by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Fragment,
    Component,
}

/// One renderable unit.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Several siblings without a wrapper element.
    Fragment(Vec<Node>),
    /// A component, expanded by the reconciler at its position.
    Component(Component),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Element(_) => NodeKind::Element,
            Node::Text(_) => NodeKind::Text,
            Node::Fragment(_) => NodeKind::Fragment,
            Node::Component(_) => NodeKind::Component,
        }
    }

    /// An empty fragment, the placeholder for an absent child.
    pub fn empty() -> Self {
        Node::Fragment(Vec::new())
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl From<Component> for Node {
    fn from(c: Component) -> Self {
        Node::Component(c)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_owned())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(s)
    }
}

impl From<Vec<Node>> for Node {
    fn from(children: Vec<Node>) -> Self {
        Node::Fragment(children)
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(opt: Option<T>) -> Self {
        opt.map_or_else(Node::empty, Into::into)
    }
}

/// Wrap a literal string as a text node.
pub fn text(value: impl Into<String>) -> Node {
    Node::Text(value.into())
}

/// Group children without a wrapper element.
pub fn fragment<I>(children: I) -> Node
where
    I: IntoIterator,
    I::Item: Into<Node>,
{
    Node::Fragment(children.into_iter().map(Into::into).collect())
}

// ============================================================================
// Variadic builder
// ============================================================================

/// A classified builder argument.
#[derive(Debug, Clone)]
pub enum Arg {
    /// An explicit tag name.
    Tag(String),
    /// A string: a tag name in first position if it looks like one,
    /// otherwise a text child.
    Text(String),
    /// A number, always a text child.
    Number(String),
    Options(Options),
    Node(Node),
}

impl Arg {
    /// An argument that is always taken as a tag name.
    pub fn tag(name: impl Into<String>) -> Self {
        Arg::Tag(name.into())
    }

    /// The node this argument becomes in child position.
    pub fn into_child(self) -> Node {
        child_of(self)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Text(s.to_owned())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Text(s)
    }
}

impl From<&String> for Arg {
    fn from(s: &String) -> Self {
        Arg::Text(s.clone())
    }
}

macro_rules! arg_from_number {
    ($($t:ty),*) => {
        $(impl From<$t> for Arg {
            fn from(n: $t) -> Self {
                Arg::Number(n.to_string())
            }
        })*
    };
}

arg_from_number!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64);

impl From<Options> for Arg {
    fn from(o: Options) -> Self {
        Arg::Options(o)
    }
}

impl From<Node> for Arg {
    fn from(n: Node) -> Self {
        Arg::Node(n)
    }
}

impl From<Element> for Arg {
    fn from(el: Element) -> Self {
        Arg::Node(Node::Element(el))
    }
}

impl From<Component> for Arg {
    fn from(c: Component) -> Self {
        Arg::Node(Node::Component(c))
    }
}

impl From<Vec<Node>> for Arg {
    fn from(children: Vec<Node>) -> Self {
        Arg::Node(Node::Fragment(children))
    }
}

impl<T: Into<Node>> From<Option<T>> for Arg {
    fn from(opt: Option<T>) -> Self {
        Arg::Node(Node::from(opt))
    }
}

/// HTML element names recognized as tags in first position.
const KNOWN_TAGS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "bdi", "bdo",
    "blockquote", "body", "br", "button", "canvas", "caption", "cite", "code", "col",
    "colgroup", "data", "datalist", "dd", "del", "details", "dfn", "dialog", "div", "dl",
    "dt", "em", "embed", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2",
    "h3", "h4", "h5", "h6", "header", "hgroup", "hr", "i", "iframe", "img", "input", "ins",
    "kbd", "label", "legend", "li", "main", "map", "mark", "menu", "meter", "nav",
    "noscript", "object", "ol", "optgroup", "option", "output", "p", "picture", "pre",
    "progress", "q", "rp", "rt", "ruby", "s", "samp", "section", "select", "slot", "small",
    "source", "span", "strong", "sub", "summary", "sup", "svg", "table", "tbody", "td",
    "template", "textarea", "tfoot", "th", "thead", "time", "tr", "track", "u", "ul", "var",
    "video", "wbr",
];

/// Whether `word` has the shape of a tag name: a known HTML element or a
/// custom element name (`x-widget`).
pub fn is_tag_name(word: &str) -> bool {
    if KNOWN_TAGS.contains(&word) {
        return true;
    }
    let mut chars = word.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && word.contains('-')
        && !word.ends_with('-')
        && word
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Build a node from an ordered argument list.
///
/// Classification is total:
///
/// | argument | first position | elsewhere |
/// |----------|----------------|-----------|
/// | [`Arg::Tag`] | tag | empty child element |
/// | [`Arg::Text`] naming a tag | tag | text child |
/// | other [`Arg::Text`], [`Arg::Number`] | text child | text child |
/// | [`Arg::Options`] | merged | merged |
/// | [`Arg::Node`] | child | child |
///
/// Without a tag the result is a fragment of all children; options groups
/// have nothing to attach to in that case and are ignored.
pub fn node<I>(args: I) -> Node
where
    I: IntoIterator,
    I::Item: Into<Arg>,
{
    let mut args = args.into_iter().map(Into::into);
    let (tag, first) = match args.next() {
        Some(Arg::Tag(tag)) => (Some(tag), None),
        Some(Arg::Text(word)) if is_tag_name(&word) => (Some(word), None),
        other => (None, other),
    };
    let rest = first.into_iter().chain(args);

    match tag {
        Some(tag) => {
            let mut element = Element::new(tag);
            for arg in rest {
                match arg {
                    Arg::Options(options) => options.apply_to(&mut element),
                    other => element.children.push(child_of(other)),
                }
            }
            Node::Element(element)
        }
        None => {
            let mut children = Vec::new();
            for arg in rest {
                match arg {
                    Arg::Options(_) => {
                        tracing::debug!("ignoring options group passed without a tag");
                    }
                    other => children.push(child_of(other)),
                }
            }
            Node::Fragment(children)
        }
    }
}

fn child_of(arg: Arg) -> Node {
    match arg {
        Arg::Tag(tag) => Node::Element(Element::new(tag)),
        Arg::Text(s) | Arg::Number(s) => Node::Text(s),
        Arg::Node(n) => n,
        Arg::Options(_) => Node::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn element(node: Node) -> Element {
        match node {
            Node::Element(el) => el,
            other => panic!("expected element, got {:?}", other.kind()),
        }
    }

    fn classes(el: &Element) -> Vec<&str> {
        el.classes.iter().map(String::as_str).collect()
    }

    #[test]
    fn wide_unsigned_values_are_not_truncated() {
        assert_eq!(Value::from(u64::MAX).to_string(), "18446744073709551615");
        assert_eq!(Value::from(u64::MAX), Value::Str(u64::MAX.to_string()));
        assert_eq!(Value::from(42u64), Value::Int(42));
        assert_eq!(Value::from(-3isize), Value::Int(-3));
        assert_eq!(Value::from(u32::MAX), Value::Int(i64::from(u32::MAX)));

        let el = element(node!["meter", Options::new().attr("max", u64::MAX)]);
        assert_eq!(el.attributes["max"].to_string(), "18446744073709551615");
    }

    #[test]
    fn first_tag_word_becomes_the_tag() {
        let el = element(node!["p", "hello"]);
        assert_eq!(el.tag, "p");
        assert!(matches!(&el.children[..], [Node::Text(t)] if t == "hello"));
    }

    #[test]
    fn non_tag_first_word_is_text_in_a_fragment() {
        let n = node!["hello world", node!["span"]];
        match n {
            Node::Fragment(children) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(&children[0], Node::Text(t) if t == "hello world"));
                assert!(matches!(&children[1], Node::Element(el) if el.tag == "span"));
            }
            other => panic!("expected fragment, got {:?}", other.kind()),
        }
    }

    #[test]
    fn numbers_are_text_children() {
        let el = element(node!["p", 42]);
        assert!(matches!(&el.children[..], [Node::Text(t)] if t == "42"));

        let n = node![7, "x"];
        assert_eq!(n.kind(), NodeKind::Fragment);
    }

    #[test]
    fn explicit_tag_is_always_a_tag() {
        let el = element(node![Arg::tag("widget"), Arg::tag("inner")]);
        assert_eq!(el.tag, "widget");
        assert!(matches!(&el.children[..], [Node::Element(c)] if c.tag == "inner"));
    }

    #[test]
    fn custom_element_names_are_tags() {
        assert!(is_tag_name("x-widget"));
        assert!(is_tag_name("my-app2"));
        assert!(!is_tag_name("hello"));
        assert!(!is_tag_name("Hello-World"));
        assert!(!is_tag_name("x-"));
        assert!(!is_tag_name(""));
    }

    #[test]
    fn attribute_groups_merge_with_later_overrides() {
        let el = element(node![
            "button",
            Options::new().attrs([("type", "button"), ("title", "first")]),
            Options::new().attr("data-x", "v").attr("title", "second"),
        ]);
        assert_eq!(el.attributes.get("type"), Some(&Value::from("button")));
        assert_eq!(el.attributes.get("data-x"), Some(&Value::from("v")));
        assert_eq!(el.attributes.get("title"), Some(&Value::from("second")));
        assert_eq!(el.attributes.len(), 3);
    }

    #[test]
    fn class_inputs_normalize_to_one_ordered_set() {
        let a = element(node!["div", Options::new().class("a b").class("c")]);
        let b = element(node!["div", Options::new().class(["a b", "c"])]);
        let c = element(node!["div", Options::new().class(vec!["a", "b a", "c b"])]);
        assert_eq!(classes(&a), ["a", "b", "c"]);
        assert_eq!(classes(&b), ["a", "b", "c"]);
        assert_eq!(classes(&c), ["a", "b", "c"]);
    }

    #[test]
    fn handlers_for_one_event_accumulate_within_a_group() {
        let el = element(node![
            "button",
            Options::new().on("click", |_| {}).on("click", |_| {}),
        ]);
        assert_eq!(el.events["click"].len(), 2);
    }

    #[test]
    fn later_group_overrides_event_key() {
        let el = element(node![
            "button",
            Options::new().on("click", |_| {}).on("click", |_| {}),
            Options::new().on("click", |_| {}),
        ]);
        assert_eq!(el.events["click"].len(), 1);
    }

    #[test]
    fn reference_is_recorded() {
        let el = element(node!["input", Options::new().reference("name")]);
        assert_eq!(el.reference.as_deref(), Some("name"));
    }

    #[test]
    fn dynamic_entries_accept_documented_shapes() {
        let options = Options::new()
            .entry(
                "attr",
                OptionValue::List(vec![
                    OptionValue::map([("type", "button")]),
                    OptionValue::map([("data-x", "v")]),
                ]),
            )
            .entry(
                "class",
                OptionValue::List(vec!["a b".into(), "c".into()]),
            )
            .entry("props", OptionValue::map([("value", 3)]))
            .entry("event", OptionValue::event("click", |_| {}))
            .entry("ref", "btn".into());
        let el = element(node!["button", options]);

        assert_eq!(el.attributes.len(), 2);
        assert_eq!(classes(&el), ["a", "b", "c"]);
        assert_eq!(el.properties.get("value"), Some(&Value::Int(3)));
        assert_eq!(el.events["click"].len(), 1);
        assert_eq!(el.reference.as_deref(), Some("btn"));
    }

    #[test]
    fn malformed_entries_are_ignored() {
        let mut options = Options::new();
        let err = options
            .apply_entry("style", "color: red".into())
            .unwrap_err();
        assert!(matches!(err, Error::MalformedDescriptor { ref key, .. } if key == "style"));

        let err = options
            .apply_entry("ref", OptionValue::map([("a", "b")]))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedDescriptor { .. }));

        let el = element(node![
            "div",
            Options::new()
                .entry("style", "color: red".into())
                .entry("class", OptionValue::map([("a", true)]))
                .attr("id", "kept"),
        ]);
        assert!(el.classes.is_empty());
        assert_eq!(el.attributes.get("id"), Some(&Value::from("kept")));
    }

    #[test]
    fn options_without_tag_are_dropped() {
        let n = node!["not a tag", Options::new().attr("id", "x")];
        match n {
            Node::Fragment(children) => assert_eq!(children.len(), 1),
            other => panic!("expected fragment, got {:?}", other.kind()),
        }
    }

    #[test]
    fn absent_optional_child_keeps_its_position() {
        let shown: Option<Node> = None;
        let el = element(node!["div", shown, node!["span"]]);
        assert_eq!(el.children.len(), 2);
        assert!(matches!(&el.children[0], Node::Fragment(c) if c.is_empty()));
    }

    #[test]
    fn text_builder_has_no_attributes() {
        assert!(matches!(text("hi"), Node::Text(t) if t == "hi"));
        let el = element(node!["p", text("a"), node!["b", "bold"]]);
        assert_eq!(el.children.len(), 2);
    }

    #[test]
    fn merge_keeps_union_and_overrides() {
        let mut first = Options::new().attr("a", 1).class("x").reference("one");
        first.merge(Options::new().attr("a", 2).attr("b", 3).class("y x"));
        let el = element(node!["div", first]);
        assert_eq!(el.attributes.get("a"), Some(&Value::Int(2)));
        assert_eq!(el.attributes.get("b"), Some(&Value::Int(3)));
        assert_eq!(classes(&el), ["x", "y"]);
        assert_eq!(el.reference.as_deref(), Some("one"));
    }

    proptest! {
        #[test]
        fn later_attribute_group_wins_on_overlap(
            first in proptest::collection::btree_map("[a-z]{1,4}", "[a-z]{0,4}", 0..6),
            second in proptest::collection::btree_map("[a-z]{1,4}", "[a-z]{0,4}", 0..6),
        ) {
            let el = element(node![
                "div",
                Options::new().attrs(first.clone()),
                Options::new().attrs(second.clone()),
            ]);

            for (k, v) in &second {
                prop_assert_eq!(el.attributes.get(k), Some(&Value::from(v.as_str())));
            }
            for (k, v) in &first {
                if !second.contains_key(k) {
                    prop_assert_eq!(el.attributes.get(k), Some(&Value::from(v.as_str())));
                }
            }
            let union: std::collections::BTreeSet<_> = first.keys().chain(second.keys()).collect();
            prop_assert_eq!(el.attributes.len(), union.len());
        }

        #[test]
        fn class_shape_does_not_change_the_set(
            tokens in proptest::collection::vec("[a-c]{1,2}", 0..8),
            split in 0usize..8,
        ) {
            let split = split.min(tokens.len());
            let joined = tokens.join(" ");
            let parts = vec![tokens[..split].join(" "), tokens[split..].join(" ")];

            let from_string = element(node!["div", Options::new().class(joined.as_str())]);
            let from_parts = element(node!["div", Options::new().class(parts)]);

            let mut expected: Vec<&str> = Vec::new();
            for t in &tokens {
                if !expected.contains(&t.as_str()) {
                    expected.push(t);
                }
            }
            prop_assert_eq!(classes(&from_string), expected.clone());
            prop_assert_eq!(classes(&from_parts), expected);
        }
    }
}
