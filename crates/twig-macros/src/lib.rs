//! Procedural macros for twig - declarative view syntax.
//!
//! Provides the `view!` macro, which lowers markup-like syntax to calls of
//! the twig node builder.

mod option_schema;
mod suggestions;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::{Expr, Ident, LitStr, Result, Token, braced, token};

use option_schema::{OptionKind, event_name, option_kind, option_names};
use suggestions::format_unknown_option_error;

/// Build a node tree from markup-like syntax.
///
/// An element is a tag name followed by a braced body holding options
/// (`key: value`) and children (string literals, `{expressions}` and nested
/// elements). Several top-level nodes produce a fragment.
///
/// | option | value |
/// |--------|-------|
/// | `attr` | a `(name, value)` tuple, or pairs such as `[("type", "button")]` |
/// | `props` | like `attr`, assigned as properties |
/// | `class` | `"a b"`, `["a b", "c"]`, or any class list |
/// | `event` | a `(name, handler)` tuple or an array of them |
/// | `ref` | the name to record the live element under |
/// | `on<event>` | a handler, e.g. `onclick: move \|_\| ...` |
///
/// # Example
///
/// ```ignore
/// use twig::prelude::*;
///
/// fn greeting(ctx: &Context) -> Node {
///     let name = ctx.state().get(|s| s.get_or("name", String::from("world")));
///     view! {
///         h1 { class: "title", "Hello, " {name} }
///         input { attr: ("type", "text"), ref: "name" }
///     }
/// }
/// ```
#[proc_macro]
pub fn view(input: TokenStream) -> TokenStream {
    let view = syn::parse_macro_input!(input as View);
    view.to_node().into()
}

/// The top level: one or more nodes.
struct View {
    nodes: Vec<ViewNode>,
}

impl Parse for View {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut nodes = Vec::new();
        while !input.is_empty() {
            nodes.push(input.parse()?);
            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(View { nodes })
    }
}

impl View {
    fn to_node(&self) -> TokenStream2 {
        match self.nodes.as_slice() {
            [] => quote! { ::twig::core::node::Node::empty() },
            [single] => single.to_node(),
            many => {
                let nodes: Vec<TokenStream2> = many.iter().map(ViewNode::to_node).collect();
                quote! { ::twig::core::node::Node::Fragment(::std::vec![#(#nodes),*]) }
            }
        }
    }
}

/// A node in the view tree.
enum ViewNode {
    /// An element with options and children.
    Element(ViewElement),
    /// A text literal.
    Text(LitStr),
    /// A Rust expression in braces.
    Expr(Expr),
}

impl Parse for ViewNode {
    fn parse(input: ParseStream) -> Result<Self> {
        if input.peek(LitStr) {
            Ok(ViewNode::Text(input.parse()?))
        } else if input.peek(token::Brace) {
            let content;
            braced!(content in input);
            Ok(ViewNode::Expr(content.parse()?))
        } else {
            Ok(ViewNode::Element(input.parse()?))
        }
    }
}

impl ViewNode {
    /// Tokens evaluating to a `Node`.
    fn to_node(&self) -> TokenStream2 {
        match self {
            ViewNode::Element(el) => el.to_node(),
            ViewNode::Text(lit) => {
                quote! { ::twig::core::node::Node::Text(::std::string::String::from(#lit)) }
            }
            ViewNode::Expr(expr) => {
                quote! { ::twig::core::node::Arg::from(#expr).into_child() }
            }
        }
    }

    /// Tokens evaluating to a builder `Arg` in child position.
    fn to_arg(&self) -> TokenStream2 {
        match self {
            ViewNode::Expr(expr) => quote! { ::twig::core::node::Arg::from(#expr) },
            other => {
                let node = other.to_node();
                quote! { ::twig::core::node::Arg::Node(#node) }
            }
        }
    }
}

/// An element: `tag { options, children }`.
struct ViewElement {
    tag: String,
    name: Ident,
    options: Vec<ViewOption>,
    children: Vec<ViewNode>,
}

impl Parse for ViewElement {
    fn parse(input: ParseStream) -> Result<Self> {
        // Tags may be hyphenated custom element names.
        let name = Ident::parse_any(input)?;
        let mut tag = name.unraw().to_string();
        while input.peek(Token![-]) {
            input.parse::<Token![-]>()?;
            let part = Ident::parse_any(input)?;
            tag.push('-');
            tag.push_str(&part.unraw().to_string());
        }

        let content;
        braced!(content in input);

        let mut options = Vec::new();
        let mut children = Vec::new();

        while !content.is_empty() {
            if content.peek(Ident::peek_any)
                && content.peek2(Token![:])
                && !content.peek2(Token![::])
            {
                options.push(content.parse()?);
            } else {
                children.push(content.parse()?);
            }

            if content.peek(Token![,]) {
                content.parse::<Token![,]>()?;
            }
        }

        Ok(ViewElement {
            tag,
            name,
            options,
            children,
        })
    }
}

impl ViewElement {
    fn to_node(&self) -> TokenStream2 {
        let calls = match self.option_calls() {
            Ok(calls) => calls,
            Err(err) => return err.to_compile_error(),
        };

        let tag = &self.tag;
        let mut args = vec![quote! { ::twig::core::node::Arg::tag(#tag) }];
        if !calls.is_empty() {
            args.push(quote! {
                ::twig::core::node::Arg::from(::twig::core::node::Options::new() #(#calls)*)
            });
        }
        args.extend(self.children.iter().map(ViewNode::to_arg));

        quote! {
            ::twig::core::node::node::<::std::vec::Vec<::twig::core::node::Arg>>(
                ::std::vec![#(#args),*]
            )
        }
    }

    /// Lower every option to `Options` builder calls.
    fn option_calls(&self) -> Result<Vec<TokenStream2>> {
        let mut calls = Vec::new();
        for option in &self.options {
            let key = option.name.unraw().to_string();
            let value = &option.value;
            let Some(kind) = option_kind(&key) else {
                let msg = format_unknown_option_error(&self.name.to_string(), &key, &option_names());
                return Err(syn::Error::new_spanned(&option.name, msg));
            };

            match kind {
                OptionKind::Attr => calls.push(pairs_call(value, quote!(attr), quote!(attrs))),
                OptionKind::Props => calls.push(pairs_call(value, quote!(prop), quote!(props))),
                OptionKind::Class => calls.push(quote! { .class(#value) }),
                OptionKind::Ref => calls.push(quote! { .reference(#value) }),
                OptionKind::Handler => {
                    let event = event_name(&key).unwrap_or_default();
                    calls.push(quote! { .on(#event, #value) });
                }
                OptionKind::Event => match value {
                    Expr::Tuple(tuple) => calls.push(event_call(tuple)?),
                    Expr::Array(array) => {
                        for elem in &array.elems {
                            match elem {
                                Expr::Tuple(tuple) => calls.push(event_call(tuple)?),
                                other => return Err(event_shape_error(other)),
                            }
                        }
                    }
                    other => return Err(event_shape_error(other)),
                },
            }
        }
        Ok(calls)
    }
}

/// `(name, value)` becomes a single call, anything else a collection call.
fn pairs_call(value: &Expr, single: TokenStream2, many: TokenStream2) -> TokenStream2 {
    match value {
        Expr::Tuple(tuple) if tuple.elems.len() == 2 => {
            let name = &tuple.elems[0];
            let val = &tuple.elems[1];
            quote! { .#single(#name, #val) }
        }
        other => quote! { .#many(#other) },
    }
}

fn event_call(tuple: &syn::ExprTuple) -> Result<TokenStream2> {
    if tuple.elems.len() != 2 {
        return Err(syn::Error::new_spanned(
            tuple,
            "expected a `(name, handler)` pair",
        ));
    }
    let name = &tuple.elems[0];
    let handler = &tuple.elems[1];
    Ok(quote! { .on(#name, #handler) })
}

fn event_shape_error(expr: &Expr) -> syn::Error {
    syn::Error::new_spanned(
        expr,
        "`event` expects a `(name, handler)` pair or an array of them",
    )
}

/// An option: `key: value`.
struct ViewOption {
    name: Ident,
    value: Expr,
}

impl Parse for ViewOption {
    fn parse(input: ParseStream) -> Result<Self> {
        let name = Ident::parse_any(input)?;
        input.parse::<Token![:]>()?;
        let value: Expr = input.parse()?;
        Ok(ViewOption { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(src: &str) -> String {
        syn::parse_str::<View>(src).unwrap().to_node().to_string()
    }

    #[test]
    fn element_with_options_and_children() {
        let out = expand(r#"button { class: "a b", ref: "go", onclick: handler, "Go" }"#);
        assert!(out.contains("Arg :: tag (\"button\")"));
        assert!(out.contains(". class (\"a b\")"));
        assert!(out.contains(". reference (\"go\")"));
        assert!(out.contains(". on (\"click\" , handler)"));
        assert!(out.contains("String :: from (\"Go\")"));
    }

    #[test]
    fn attr_tuple_and_list() {
        let single = expand(r#"input { attr: ("type", "text") }"#);
        assert!(single.contains(". attr (\"type\" , \"text\")"));

        let many = expand(r#"input { attr: [("type", "text"), ("name", "q")] }"#);
        assert!(many.contains(". attrs ("));
    }

    #[test]
    fn hyphenated_tags() {
        let out = expand("x-widget { }");
        assert!(out.contains("Arg :: tag (\"x-widget\")"));
    }

    #[test]
    fn several_roots_make_a_fragment() {
        let out = expand(r#"p { "a" } p { "b" }"#);
        assert!(out.starts_with(":: twig :: core :: node :: Node :: Fragment"));
    }

    #[test]
    fn unknown_option_is_a_compile_error() {
        let out = expand(r#"div { clas: "a" }"#);
        assert!(out.contains("compile_error"));
        assert!(out.contains("Did you mean `class`?"));
    }

    #[test]
    fn malformed_event_is_a_compile_error() {
        let out = expand(r#"div { event: handler }"#);
        assert!(out.contains("compile_error"));
    }
}
