//! counter - twig's counter and router demo.
//!
//! Runs against the in-memory surface and prints the markup after each step:
//! - component state kept across passes
//! - a store value shared by every route
//! - navigation between route table entries

use twig::prelude::*;

fn counter(ctx: &Context) -> Node {
    let state = ctx.component_state();
    let count = state.get_or("count", 0i64);
    let refresh = ctx.refresh();

    let store = ctx.state();
    let clicks = store.get(|s| s.get_or("clicks", 0i64));

    ctx.on_mount("log", |mount| {
        tracing::debug!(button = ?mount.reference("increment"), "counter mounted");
    });

    view! {
        h1 { class: "title", "Counter" }
        p { class: ["count", "big"], {count} }
        button {
            attr: ("type", "button"),
            ref: "increment",
            onclick: move |_| {
                state.update("count", || 0i64, |n| *n += 1);
                refresh.refresh();
            },
            "+1"
        }
        button {
            attr: ("type", "button"),
            ref: "record",
            onclick: move |_| store.set(|s| s.update("clicks", || 0i64, |n| *n += 1)),
            "record"
        }
        p { "recorded: " {clicks} }
    }
}

fn about(ctx: &Context) -> Node {
    let clicks = ctx.state().get(|s| s.get_or("clicks", 0i64));
    view! {
        section {
            h1 { "About" }
            p { "Recorded clicks: " {clicks} }
        }
    }
}

fn not_found(_: &Context) -> Node {
    view! { p { class: "error", "Nothing here." } }
}

fn main() -> twig::Result<()> {
    tracing_subscriber::fmt::init();

    let routes = RouteTable::new()
        .route("/", Component::new(counter))
        .route("/about", Component::new(about))
        .route("/404", Component::new(not_found));

    let app = hydrate(MemorySurface::with_host("app"), "#app", routes)?;
    println!("{}", app.html());

    app.dispatch_ref("increment", "click")?;
    app.dispatch_ref("increment", "click")?;
    app.dispatch_ref("record", "click")?;
    println!("{}", app.html());

    app.navigate("#/about")?;
    println!("{}", app.html());

    app.navigate("#/missing")?;
    println!("{}", app.html());

    tracing::info!(passes = app.passes(), "done");
    Ok(())
}
