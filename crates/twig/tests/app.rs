//! End-to-end behavior of hydrated applications on the in-memory surface.

use std::cell::RefCell;
use std::rc::Rc;

use twig::prelude::*;
use twig::{Error, node};

fn host() -> MemorySurface {
    MemorySurface::with_host("app")
}

fn counter(ctx: &Context) -> Node {
    let state = ctx.component_state();
    let count = state.get_or("count", 0i64);
    let refresh = ctx.refresh();
    node![
        "div",
        node!["p", Options::new().reference("count"), count],
        node![
            "button",
            Options::new().reference("increment").on("click", move |_| {
                state.update("count", || 0i64, |n| *n += 1);
                refresh.refresh();
            }),
            "+1",
        ],
    ]
}

#[test]
fn counter_increments_and_keeps_the_button() {
    let app = hydrate(host(), "#app", Component::new(counter)).unwrap();
    let button = app.lookup_ref("increment").unwrap();
    let count = app.lookup_ref("count").unwrap();
    assert_eq!(app.surface().text_content(count), "0");

    app.dispatch_ref("increment", "click").unwrap();
    assert_eq!(app.surface().text_content(count), "1");
    assert_eq!(app.lookup_ref("increment"), Some(button));

    app.dispatch_ref("increment", "click").unwrap();
    assert_eq!(app.surface().text_content(count), "2");
    assert_eq!(app.lookup_ref("increment"), Some(button));
    assert!(app.surface().is_attached(button));
    assert_eq!(app.passes(), 3);
}

#[test]
fn refreshing_an_unchanged_tree_touches_nothing() {
    let static_page = Component::new(|_: &Context| {
        node![
            "main",
            Options::new().attr("id", "page").class("wide"),
            node!["h1", "Title"],
            node!["p", "Body ", 42],
        ]
    });
    let app = hydrate(host(), "#app", static_page).unwrap();
    assert!(!app.surface_mut().take_mutations().is_empty());

    app.refresh();
    assert!(app.last_stats().is_empty(), "{}", app.last_stats());
    assert_eq!(app.surface().mutation_count(), 0);
    assert_eq!(app.passes(), 2);
}

#[test]
fn one_handler_writing_the_store_twice_renders_once() {
    let component = Component::new(|ctx: &Context| {
        let store = ctx.state();
        let total = store.get(|s| s.get_or("a", 0i64) + s.get_or("b", 0i64));
        node![
            "button",
            Options::new().reference("go").on("click", move |_| {
                store.set(|s| s.insert("a", 1i64));
                store.set(|s| s.insert("b", 2i64));
            }),
            total,
        ]
    });
    let app = hydrate(host(), "#app", component).unwrap();
    assert_eq!(app.passes(), 1);

    assert_eq!(app.dispatch_ref("go", "click").unwrap(), 1);
    assert_eq!(app.passes(), 2);
    assert_eq!(app.html(), "<button>3</button>");
}

#[test]
fn store_writes_outside_handlers_refresh_immediately() {
    let component = Component::new(|ctx: &Context| {
        let name = ctx.state().get(|s| s.get_or("name", String::from("world")));
        node!["p", "Hello, ", name]
    });
    let app = hydrate(host(), "#app", component).unwrap();
    assert_eq!(app.html(), "<p>Hello, world</p>");

    app.store().set(|s| s.insert("name", String::from("twig")));
    assert_eq!(app.html(), "<p>Hello, twig</p>");
    assert_eq!(app.passes(), 2);
    assert_eq!(app.store().subscribers().len(), 1);
}

#[test]
fn store_writes_from_mount_hooks_are_rendered() {
    let component = Component::new(|ctx: &Context| {
        let store = ctx.state();
        let loaded = store.get(|s| s.get_or("loaded", false));
        ctx.on_mount("load", move |_| {
            if !loaded {
                store.set(|s| s.insert("loaded", true));
            }
        });
        node!["p", loaded.to_string()]
    });
    let app = hydrate(host(), "#app", component).unwrap();
    assert_eq!(app.html(), "<p>true</p>");
    assert_eq!(app.passes(), 2);
}

#[test]
fn store_writes_from_cleanups_are_rendered() {
    let child = |ctx: &Context| {
        let store = ctx.state();
        ctx.on_unmount("close", move || store.set(|s| s.insert("closed", true)));
        node!["i", "child"]
    };
    let component = Component::new(move |ctx: &Context| {
        let (show, closed) = ctx
            .state()
            .get(|s| (s.get_or("show", true), s.get_or("closed", false)));
        node![
            "div",
            node!["b", closed.to_string()],
            show.then(|| Component::new(child)),
        ]
    });
    let app = hydrate(host(), "#app", component).unwrap();
    assert_eq!(app.html(), "<div><b>false</b><i>child</i></div>");

    app.store().set(|s| s.insert("show", false));
    assert_eq!(app.html(), "<div><b>true</b></div>");
    assert_eq!(app.passes(), 3);
}

#[test]
fn a_hook_writing_on_every_pass_does_not_loop() {
    let component = Component::new(|ctx: &Context| {
        let store = ctx.state();
        let n = store.get(|s| s.get_or("n", 0i64));
        ctx.on_mount("bump", move |_| store.set(|s| s.update("n", || 0i64, |n| *n += 1)));
        node!["p", n]
    });
    let app = hydrate(host(), "#app", component).unwrap();
    assert_eq!(app.passes(), 2);
    assert_eq!(app.html(), "<p>1</p>");
}

type Log = Rc<RefCell<Vec<String>>>;

fn panel(ctx: &Context, log: &Log) -> Node {
    let state = ctx.component_state();
    let clicks = state.get_or("clicks", 0i64);
    let refresh = ctx.refresh();

    let on_unmount = Rc::clone(log);
    ctx.on_unmount("log", move || on_unmount.borrow_mut().push("panel unmounted".into()));
    let on_mount = Rc::clone(log);
    ctx.on_mount("log", move |mount| {
        let attached = mount.reference("panel-inc").is_some();
        on_mount.borrow_mut().push(format!("panel mounted {attached}"));
    });

    node![
        "section",
        node!["span", clicks],
        node![
            "button",
            Options::new().reference("panel-inc").on("click", move |_| {
                state.update("clicks", || 0i64, |n| *n += 1);
                refresh.refresh();
            }),
        ],
    ]
}

fn page(log: Log) -> Component {
    Component::new(move |ctx: &Context| {
        let show = ctx.state().get(|s| s.get_or("show", true));
        let log = Rc::clone(&log);
        let child = show.then(|| Component::new(move |ctx: &Context| panel(ctx, &log)));
        node!["div", node!["h1", "Page"], child]
    })
}

#[test]
fn instance_state_survives_until_its_position_stops_rendering() {
    let log = Log::default();
    let app = hydrate(host(), "#app", page(Rc::clone(&log))).unwrap();
    assert_eq!(app.instances().len(), 2);
    assert_eq!(*log.borrow(), ["panel mounted true"]);

    app.dispatch_ref("panel-inc", "click").unwrap();
    app.dispatch_ref("panel-inc", "click").unwrap();
    assert!(app.html().contains("<span>2</span>"));

    // Mount hooks run on every pass that renders the instance.
    assert_eq!(log.borrow().len(), 3);

    app.store().set(|s| s.insert("show", false));
    assert_eq!(app.instances().len(), 1);
    assert_eq!(app.html(), "<div><h1>Page</h1></div>");
    assert_eq!(log.borrow().last().map(String::as_str), Some("panel unmounted"));
    assert_eq!(app.lookup_ref("panel-inc"), None);
    assert_eq!(
        app.dispatch_ref("panel-inc", "click"),
        Err(Error::StaleReference("panel-inc".into()))
    );

    app.store().set(|s| s.insert("show", true));
    assert_eq!(app.instances().len(), 2);
    assert!(app.html().contains("<span>0</span>"));
}

#[test]
fn unmount_runs_every_cleanup() {
    let log = Log::default();
    let app = hydrate(host(), "#app", page(Rc::clone(&log))).unwrap();

    app.unmount();
    assert!(!app.is_mounted());
    assert_eq!(app.html(), "");
    assert!(app.instances().is_empty());
    assert_eq!(log.borrow().last().map(String::as_str), Some("panel unmounted"));
}

fn home(_: &Context) -> Node {
    node!["p", "home"]
}

fn about(_: &Context) -> Node {
    node!["p", "about"]
}

fn not_found(_: &Context) -> Node {
    node!["p", "not found"]
}

fn routes() -> RouteTable {
    RouteTable::new()
        .route("/", Component::new(home))
        .route("/about", Component::new(about))
        .route("/404", Component::new(not_found))
}

#[test]
fn routes_resolve_by_fragment() {
    let app = hydrate(host(), "#app", routes()).unwrap();
    assert_eq!(app.html(), "<p>home</p>");
    assert_eq!(app.active_route().as_deref(), Some("/"));

    app.navigate("#/about").unwrap();
    assert_eq!(app.html(), "<p>about</p>");
    assert_eq!(app.route(), "/about");

    app.navigate("#/missing").unwrap();
    assert_eq!(app.html(), "<p>not found</p>");
    assert_eq!(app.active_route().as_deref(), Some("/404"));

    app.navigate("").unwrap();
    assert_eq!(app.html(), "<p>home</p>");
}

#[test]
fn initial_route_comes_from_config() {
    let app = hydrate_with(
        host(),
        "#app",
        routes(),
        Config::new().with_initial_route("#/about"),
    )
    .unwrap();
    assert_eq!(app.html(), "<p>about</p>");
}

#[test]
fn navigation_without_fallback_keeps_the_current_route() {
    let table = RouteTable::new()
        .route("/", Component::new(home))
        .route("/about", Component::new(about));
    let app = hydrate(host(), "#app", table).unwrap();

    let err = app.navigate("#/missing").unwrap_err();
    assert_eq!(err, Error::UnresolvedRoute("/missing".into()));
    assert_eq!(app.html(), "<p>home</p>");
    assert_eq!(app.passes(), 1);
}

#[test]
fn switching_routes_replaces_the_root_instance() {
    let app = hydrate(host(), "#app", routes()).unwrap();
    let first = app.instances()[0].id;

    app.navigate("/about").unwrap();
    let instances = app.instances();
    assert_eq!(instances.len(), 1);
    assert_ne!(instances[0].id, first);
}
