//! 플러깅 라이프사이클 통합 테스트

use async_trait::async_trait;
use graft_core::{
    text_response, AppConfigurator, BootstrapArgs, Application, Attr, Catalog, CollisionPolicy, ColumnDef,
    Controller, EntityClass, Error, ExposedMethod, HelperNamespace, HookPoint, HostConfig,
    HostModel, JinjaEngine, LiveApp, Member, ModelModule, ModuleSlot, Output, Params, PlugOptions,
    Pluggable, Request, Response, SeedFn, SeedOutcome, TableDescriptor, Translation,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Default)]
struct ShopApp {
    default_appid: Option<String>,
    public_dir: Option<PathBuf>,
    i18n_dir: Option<PathBuf>,
    patches: Option<String>,
    seeded: Arc<Mutex<HashSet<String>>>,
    init_calls: Arc<AtomicUsize>,
}

impl ShopApp {
    fn new() -> Self {
        Self {
            default_appid: Some("shop".into()),
            ..Default::default()
        }
    }
}

fn vars(value: Value) -> Params {
    value.as_object().cloned().unwrap_or_default()
}

impl Pluggable for ShopApp {
    fn plugme(&self, _config: &HostConfig, _options: &PlugOptions) -> graft_core::Result<PlugOptions> {
        let mut declared = PlugOptions::new();
        declared.appid = self.default_appid.clone();
        Ok(declared)
    }

    fn model(&self) -> Option<ModelModule> {
        let calls = Arc::clone(&self.init_calls);
        Some(
            ModelModule::new()
                .with_class(EntityClass::relational(
                    "Order",
                    TableDescriptor::new("orders")
                        .with_column(ColumnDef::new("id", "INTEGER").primary())
                        .with_column(ColumnDef::new("total", "NUMERIC")),
                ))
                .with_class(EntityClass::plain("OrderView"))
                .with_member("VERSION", Member::Value(json!(2)))
                .with_init_model(move |_session| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
        )
    }

    fn helpers(&self) -> Option<HelperNamespace> {
        Some(HelperNamespace::new().with_function("format_currency", |args| {
            let amount = args.first().cloned().unwrap_or(Value::Null);
            Ok(json!(format!("EUR {}", amount)))
        }))
    }

    fn root_controller(&self) -> Option<Controller> {
        Some(
            Controller::new("ShopRoot")
                .expose("index", |_| Ok(Output::Rendered("shop home".into())))
                .expose("purge", |_| Ok(Output::Rendered("purged".into())))
                .with_method(
                    "list",
                    ExposedMethod::new(|_| Ok(Output::Vars(vars(json!({"count": 3})))))
                        .with_template("shop/list.html"),
                ),
        )
    }

    fn bootstrap(&self) -> Option<SeedFn> {
        let seeded = Arc::clone(&self.seeded);
        Some(Arc::new(move |_args: &BootstrapArgs| {
            if seeded.lock().insert("shop-admin".into()) {
                Ok(())
            } else {
                Err(Error::Integrity("duplicate key shop-admin".into()))
            }
        }))
    }

    fn public_dir(&self) -> Option<PathBuf> {
        self.public_dir.clone()
    }

    fn partials(&self) -> Option<Attr> {
        Some(Attr::namespace().with(
            "cart",
            Attr::class(|| {
                Controller::new("CartPartial").with_method(
                    "summary",
                    ExposedMethod::new(|params| {
                        let count = params.get("count").cloned().unwrap_or(json!(0));
                        Ok(Output::Vars(vars(json!({ "count": count }))))
                    })
                    .with_template("shop/cart.html"),
                )
            }),
        ))
    }

    fn i18n_dir(&self) -> Option<PathBuf> {
        self.i18n_dir.clone()
    }

    fn template_patches(&self) -> Option<String> {
        self.patches.clone()
    }
}

struct HostHandler;

#[async_trait]
impl Application for HostHandler {
    async fn call(&self, _request: Request) -> graft_core::Result<Response> {
        text_response(http::StatusCode::OK, "host")
    }
}

fn host_root() -> Controller {
    Controller::new("RootController")
        .expose("index", |_| Ok(Output::Rendered("home".into())))
        .with_child(
            "billing",
            Controller::new("BillingController")
                .with_child("invoices", Controller::new("InvoicesController")),
        )
}

fn configurator(config: HostConfig, shop: ShopApp) -> AppConfigurator {
    let mut configurator = AppConfigurator::new(config).with_module("shop", Arc::new(shop));
    configurator.set_model(HostModel::new());
    configurator.set_helpers(HelperNamespace::new());
    configurator
}

fn live_app() -> LiveApp {
    LiveApp::new(host_root(), Arc::new(HostHandler))
}

fn engine() -> Arc<JinjaEngine> {
    Arc::new(
        JinjaEngine::new()
            .with_template("home.html", r#"<div id="sidebar"><i>old</i></div>"#)
            .unwrap()
            .with_template("bold.html", "<b>{{ label }}</b>")
            .unwrap()
            .with_template("shop/list.html", "<p>{{ count }} orders</p>")
            .unwrap()
            .with_template("host/list.html", "<ul>{{ count }}</ul>")
            .unwrap()
            .with_template("shop/cart.html", "<span>{{ count }}</span>")
            .unwrap(),
    )
}

// ============================================================================
// plug()
// ============================================================================

#[test]
fn test_plug_twice_is_rejected() {
    let mut configurator = configurator(HostConfig::default(), ShopApp::new());
    configurator.plug("shop", PlugOptions::new()).unwrap();

    let err = configurator.plug("shop", PlugOptions::new()).unwrap_err();
    assert!(matches!(err, Error::AlreadyPlugged(ref name) if name == "shop"));

    let registry = configurator.registry().unwrap();
    assert_eq!(registry.read().len(), 1);
    assert!(matches!(registry.read().slot("shop"), Some(ModuleSlot::Reserved)));
    assert_eq!(
        configurator.hooks().names(HookPoint::ConfigReady),
        vec!["pluggable:helpers", "plug:shop"]
    );
    assert_eq!(configurator.hooks().names(HookPoint::NewApp), vec!["check:shop"]);
}

#[test]
fn test_missing_appid_leaves_registry_unchanged() {
    let shop = ShopApp {
        default_appid: None,
        ..Default::default()
    };
    let mut configurator = configurator(HostConfig::default(), shop);

    let err = configurator.plug("shop", PlugOptions::new()).unwrap_err();
    assert!(matches!(err, Error::MissingAppId(_)));

    let err = configurator
        .plug("shop", PlugOptions::new().with_appid("  "))
        .unwrap_err();
    assert!(matches!(err, Error::MissingAppId(_)));

    assert!(!configurator.registry().unwrap().read().contains("shop"));
    assert!(configurator.hooks().names(HookPoint::NewApp).is_empty());
}

#[test]
fn test_unknown_module() {
    let mut configurator = configurator(HostConfig::default(), ShopApp::new());
    let err = configurator.plug("blog", PlugOptions::new()).unwrap_err();
    assert!(matches!(err, Error::ModuleNotFound(_)));
}

#[test]
fn test_config_file_options_override_declared() {
    let config = HostConfig::from_toml_str(
        r#"
        [plug.shop]
        appid = "store"
        "#,
    )
    .unwrap();
    let mut configurator = configurator(config, ShopApp::new());
    configurator.plug("shop", PlugOptions::new()).unwrap();

    let app = configurator.make_app(live_app()).unwrap();
    assert_eq!(app.plugged(), vec!["shop".to_string()]);
    assert_eq!(
        app.plug_url("shop", "/cart", &[("id", "3"), ("q", "a b")]).unwrap(),
        "/store/cart?id=3&q=a%20b"
    );
    assert_eq!(app.dispatch("/store/", &Params::new()).unwrap(), "shop home");

    let redirect = app.plug_redirect("shop", "cart", &[]).unwrap();
    assert_eq!(redirect.status(), http::StatusCode::FOUND);
    assert_eq!(redirect.headers()[http::header::LOCATION], "/store/cart");
}

// ============================================================================
// Controllers
// ============================================================================

#[test]
fn test_nested_mount_point() {
    let mut configurator = configurator(HostConfig::default(), ShopApp::new());
    configurator
        .plug("shop", PlugOptions::new().with_appid("billing.invoices.detail"))
        .unwrap();

    let app = configurator.make_app(live_app()).unwrap();
    let mounted = app
        .root_controller()
        .find("/billing/invoices/detail")
        .unwrap();
    assert_eq!(mounted.name(), "ShopRoot");
    assert_eq!(
        app.dispatch("/billing/invoices/detail/", &Params::new()).unwrap(),
        "shop home"
    );
    assert_eq!(
        app.plug_url("shop", "list", &[]).unwrap(),
        "/billing/invoices/detail/list"
    );
}

#[test]
fn test_mount_on_missing_route_fails() {
    let mut configurator = configurator(HostConfig::default(), ShopApp::new());
    configurator
        .plug("shop", PlugOptions::new().with_appid("missing.detail"))
        .unwrap();

    let err = configurator.make_app(live_app()).err().unwrap();
    assert!(matches!(err, Error::WiringFailure { .. }));

    assert_eq!(configurator.diagnostics().errors().count(), 1);
    let registry = configurator.registry().unwrap().read();
    assert!(matches!(registry.slot("shop"), Some(ModuleSlot::Failed(_))));
    assert!(registry.plugged().is_empty());
}

#[test]
fn test_blocked_controllers() {
    let mut configurator = configurator(HostConfig::default(), ShopApp::new());
    configurator
        .plug("shop", PlugOptions::new().block_controller("purge"))
        .unwrap();
    configurator.block_controller("/shop", "list");

    let app = configurator.make_app(live_app()).unwrap();
    assert_eq!(app.dispatch("/shop/", &Params::new()).unwrap(), "shop home");
    assert!(matches!(
        app.dispatch("/shop/purge", &Params::new()).unwrap_err(),
        Error::NotFound(_)
    ));
    assert!(matches!(
        app.dispatch("/shop/list", &Params::new()).unwrap_err(),
        Error::NotFound(_)
    ));
}

#[test]
fn test_make_app_twice_mounts_on_each_root() {
    let mut configurator = configurator(HostConfig::default(), ShopApp::new());
    configurator.plug("shop", PlugOptions::new()).unwrap();

    let first = configurator.make_app(live_app()).unwrap();
    let second = configurator.make_app(live_app()).unwrap();
    assert_eq!(first.dispatch("/shop/", &Params::new()).unwrap(), "shop home");
    assert_eq!(second.dispatch("/shop/", &Params::new()).unwrap(), "shop home");
    assert_eq!(second.plugged(), vec!["shop".to_string()]);
}

// ============================================================================
// Models
// ============================================================================

#[test]
fn test_rename_tables_and_global_models() {
    let shop = ShopApp::new();
    let init_calls = Arc::clone(&shop.init_calls);
    let mut configurator = configurator(HostConfig::default(), shop);
    configurator.set_session(Arc::new(String::from("db-session")));
    configurator
        .plug(
            "shop",
            PlugOptions::new().rename_tables(true).global_models(true),
        )
        .unwrap();

    let app = configurator.make_app(live_app()).unwrap();
    let model = app.model().unwrap().read();
    assert!(model.metadata.contains("shop_orders"));
    assert!(!model.metadata.contains("orders"));
    assert_eq!(model.metadata.len(), 1);
    assert_eq!(
        model.entity("Order").unwrap().tablename.as_deref(),
        Some("shop_orders")
    );
    assert!(model.entity("OrderView").is_none());
    assert_eq!(init_calls.load(Ordering::SeqCst), 1);

    let record = app.registry().read().module("shop").unwrap();
    let plugged_model = record.model.as_ref().unwrap();
    assert_eq!(
        plugged_model.class("Order").unwrap().storage_name(),
        Some("shop_orders")
    );
}

#[test]
fn test_proxies_are_configured() {
    let mut configurator = configurator(HostConfig::default(), ShopApp::new());
    configurator.set_session(Arc::new(String::from("db-session")));
    configurator.plug("shop", PlugOptions::new()).unwrap();
    configurator.make_app(live_app()).unwrap();

    let host = configurator.host();
    assert!(host.app_model.is_configured());
    assert_eq!(
        host.session_proxy.downcast::<String>().unwrap().as_str(),
        "db-session"
    );
}

// ============================================================================
// Bootstrap
// ============================================================================

#[test]
fn test_bootstrap_is_idempotent() {
    let host_runs = Arc::new(AtomicUsize::new(0));
    let mut configurator = configurator(HostConfig::default(), ShopApp::new());
    let counter = Arc::clone(&host_runs);
    configurator.set_bootstrap(Arc::new(move |_args: &BootstrapArgs| -> graft_core::Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));
    configurator.plug("shop", PlugOptions::new()).unwrap();

    let app = configurator.make_app(live_app()).unwrap();
    let args = app.bootstrap_args("setup-app");

    let first = app.run_bootstrap(&args).unwrap();
    assert!(first.host_ran);
    assert_eq!(first.steps, vec![("shop".to_string(), SeedOutcome::Seeded)]);

    let second = app.run_bootstrap(&args).unwrap();
    assert_eq!(second.conflicts().collect::<Vec<_>>(), vec!["shop"]);
    assert_eq!(host_runs.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Helpers
// ============================================================================

fn host_currency() -> HelperNamespace {
    HelperNamespace::new().with_function("format_currency", |_| Ok(json!("host")))
}

#[test]
fn test_helpers_collision_keeps_host_helper() {
    let mut configurator = configurator(HostConfig::default(), ShopApp::new());
    configurator.set_helpers(host_currency());
    configurator
        .plug("shop", PlugOptions::new().global_helpers(true))
        .unwrap();

    let app = configurator.make_app(live_app()).unwrap();
    let helpers = app.helpers().unwrap();
    assert_eq!(helpers.call("format_currency", &[json!(5)]).unwrap(), json!("host"));
    assert_eq!(
        helpers.call("shop.format_currency", &[json!(5)]).unwrap(),
        json!("EUR 5")
    );
    let collisions = configurator
        .diagnostics()
        .warnings()
        .filter(|d| d.message.contains("format_currency"))
        .count();
    assert_eq!(collisions, 1);
}

#[test]
fn test_helpers_collision_overwrite() {
    let config = HostConfig::default().with_helpers_collision(CollisionPolicy::Overwrite);
    let mut configurator = configurator(config, ShopApp::new());
    configurator.set_helpers(host_currency());
    configurator
        .plug("shop", PlugOptions::new().global_helpers(true))
        .unwrap();

    let app = configurator.make_app(live_app()).unwrap();
    assert_eq!(
        app.helpers().unwrap().call("format_currency", &[json!(5)]).unwrap(),
        json!("EUR 5")
    );
}

#[test]
fn test_plug_url_helper() {
    let mut configurator = configurator(HostConfig::default(), ShopApp::new());
    configurator.plug("shop", PlugOptions::new()).unwrap();

    let app = configurator.make_app(live_app()).unwrap();
    let url = app
        .helpers()
        .unwrap()
        .call("plug_url", &[json!("shop"), json!("/cart")])
        .unwrap();
    assert_eq!(url, json!("/shop/cart"));
}

// ============================================================================
// Templates / partials
// ============================================================================

#[test]
fn test_template_patches_from_pluggable() {
    let shop = ShopApp {
        patches: Some(
            r##"<patches>
                <patch template="home.html">
                    <content selector="#sidebar" template="bold.html"/>
                </patch>
            </patches>"##
                .into(),
        ),
        ..ShopApp::new()
    };
    let mut configurator = configurator(HostConfig::default(), shop);
    configurator.register_engine(engine());
    configurator.plug("shop", PlugOptions::new()).unwrap();

    let app = configurator.make_app(live_app()).unwrap();
    let html = app.render("home.html", vars(json!({"label": "X"}))).unwrap();
    assert_eq!(html, r#"<div id="sidebar"><b>X</b></div>"#);
}

#[test]
fn test_replace_template_on_dispatch() {
    let mut configurator = configurator(HostConfig::default(), ShopApp::new());
    configurator.register_engine(engine());
    configurator.plug("shop", PlugOptions::new()).unwrap();

    let app = configurator.make_app(live_app()).unwrap();
    assert_eq!(app.dispatch("/shop/list", &Params::new()).unwrap(), "<p>3 orders</p>");

    let mut configurator = self::configurator(HostConfig::default(), ShopApp::new());
    configurator.register_engine(engine());
    configurator.replace_template("shop/list.html", "host/list.html");
    configurator.plug("shop", PlugOptions::new()).unwrap();

    let app = configurator.make_app(live_app()).unwrap();
    assert_eq!(app.dispatch("/shop/list", &Params::new()).unwrap(), "<ul>3</ul>");
}

#[test]
fn test_call_partial() {
    let mut configurator = configurator(HostConfig::default(), ShopApp::new());
    configurator.register_engine(engine());
    configurator.plug("shop", PlugOptions::new()).unwrap();

    let app = configurator.make_app(live_app()).unwrap();
    let params = vars(json!({"count": 2}));
    assert_eq!(
        app.call_partial("shop.partials.cart:summary", &params).unwrap(),
        "<span>2</span>"
    );
    assert_eq!(
        app.call_partial("shop.controllers.RootController:index", &Params::new())
            .unwrap(),
        "shop home"
    );

    let via_helper = app
        .helpers()
        .unwrap()
        .call(
            "call_partial",
            &[json!("shop.partials.cart:summary"), json!({"count": 4})],
        )
        .unwrap();
    assert_eq!(via_helper, json!("<span>4</span>"));

    assert!(matches!(
        app.call_partial("shop.partials.missing:summary", &Params::new())
            .unwrap_err(),
        Error::PartialResolution(_)
    ));
    assert!(matches!(
        app.call_partial("blog.partials.cart:summary", &Params::new())
            .unwrap_err(),
        Error::PartialResolution(_)
    ));
}

// ============================================================================
// Failure handling
// ============================================================================

#[test]
fn test_wiring_failure_aborts_startup() {
    let shop = ShopApp {
        patches: Some(r#"<patches><patch><content selector="p"/></patch></patches>"#.into()),
        ..ShopApp::new()
    };
    let mut configurator = configurator(HostConfig::default(), shop);
    configurator.plug("shop", PlugOptions::new()).unwrap();

    let err = configurator.make_app(live_app()).err().unwrap();
    match err {
        Error::StartupAborted(message) => assert!(message.contains("shop failed")),
        other => panic!("unexpected error: {}", other),
    }

    assert_eq!(configurator.diagnostics().errors().count(), 1);
    let registry = configurator.registry().unwrap().read();
    assert!(matches!(registry.slot("shop"), Some(ModuleSlot::Failed(_))));
}

// ============================================================================
// Statics
// ============================================================================

fn statics_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("img")).unwrap();
    std::fs::write(dir.path().join("img/logo.png"), b"PNG").unwrap();
    dir
}

async fn get(app: &graft_core::PluggedApp, uri: &str) -> Response {
    let request = http::Request::get(uri).body(Vec::new()).unwrap();
    app.call(request).await.unwrap()
}

#[tokio::test]
async fn test_statics_are_served_under_prefix() {
    let dir = statics_dir();
    let shop = ShopApp {
        public_dir: Some(dir.path().to_path_buf()),
        ..ShopApp::new()
    };
    let mut configurator = configurator(HostConfig::default(), shop);
    configurator.plug("shop", PlugOptions::new()).unwrap();
    let app = configurator.make_app(live_app()).unwrap();

    let response = get(&app, "/_pluggable/shop/img/logo.png?v=1").await;
    assert_eq!(response.status(), http::StatusCode::OK);
    assert_eq!(response.headers()[http::header::CONTENT_TYPE], "image/png");
    assert_eq!(response.body().as_slice(), b"PNG");

    let missing = get(&app, "/_pluggable/shop/img/none.png").await;
    assert_eq!(missing.status(), http::StatusCode::NOT_FOUND);

    let unknown = get(&app, "/_pluggable/blog/img/logo.png").await;
    assert_eq!(unknown.body().as_slice(), b"host");

    let other = get(&app, "/shop/img/logo.png").await;
    assert_eq!(other.body().as_slice(), b"host");
}

#[tokio::test]
async fn test_statics_fall_back_to_module_name() {
    let dir = statics_dir();
    let shop = ShopApp {
        public_dir: Some(dir.path().to_path_buf()),
        ..ShopApp::new()
    };
    let mut configurator = configurator(HostConfig::default(), shop);
    configurator
        .plug("shop", PlugOptions::new().with_appid("store"))
        .unwrap();
    let app = configurator.make_app(live_app()).unwrap();

    let by_appid = get(&app, "/_pluggable/store/img/logo.png").await;
    assert_eq!(by_appid.body().as_slice(), b"PNG");
    let by_name = get(&app, "/_pluggable/shop/img/logo.png").await;
    assert_eq!(by_name.body().as_slice(), b"PNG");
}

// ============================================================================
// i18n
// ============================================================================

#[test]
fn test_translations_fall_back_to_pluggable_catalog() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("fr.json"),
        r#"{"Cart": "Panier", "Hello": "Salut"}"#,
    )
    .unwrap();

    let mut config = HostConfig::default().with_i18n(true);
    config.lang = Some("fr".into());
    let shop = ShopApp {
        i18n_dir: Some(dir.path().to_path_buf()),
        ..ShopApp::new()
    };
    let mut configurator = configurator(config, shop);
    configurator.add_host_catalog(
        "fr",
        Catalog::new().with_message("Hello", Translation::Single("Bonjour".into())),
    );
    configurator.plug("shop", PlugOptions::new()).unwrap();

    let app = configurator.make_app(live_app()).unwrap();
    let translator = app.translator().unwrap();
    assert_eq!(translator.ugettext("shop", "Hello"), "Bonjour");
    assert_eq!(translator.ugettext("shop", "Cart"), "Panier");
    assert_eq!(translator.ugettext("shop", "Checkout"), "Checkout");
}
