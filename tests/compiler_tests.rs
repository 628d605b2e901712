use nubes::compiler::{compile, Bindings, RouteCompiler};
use nubes::error::ConfigError;
use nubes::meta::{
    AuthAnnotation, ControllerDescriptor, MethodDescriptor, ParamDescriptor, StaticMetadata,
};
use nubes::pipeline::Outcome;
use nubes::processor::Processor;
use nubes::registry::MethodTable;
use nubes::security::{AuthGuard, AuthMethod, AuthSelector};
use std::sync::Arc;

mod common;
use common::fixtures::StaticUsers;

struct Named(&'static str);

impl Processor for Named {
    fn name(&self) -> &str {
        self.0
    }
}

fn filter_names(compiler: &mut RouteCompiler<'_>, controller: &str) -> (Vec<String>, Vec<String>) {
    let plan = compiler.plan_controller(controller).unwrap();
    let names = |list: &[nubes::filter::FilterDescriptor]| {
        list.iter().map(|d| d.method.to_string()).collect::<Vec<_>>()
    };
    (names(plan.filters.before()), names(plan.filters.after()))
}

fn inheritance_fixture() -> StaticMetadata {
    StaticMetadata::new(vec![
        ControllerDescriptor::new("Base")
            .extends("Object")
            .annotation("Paginated")
            .method(MethodDescriptor::new("audit").before_filter(5))
            .method(MethodDescriptor::new("setup").before_filter(1))
            .method(MethodDescriptor::new("finish").after_filter(1)),
        ControllerDescriptor::new("Items")
            .extends("Base")
            .base_path("/items")
            .annotation("Unregistered")
            .annotation("RateLimited")
            .annotation("Paginated")
            .method(MethodDescriptor::new("load").before_filter(1))
            .method(MethodDescriptor::new("audit").before_filter(0))
            .method(MethodDescriptor::new("list").route("GET", "/")),
    ])
}

fn planning_bindings() -> Bindings {
    let mut bindings = Bindings::new(MethodTable::new());
    bindings.processors.register("Paginated", Arc::new(Named("pages")));
    bindings.processors.register("RateLimited", Arc::new(Named("limit")));
    bindings
}

#[test]
fn test_subclass_filters_ordered_by_priority_then_declaration() {
    let meta = inheritance_fixture();
    let bindings = planning_bindings();
    let mut compiler = RouteCompiler::new(&meta, &bindings);

    let (before, after) = filter_names(&mut compiler, "Items");
    // Items::audit overrides Base::audit and moves to priority 0.
    assert_eq!(before, vec!["Items::audit", "Base::setup", "Items::load"]);
    assert_eq!(after, vec!["Base::finish"]);

    let (base_before, _) = filter_names(&mut compiler, "Base");
    assert_eq!(base_before, vec!["Base::setup", "Base::audit"]);
}

#[test]
fn test_processors_inherited_first_and_deduplicated() {
    let meta = inheritance_fixture();
    let bindings = planning_bindings();
    let plans = RouteCompiler::new(&meta, &bindings).plan_all().unwrap();

    assert_eq!(plans.len(), 1);
    let processors: Vec<&str> = plans[0].processors.iter().map(|p| p.as_ref()).collect();
    assert_eq!(processors, vec!["Paginated", "RateLimited"]);
    assert_eq!(plans[0].path, "/items");
}

#[test]
fn test_inheritance_cycle_is_rejected() {
    let meta = StaticMetadata::new(vec![
        ControllerDescriptor::new("A")
            .extends("B")
            .base_path("/a")
            .method(MethodDescriptor::new("get").route("GET", "/")),
        ControllerDescriptor::new("B").extends("A"),
    ]);
    let bindings = Bindings::new(MethodTable::new());
    let err = compile(&meta, &bindings).unwrap_err();
    assert_eq!(
        err,
        ConfigError::InheritanceCycle(vec!["A".into(), "B".into(), "A".into()])
    );
}

#[test]
fn test_unknown_parent_is_rejected() {
    let meta = StaticMetadata::new(vec![ControllerDescriptor::new("A")
        .extends("Missing")
        .base_path("/a")]);
    let err = compile(&meta, &Bindings::new(MethodTable::new())).unwrap_err();
    assert_eq!(err, ConfigError::UnknownController("Missing".into()));
}

#[test]
fn test_missing_handler_and_filter_implementations() {
    let meta = StaticMetadata::new(vec![ControllerDescriptor::new("Items")
        .base_path("/items")
        .method(MethodDescriptor::new("check").before_filter(1))
        .method(MethodDescriptor::new("list").route("GET", "/"))]);

    let only_filter = MethodTable::new().filter("Items", "check", |_| Outcome::Continue);
    let err = compile(&meta, &Bindings::new(only_filter)).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingImplementation { role: "handler", ref method, .. } if method == "list"
    ));

    let only_handler = MethodTable::new().handler("Items", "list", |_, _| Outcome::Continue);
    let err = compile(&meta, &Bindings::new(only_handler)).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingImplementation { role: "filter", ref method, .. } if method == "check"
    ));
}

#[test]
fn test_unresolvable_parameter_kind() {
    let meta = StaticMetadata::new(vec![ControllerDescriptor::new("Items")
        .base_path("/items")
        .method(
            MethodDescriptor::new("list")
                .route("GET", "/")
                .param(ParamDescriptor::new("tenant", "tenant")),
        )]);
    let err = compile(&meta, &Bindings::new(MethodTable::new())).unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnresolvableParameter {
            controller: "Items".into(),
            method: "list".into(),
            param: "tenant".into(),
            kind: "tenant".into(),
        }
    );
}

#[test]
fn test_unknown_context_name_rejected_at_compile_time() {
    let meta = StaticMetadata::new(vec![ControllerDescriptor::new("Items")
        .base_path("/items")
        .method(
            MethodDescriptor::new("list")
                .route("GET", "/")
                .param(ParamDescriptor::new("reqest_id", "context").required()),
        )]);
    let methods = MethodTable::new().handler("Items", "list", |_, _| Outcome::Continue);
    let err = compile(&meta, &Bindings::new(methods)).unwrap_err();
    assert!(
        matches!(
            err,
            ConfigError::InvalidParameter { ref controller, ref method, ref param, .. }
                if controller == "Items" && method == "list" && param == "reqest_id"
        ),
        "{err}"
    );

    let fixed = StaticMetadata::new(vec![ControllerDescriptor::new("Items")
        .base_path("/items")
        .method(
            MethodDescriptor::new("list")
                .route("GET", "/")
                .param(ParamDescriptor::new("request_id", "context").required()),
        )]);
    let methods = MethodTable::new().handler("Items", "list", |_, _| Outcome::Continue);
    assert!(compile(&fixed, &Bindings::new(methods)).is_ok());
}

#[test]
fn test_invalid_verb_and_duplicate_route() {
    let bad_verb = StaticMetadata::new(vec![ControllerDescriptor::new("Items")
        .base_path("/items")
        .method(MethodDescriptor::new("list").route("GE T", "/"))]);
    let err = compile(&bad_verb, &Bindings::new(MethodTable::new())).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidRoute { .. }), "{err}");

    let duplicate = StaticMetadata::new(vec![ControllerDescriptor::new("Items")
        .base_path("/items")
        .method(MethodDescriptor::new("list").route("GET", "/"))
        .method(MethodDescriptor::new("all").route("get", ""))]);
    let err = compile(&duplicate, &Bindings::new(MethodTable::new())).unwrap_err();
    assert!(err.to_string().contains("duplicate route GET /items"), "{err}");
}

#[test]
fn test_redirect_without_target_fails_even_without_provider() {
    let meta = StaticMetadata::new(vec![ControllerDescriptor::new("Admin")
        .base_path("/admin")
        .auth(AuthAnnotation::new("redirect"))
        .method(MethodDescriptor::new("home").route("GET", "/"))]);
    let methods = MethodTable::new().handler("Admin", "home", |_, _| Outcome::Continue);
    let err = compile(&meta, &Bindings::new(methods)).unwrap_err();
    assert_eq!(
        err,
        ConfigError::MissingRedirectTarget {
            location: "Admin".into()
        }
    );
}

#[test]
fn test_unknown_auth_method_fails() {
    let meta = StaticMetadata::new(vec![ControllerDescriptor::new("Admin")
        .base_path("/admin")
        .method(
            MethodDescriptor::new("home")
                .route("GET", "/")
                .auth(AuthAnnotation::new("kerberos")),
        )]);
    let err = compile(&meta, &Bindings::new(MethodTable::new())).unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnsupportedAuthMethod {
            location: "Admin::home".into(),
            method: "kerberos".into()
        }
    );
}

#[test]
fn test_method_auth_overrides_inherited_class_auth() {
    let meta = StaticMetadata::new(vec![
        ControllerDescriptor::new("Secured").auth(AuthAnnotation::new("BASIC")),
        ControllerDescriptor::new("Items")
            .extends("Secured")
            .base_path("/items")
            .method(MethodDescriptor::new("list").route("GET", "/"))
            .method(
                MethodDescriptor::new("feed")
                    .route("GET", "/feed")
                    .auth(AuthAnnotation::new("api-token")),
            ),
    ]);
    let methods = MethodTable::new()
        .handler("Items", "list", |_, _| Outcome::Continue)
        .handler("Items", "feed", |_, _| Outcome::Continue);

    let mut bindings = Bindings::new(methods);
    let plans = RouteCompiler::new(&meta, &bindings).plan_all().unwrap();
    let auth: Vec<_> = plans
        .iter()
        .map(|p| p.auth.as_ref().map(|a| (a.method, a.location.clone())))
        .collect();
    assert_eq!(
        auth,
        vec![
            Some((AuthMethod::Basic, "Secured".to_string())),
            Some((AuthMethod::ApiToken, "Items::feed".to_string())),
        ]
    );

    // Without a provider the routes compile unguarded.
    let routes = compile(&meta, &bindings).unwrap();
    assert!(routes.iter().all(|r| r.auth.is_none()));

    bindings.auth = AuthSelector::new(Some(Arc::new(StaticUsers)), "test");
    let routes = compile(&meta, &bindings).unwrap();
    let methods: Vec<_> = routes
        .iter()
        .map(|r| r.auth.as_ref().map(|g| g.method()))
        .collect();
    assert_eq!(methods, vec![Some(AuthMethod::Basic), Some(AuthMethod::ApiToken)]);
}

#[test]
fn test_routes_share_bound_processors_per_controller() {
    let meta = StaticMetadata::new(vec![ControllerDescriptor::new("Items")
        .base_path("/items")
        .annotation("Paginated")
        .method(MethodDescriptor::new("list").route("GET", "/"))
        .method(MethodDescriptor::new("show").route("GET", "/:id"))]);
    let methods = MethodTable::new()
        .handler("Items", "list", |_, _| Outcome::Continue)
        .handler("Items", "show", |_, _| Outcome::Continue);
    let mut bindings = Bindings::new(methods);
    bindings.processors.register("Paginated", Arc::new(Named("pages")));

    let routes = compile(&meta, &bindings).unwrap();
    assert_eq!(routes.len(), 2);
    assert!(Arc::ptr_eq(&routes[0].processors, &routes[1].processors));
    assert_eq!(routes[1].path, "/items/:id");
}
