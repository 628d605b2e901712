use base64::{engine::general_purpose, Engine as _};
use http::Method;
use nubes::config::AppConfig;
use nubes::meta::{AuthAnnotation, ControllerDescriptor, MethodDescriptor, ParamDescriptor, StaticMetadata, ValueType};
use nubes::pipeline::Outcome;
use nubes::registry::MethodTable;
use nubes::server::{Request, RequestBuilder};
use nubes::Application;
use serde_json::json;
use std::sync::Arc;

mod common;
use common::fixtures::{get, StaticUsers, Trace};

fn metadata() -> StaticMetadata {
    let principal = || ParamDescriptor::new("principal", "context").typed(ValueType::Json);
    StaticMetadata::new(vec![
        ControllerDescriptor::new("Secure")
            .base_path("/secure")
            .auth(AuthAnnotation::new("BASIC"))
            .method(MethodDescriptor::new("audit").before_filter(1))
            .method(MethodDescriptor::new("me").route("GET", "/me").param(principal()))
            .method(
                MethodDescriptor::new("feed")
                    .route("GET", "/feed")
                    .auth(AuthAnnotation::new("api_token"))
                    .param(principal()),
            )
            .method(
                MethodDescriptor::new("token")
                    .route("GET", "/token")
                    .auth(AuthAnnotation::new("jwt"))
                    .param(principal()),
            ),
        ControllerDescriptor::new("Portal")
            .base_path("/portal")
            .auth(AuthAnnotation::redirect("/login"))
            .method(MethodDescriptor::new("home").route("GET", "/").param(principal())),
        ControllerDescriptor::new("Public")
            .base_path("/public")
            .method(MethodDescriptor::new("hello").route("GET", "/")),
    ])
}

fn echo_principal(ctx: &mut nubes::RequestContext, args: &[serde_json::Value]) -> Outcome {
    ctx.response.set_json(args[0].clone());
    Outcome::Continue
}

fn methods(trace: &Trace) -> MethodTable {
    MethodTable::new()
        .filter("Secure", "audit", trace.filter("audit"))
        .handler("Secure", "me", echo_principal)
        .handler("Secure", "feed", echo_principal)
        .handler("Secure", "token", echo_principal)
        .handler("Portal", "home", echo_principal)
        .handler("Public", "hello", |ctx, _| {
            ctx.response.write("hello");
            Outcome::Continue
        })
}

fn app(trace: &Trace) -> Application {
    let mut config = AppConfig::default();
    config.auth.realm = "staff".to_string();
    Application::builder()
        .config(config)
        .metadata(metadata())
        .methods(methods(trace))
        .auth_provider(Arc::new(StaticUsers))
        .build()
        .unwrap()
}

fn basic(user: &str, password: &str) -> String {
    format!(
        "Basic {}",
        general_purpose::STANDARD.encode(format!("{user}:{password}"))
    )
}

fn request(target: &str) -> RequestBuilder {
    Request::builder(Method::GET, target)
}

#[test]
fn test_basic_auth() {
    let trace = Trace::default();
    let app = app(&trace);

    let res = app.handle(request("/secure/me").header("Authorization", basic("alice", "secret")).build());
    assert_eq!(res.status, 200);
    assert_eq!(res.json_body(), Some(&json!({ "user": "alice" })));

    let res = app.handle(request("/secure/me").header("Authorization", basic("alice", "nope")).build());
    assert_eq!(res.status, 401);
    assert_eq!(res.get_header("WWW-Authenticate"), Some("Basic realm=\"staff\""));

    let res = app.handle(get("/secure/me"));
    assert_eq!(res.status, 401);

    // Before filters run ahead of authentication.
    assert_eq!(trace.entries(), vec!["audit", "audit", "audit"]);
}

#[test]
fn test_method_level_api_token_overrides_class_auth() {
    let trace = Trace::default();
    let app = app(&trace);

    let res = app.handle(request("/secure/feed").header("X-Api-Token", "key-1").build());
    assert_eq!(res.status, 200);
    assert_eq!(res.json_body(), Some(&json!({ "user": "service" })));

    let res = app.handle(get("/secure/feed?api_token=key-1"));
    assert_eq!(res.status, 200);

    // Basic credentials are not accepted on an API-token route.
    let res = app.handle(request("/secure/feed").header("Authorization", basic("alice", "secret")).build());
    assert_eq!(res.status, 401);
    assert!(res.get_header("WWW-Authenticate").is_none());
}

#[test]
fn test_bearer_auth() {
    let trace = Trace::default();
    let app = app(&trace);

    let res = app.handle(request("/secure/token").header("Authorization", "Bearer good-token").build());
    assert_eq!(res.json_body(), Some(&json!({ "user": "jwt" })));

    let res = app.handle(request("/secure/token").header("Authorization", "Bearer bad").build());
    assert_eq!(res.status, 401);
    assert_eq!(res.get_header("WWW-Authenticate"), Some("Bearer"));
}

#[test]
fn test_redirect_auth() {
    let trace = Trace::default();
    let app = app(&trace);

    let res = app.handle(get("/portal"));
    assert_eq!(res.status, 302);
    assert_eq!(res.get_header("Location"), Some("/login"));
    assert!(res.json_body().is_none());

    let res = app.handle(request("/portal").header("Cookie", "theme=dark; nubes.session=sess-1").build());
    assert_eq!(res.status, 200);
    assert_eq!(res.json_body(), Some(&json!({ "user": "browser" })));
}

#[test]
fn test_open_routes_and_missing_provider() {
    let trace = Trace::default();
    let app = app(&trace);
    assert_eq!(app.handle(get("/public")).text(), Some("hello"));

    // Without a provider every declaration compiles to an open route.
    let open = Application::builder()
        .metadata(metadata())
        .methods(methods(&trace))
        .build()
        .unwrap();
    let res = open.handle(get("/secure/me"));
    assert_eq!(res.status, 200);
    assert_eq!(res.json_body(), Some(&serde_json::Value::Null));
    assert_eq!(open.handle(get("/portal")).status, 200);
}

#[test]
fn test_redirect_without_target_blocks_build() {
    let meta = StaticMetadata::new(vec![ControllerDescriptor::new("Portal")
        .base_path("/portal")
        .auth(AuthAnnotation::redirect("  "))
        .method(MethodDescriptor::new("home").route("GET", "/"))]);
    let err = Application::builder()
        .metadata(meta)
        .methods(MethodTable::new().handler("Portal", "home", |_, _| Outcome::Continue))
        .auth_provider(Arc::new(StaticUsers))
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("redirect"), "{err}");
}
