use http::Method;
use nubes::config::AppConfig;
use nubes::ids::{RequestId, REQUEST_ID_HEADER};
use nubes::meta::load_manifest;
use nubes::pipeline::Outcome;
use nubes::registry::MethodTable;
use nubes::server::Request;
use nubes::services::PaginationState;
use nubes::{Application, ConfigError};
use serde_json::json;

mod common;
use common::fixtures::get;
use common::temp_files::{cleanup_temp_files, create_temp_yaml};

const MANIFEST: &str = r#"
controllers:
  - name: Resource
    annotations: [Paginated]
    methods:
      - name: stamp
        filter: { direction: after, priority: 10 }
  - name: Users
    base_path: /users
    extends: Resource
    methods:
      - name: list
        route: { path: / }
      - name: show
        route: { path: "/{name}" }
        params:
          - { name: name, kind: path, required: true }
      - name: create
        route: { method: post, path: / }
        params:
          - { name: user, kind: body, type: json, required: true }
"#;

fn methods() -> MethodTable {
    MethodTable::new()
        .filter("Resource", "stamp", |ctx| {
            ctx.response.set_header("X-Stamp", "users".to_string());
            Outcome::Continue
        })
        .handler("Users", "list", |ctx, _| {
            if let Some(state) = PaginationState::from_context_mut(ctx) {
                state.set_total_items(3);
            }
            ctx.response.set_json(json!(["ada", "grace", "linus"]));
            Outcome::Continue
        })
        .handler("Users", "show", |ctx, args| {
            ctx.response.set_json(json!({ "name": args[0] }));
            Outcome::Continue
        })
        .handler("Users", "create", |ctx, args| {
            ctx.response.status = 201;
            ctx.response.set_json(args[0].clone());
            Outcome::Continue
        })
}

fn app() -> Application {
    let manifest = create_temp_yaml(MANIFEST);
    let config = create_temp_yaml("pagination:\n  default_per_page: 2\n");
    let metadata = load_manifest(&manifest).unwrap();
    let app = Application::builder()
        .config(AppConfig::load(&config).unwrap())
        .metadata(metadata)
        .methods(methods())
        .build()
        .unwrap();
    cleanup_temp_files(&[manifest, config]);
    app
}

#[test]
fn test_manifest_application_end_to_end() {
    let app = app();
    assert_eq!(app.router().len(), 3);

    let res = app.handle(get("/users"));
    assert_eq!(res.status, 200);
    assert_eq!(res.get_header("X-Stamp"), Some("users"));
    assert_eq!(
        res.get_header("Link"),
        Some(
            "<http://localhost/users?page=2&perPage=2>; rel=\"last\", \
             <http://localhost/users?page=2&perPage=2>; rel=\"next\""
        )
    );

    let res = app.handle(get("/users/ada%20lovelace/"));
    assert_eq!(res.json_body(), Some(&json!({ "name": "ada lovelace" })));

    let res = app.handle(
        Request::builder(Method::POST, "/users")
            .json(json!({ "name": "grace" }))
            .build(),
    );
    assert_eq!(res.status, 201);
    assert_eq!(res.json_body(), Some(&json!({ "name": "grace" })));

    let res = app.handle(Request::builder(Method::POST, "/users").build());
    assert_eq!(res.status, 400);
}

#[test]
fn test_unmatched_request_gets_404() {
    let app = app();
    let res = app.handle(Request::builder(Method::DELETE, "/users").build());
    assert_eq!(res.status, 404);
    assert_eq!(
        res.json_body(),
        Some(&json!({ "error": "No route for DELETE /users", "status": 404 }))
    );
    assert!(res.get_header(REQUEST_ID_HEADER).is_some());
}

#[test]
fn test_request_id_is_echoed_or_minted() {
    let app = app();
    let upstream = RequestId::new().to_string();

    let res = app.handle(
        Request::builder(Method::GET, "/users")
            .header("X-Request-Id", upstream.clone())
            .build(),
    );
    assert_eq!(res.get_header(REQUEST_ID_HEADER), Some(upstream.as_str()));

    let res = app.handle(
        Request::builder(Method::GET, "/users")
            .header("X-Request-Id", "not-a-ulid")
            .build(),
    );
    let minted = res.get_header(REQUEST_ID_HEADER).unwrap();
    assert_ne!(minted, "not-a-ulid");
    assert!(minted.parse::<RequestId>().is_ok());
}

#[test]
fn test_invalid_config_blocks_build() {
    let mut config = AppConfig::default();
    config.rate_limit.status = 400;
    let err = Application::builder().config(config).build().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { key: "rate_limit.status", .. }));
}

#[test]
fn test_empty_application_routes_nothing() {
    let app = Application::builder().build().unwrap();
    assert!(app.router().is_empty());
    assert_eq!(app.handle(get("/")).status, 404);
}
