use http::Method;
use nubes::compiler::{compile, Bindings};
use nubes::error::PipelineError;
use nubes::ids::RequestId;
use nubes::meta::{ControllerDescriptor, MethodDescriptor, ParamDescriptor, StaticMetadata, ValueType};
use nubes::pipeline::{ErrorHandler, Executor, Outcome, RequestContext, Stage};
use nubes::processor::Processor;
use nubes::registry::MethodTable;
use nubes::server::{Body, ParamVec, Request};
use nubes::Application;
use serde_json::json;
use std::sync::Arc;

mod common;
use common::fixtures::{get, writer, Trace};

struct Bracket;

impl Processor for Bracket {
    fn name(&self) -> &str {
        "bracket"
    }

    fn pre_handle(&self, ctx: &mut RequestContext) -> Outcome {
        ctx.response.write("pre;");
        Outcome::Continue
    }

    fn post_handle(&self, ctx: &mut RequestContext) -> Outcome {
        ctx.response.write("post;");
        Outcome::Continue
    }
}

struct TraceProcessor(Trace);

impl Processor for TraceProcessor {
    fn name(&self) -> &str {
        "trace"
    }

    fn pre_handle(&self, _: &mut RequestContext) -> Outcome {
        self.0.push("pre");
        Outcome::Continue
    }

    fn post_handle(&self, _: &mut RequestContext) -> Outcome {
        self.0.push("post");
        Outcome::Continue
    }
}

fn layered_metadata() -> StaticMetadata {
    StaticMetadata::new(vec![
        ControllerDescriptor::new("Base")
            .annotation("Bracket")
            .method(MethodDescriptor::new("before1").before_filter(1))
            .method(MethodDescriptor::new("after1").after_filter(1)),
        ControllerDescriptor::new("Items")
            .extends("Base")
            .base_path("/items")
            .method(MethodDescriptor::new("before3").before_filter(5))
            .method(MethodDescriptor::new("before2").before_filter(1))
            .method(MethodDescriptor::new("after3").after_filter(3))
            .method(MethodDescriptor::new("after2").after_filter(1))
            .method(MethodDescriptor::new("list").route("GET", "/")),
    ])
}

#[test]
fn test_stages_run_in_order_across_inheritance() {
    let methods = MethodTable::new()
        .filter("Base", "before1", writer("before1"))
        .filter("Base", "after1", writer("after1"))
        .filter("Items", "before2", writer("before2"))
        .filter("Items", "before3", writer("before3"))
        .filter("Items", "after2", writer("after2"))
        .filter("Items", "after3", writer("after3"))
        .handler("Items", "list", |ctx, _| {
            ctx.response.write("handler;");
            Outcome::Continue
        });

    let app = Application::builder()
        .metadata(layered_metadata())
        .methods(methods)
        .processor("Bracket", Arc::new(Bracket))
        .build()
        .unwrap();

    for _ in 0..3 {
        let res = app.handle(get("/items"));
        assert_eq!(res.status, 200);
        assert_eq!(
            res.text(),
            Some("pre;before1;before2;before3;handler;after1;after2;after3;post;")
        );
    }
}

#[test]
fn test_halt_skips_remaining_stages() {
    let trace = Trace::default();
    let methods = MethodTable::new()
        .filter("Base", "before1", |ctx: &mut RequestContext| {
            ctx.response.status = 403;
            ctx.response.write("denied");
            Outcome::Halt
        })
        .filter("Base", "after1", trace.filter("after1"))
        .filter("Items", "before2", trace.filter("before2"))
        .filter("Items", "before3", trace.filter("before3"))
        .filter("Items", "after2", trace.filter("after2"))
        .filter("Items", "after3", trace.filter("after3"))
        .handler("Items", "list", {
            let trace = trace.clone();
            move |_, _| {
                trace.push("handler");
                Outcome::Continue
            }
        });

    let app = Application::builder()
        .metadata(layered_metadata())
        .methods(methods)
        .processor("Bracket", Arc::new(TraceProcessor(trace.clone())))
        .build()
        .unwrap();

    let res = app.handle(get("/items"));
    assert_eq!(res.status, 403);
    assert_eq!(res.text(), Some("denied"));
    assert_eq!(trace.entries(), vec!["pre"]);
}

#[test]
fn test_before_phase_failure_runs_cleanup_without_masking() {
    let trace = Trace::default();
    let methods = MethodTable::new()
        .filter("Base", "before1", trace.filter("before1"))
        .filter("Items", "before2", |_: &mut RequestContext| {
            Outcome::Fail(PipelineError::bad_request("bad input"))
        })
        .filter("Items", "before3", trace.filter("before3"))
        .filter("Base", "after1", {
            let trace = trace.clone();
            move |_: &mut RequestContext| {
                trace.push("after1");
                Outcome::Fail(PipelineError::handler("cleanup broke"))
            }
        })
        .filter("Items", "after2", trace.filter("after2"))
        .filter("Items", "after3", trace.filter("after3"))
        .handler("Items", "list", {
            let trace = trace.clone();
            move |_, _| {
                trace.push("handler");
                Outcome::Continue
            }
        });

    let app = Application::builder()
        .metadata(layered_metadata())
        .methods(methods)
        .processor("Bracket", Arc::new(TraceProcessor(trace.clone())))
        .build()
        .unwrap();

    let res = app.handle(get("/items"));
    assert_eq!(res.status, 400);
    assert_eq!(
        res.json_body(),
        Some(&json!({ "error": "bad input", "status": 400 }))
    );
    // The failing after filter stops its own list but post-processing still runs.
    assert_eq!(trace.entries(), vec!["pre", "before1", "after1", "post"]);
}

#[test]
fn test_cleanup_cannot_overwrite_error_response() {
    let methods = MethodTable::new()
        .filter("Base", "before1", writer("before1"))
        .filter("Items", "before2", |_: &mut RequestContext| {
            Outcome::Fail(PipelineError::bad_request("bad input"))
        })
        .filter("Items", "before3", writer("before3"))
        .filter("Base", "after1", |ctx: &mut RequestContext| {
            ctx.response.status = 200;
            ctx.response.write("done");
            Outcome::Continue
        })
        .filter("Items", "after2", writer("after2"))
        .filter("Items", "after3", writer("after3"))
        .handler("Items", "list", |_, _| Outcome::Continue);

    let app = Application::builder()
        .metadata(layered_metadata())
        .methods(methods)
        .processor("Bracket", Arc::new(Bracket))
        .build()
        .unwrap();

    let res = app.handle(get("/items"));
    assert_eq!(res.status, 400);
    assert_eq!(
        res.json_body(),
        Some(&json!({ "error": "bad input", "status": 400 }))
    );
}

#[test]
fn test_handler_failure_skips_after_filters() {
    let trace = Trace::default();
    let methods = MethodTable::new()
        .filter("Base", "before1", trace.filter("before1"))
        .filter("Items", "before2", trace.filter("before2"))
        .filter("Items", "before3", trace.filter("before3"))
        .filter("Base", "after1", trace.filter("after1"))
        .filter("Items", "after2", trace.filter("after2"))
        .filter("Items", "after3", trace.filter("after3"))
        .handler("Items", "list", |_, _| Outcome::Fail(PipelineError::handler("boom")));

    let app = Application::builder()
        .metadata(layered_metadata())
        .methods(methods)
        .processor("Bracket", Arc::new(TraceProcessor(trace.clone())))
        .build()
        .unwrap();

    let res = app.handle(get("/items"));
    assert_eq!(res.status, 500);
    assert_eq!(res.json_body(), Some(&json!({ "error": "boom", "status": 500 })));
    assert_eq!(trace.entries(), vec!["pre", "before1", "before2", "before3"]);
}

#[test]
fn test_executor_reports_terminal_stage() {
    let meta = StaticMetadata::new(vec![ControllerDescriptor::new("Items")
        .base_path("/items")
        .method(MethodDescriptor::new("ok").route("GET", "/ok"))
        .method(MethodDescriptor::new("halt").route("GET", "/halt"))
        .method(MethodDescriptor::new("fail").route("GET", "/fail"))]);
    let methods = MethodTable::new()
        .handler("Items", "ok", |_, _| Outcome::Continue)
        .handler("Items", "halt", |_, _| Outcome::Halt)
        .handler("Items", "fail", |_, _| Outcome::Fail(PipelineError::handler("no")));
    let routes = compile(&meta, &Bindings::new(methods)).unwrap();

    let executor = Executor::default();
    let stages: Vec<Stage> = routes
        .iter()
        .map(|route| {
            let request = Request::builder(Method::GET, &route.path).build();
            let mut ctx = RequestContext::new(RequestId::new(), request, ParamVec::new());
            let stage = executor.execute(route, &mut ctx);
            assert_eq!(&*ctx.handler, &*route.method);
            stage
        })
        .collect();
    assert_eq!(stages, vec![Stage::Done, Stage::Done, Stage::Error]);
}

#[test]
fn test_parameters_resolved_and_coerced() {
    let meta = StaticMetadata::new(vec![ControllerDescriptor::new("Items")
        .base_path("/items")
        .method(
            MethodDescriptor::new("show")
                .route("GET", "/:id")
                .param(ParamDescriptor::new("id", "path").typed(ValueType::Integer).required())
                .param(ParamDescriptor::new("verbose", "query").typed(ValueType::Boolean))
                .param(ParamDescriptor::new("client", "context")),
        )]);
    let trace = Trace::default();
    let methods = MethodTable::new().handler("Items", "show", {
        let trace = trace.clone();
        move |ctx, args| {
            trace.push("handler");
            ctx.response.set_json(json!(args));
            Outcome::Continue
        }
    });
    let app = Application::builder()
        .metadata(meta)
        .methods(methods)
        .build()
        .unwrap();

    let res = app.handle(
        Request::builder(Method::GET, "/items/42?verbose=true")
            .client("10.0.0.7")
            .build(),
    );
    assert_eq!(res.status, 200);
    assert_eq!(res.json_body(), Some(&json!([42, true, "10.0.0.7"])));

    let res = app.handle(get("/items/42"));
    assert_eq!(res.json_body(), Some(&json!([42, null, "unknown"])));

    let res = app.handle(get("/items/forty-two"));
    assert_eq!(res.status, 400);
    assert_eq!(trace.entries(), vec!["handler", "handler"]);
}

struct PlainErrors;

impl ErrorHandler for PlainErrors {
    fn handle(&self, ctx: &mut RequestContext, status: u16, message: &str) {
        ctx.response.status = status;
        ctx.response.body = Body::Text(format!("{status} {message}"));
    }
}

#[test]
fn test_custom_error_handler_shapes_failures() {
    let meta = StaticMetadata::new(vec![ControllerDescriptor::new("Items")
        .base_path("/items")
        .method(MethodDescriptor::new("fail").route("POST", "/"))]);
    let methods = MethodTable::new().handler("Items", "fail", |_, _| {
        Outcome::Fail(PipelineError::handler("database unavailable"))
    });
    let app = Application::builder()
        .metadata(meta)
        .methods(methods)
        .error_handler(Arc::new(PlainErrors))
        .build()
        .unwrap();

    let res = app.handle(Request::builder(Method::POST, "/items").build());
    assert_eq!(res.text(), Some("500 database unavailable"));

    let res = app.handle(get("/missing"));
    assert_eq!(res.text(), Some("404 No route for GET /missing"));
}
