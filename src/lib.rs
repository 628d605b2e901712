//! # nubes
//!
//! **nubes** is the core of a declarative web-controller framework. Controllers are described by
//! metadata (routes, filters, authentication, parameter kinds and class-level annotations) and the
//! framework compiles that metadata once, at startup, into immutable per-route pipelines.
//!
//! ## Overview
//!
//! An application supplies three things:
//!
//! 1. A [`MetadataProvider`](meta::MetadataProvider), usually a controller manifest loaded with
//!    [`meta::load_manifest`] or built in code with [`meta::StaticMetadata`]
//! 2. A [`MethodTable`](registry::MethodTable) holding the handler and filter implementations
//! 3. Optionally an [`AuthProvider`](security::AuthProvider), extra
//!    [`Processor`](processor::Processor)s and extra [`ParamResolver`](params::ParamResolver)s
//!
//! [`Application::builder`](app::Application::builder) validates all of it and fails fast with a
//! [`ConfigError`](error::ConfigError). Once built, [`Application::handle`](app::Application::handle)
//! is the only request entry point; the HTTP transport lives outside this crate.
//!
//! ## Architecture
//!
//! - **[`meta`]** - Controller descriptors and the manifest loader
//! - **[`compiler`]** - Two-phase route compilation: plan from metadata, then bind implementations
//! - **[`filter`]** - Filter descriptors and the ordered, override-aware filter set
//! - **[`params`]** - Parameter-kind resolvers and value coercion
//! - **[`security`]** - Authentication methods, guards and the auth selector
//! - **[`pipeline`]** - Per-request context and the stage state machine
//! - **[`processor`]** - Class-level processors keyed by annotation
//! - **[`services`]** - Sliding-window rate limiting and pagination
//! - **[`router`]** - Method + path matching over compiled routes
//! - **[`server`]** - Request and response types exchanged with the transport
//! - **[`config`]**, **[`runtime_config`]**, **[`logging`]** - File, environment and logging setup
//! - **[`cli`]** - The `nubes` inspection tool
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Transport
//!     participant App as Application
//!     participant Router
//!     participant Exec as Executor
//!     participant Route as Compiled Route
//!     participant EH as ErrorHandler
//!
//!     Transport->>App: handle(Request)
//!     App->>Router: route(method, path)
//!     alt no match
//!         App->>EH: handle(ctx, 404)
//!     else match
//!         Router-->>App: RouteMatch
//!         App->>Exec: execute(route, ctx)
//!         Exec->>Route: pre-process (processors)
//!         Exec->>Route: before filters
//!         Exec->>Route: auth guard
//!         Exec->>Route: resolve params
//!         Exec->>Route: handler
//!         Exec->>Route: after filters
//!         Exec->>Route: post-process
//!         opt a stage fails
//!             Exec->>EH: handle(ctx, status, message)
//!         end
//!     end
//!     App-->>Transport: Response
//! ```
//!
//! ### Key Architectural Patterns
//!
//! - **Compile once**: inheritance, filter order, auth and parameter kinds are resolved at
//!   startup. Request handling never inspects metadata.
//! - **Explicit outcomes**: every stage returns an [`Outcome`](pipeline::Outcome) of
//!   `Continue`, `Halt` or `Fail`; there is no unwinding between stages.
//! - **Shared state at the edges**: routes are immutable and shared by `Arc`; the rate limiter is
//!   the only mutable state shared between requests and locks per client.
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use nubes::meta::{ControllerDescriptor, MethodDescriptor, ParamDescriptor, StaticMetadata, ValueType};
//! use nubes::pipeline::Outcome;
//! use nubes::registry::MethodTable;
//! use nubes::server::Request;
//! use nubes::Application;
//!
//! let meta = StaticMetadata::new(vec![ControllerDescriptor::new("Items")
//!     .base_path("/items")
//!     .method(
//!         MethodDescriptor::new("show")
//!             .route("GET", "/:id")
//!             .param(ParamDescriptor::new("id", "path").typed(ValueType::Integer).required()),
//!     )]);
//! let methods = MethodTable::new().handler("Items", "show", |ctx, args| {
//!     ctx.response.set_json(serde_json::json!({ "id": args[0] }));
//!     Outcome::Continue
//! });
//!
//! let app = Application::builder().metadata(meta).methods(methods).build().unwrap();
//! let res = app.handle(Request::builder(Method::GET, "/items/7").build());
//! assert_eq!(res.json_body(), Some(&serde_json::json!({ "id": 7 })));
//! ```
//!
//! ## Configuration
//!
//! [`AppConfig`](config::AppConfig) is read from YAML or JSON; every section is optional.
//! `NUBES_*` environment variables ([`runtime_config`]) override individual values and
//! `NUBES_LOG_*` variables drive [`logging`].
//!
//! ```yaml
//! rate_limit:
//!   max_requests: 60
//!   window_secs: 60
//! pagination:
//!   default_per_page: 30
//!   max_per_page: 100
//! auth:
//!   realm: nubes
//! ```

pub mod app;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod filter;
pub mod ids;
pub mod logging;
pub mod meta;
pub mod params;
pub mod pipeline;
pub mod processor;
pub mod registry;
pub mod router;
pub mod runtime_config;
pub mod security;
pub mod server;
pub mod services;

pub use app::{Application, ApplicationBuilder};
pub use compiler::{compile, Bindings, Route, RouteCompiler, RoutePlan};
pub use config::AppConfig;
pub use error::{ConfigError, ErrorKind, PipelineError};
pub use meta::{load_manifest, ControllerDescriptor, MetadataProvider, StaticMetadata};
pub use pipeline::{Outcome, RequestContext};
pub use registry::MethodTable;
pub use server::{Request, Response};
