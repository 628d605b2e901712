//! # Application
//!
//! Wires configuration, metadata, implementations and services together and
//! exposes the single request entry point a transport calls.
//!
//! ```rust
//! use http::Method;
//! use nubes::app::Application;
//! use nubes::meta::{ControllerDescriptor, MethodDescriptor, StaticMetadata};
//! use nubes::pipeline::Outcome;
//! use nubes::registry::MethodTable;
//! use nubes::server::Request;
//!
//! let meta = StaticMetadata::new(vec![ControllerDescriptor::new("Hello")
//!     .base_path("/hello")
//!     .method(MethodDescriptor::new("greet").route("GET", "/"))]);
//! let methods = MethodTable::new().handler("Hello", "greet", |ctx, _| {
//!     ctx.response.write("hi");
//!     Outcome::Continue
//! });
//!
//! let app = Application::builder()
//!     .metadata(meta)
//!     .methods(methods)
//!     .build()
//!     .unwrap();
//! let res = app.handle(Request::builder(Method::GET, "/hello").build());
//! assert_eq!(res.text(), Some("hi"));
//! ```

use std::sync::Arc;
use tracing::{debug, info};

use crate::compiler::{compile, Bindings};
use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::meta::{MetadataProvider, StaticMetadata};
use crate::params::{ParamResolver, ResolverRegistry};
use crate::pipeline::{DefaultErrorHandler, ErrorHandler, Executor, RequestContext};
use crate::processor::{Processor, ProcessorRegistry};
use crate::registry::MethodTable;
use crate::router::Router;
use crate::security::{AuthProvider, AuthSelector};
use crate::server::{ParamVec, Request, Response};
use crate::services::{
    PaginationProcessor, RateLimitProcessor, RateLimiter, PAGINATED, RATE_LIMITED,
};

/// A built application: immutable routes plus shared services.
pub struct Application {
    config: AppConfig,
    router: Router,
    executor: Executor,
    rate_limiter: Arc<RateLimiter>,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::default()
    }

    /// Route and run one request.
    ///
    /// An `X-Request-Id` header carrying a valid ULID is reused as the
    /// request id; the id is echoed on the response either way.
    pub fn handle(&self, request: Request) -> Response {
        let request_id = RequestId::from_header_or_new(request.get_header(REQUEST_ID_HEADER));
        let routed = self.router.route(&request.method, &request.path);

        let mut ctx = match routed {
            Some(matched) => {
                let mut ctx = RequestContext::new(request_id, request, matched.path_params);
                self.executor.execute(&matched.route, &mut ctx);
                ctx
            }
            None => {
                let message = format!("No route for {} {}", request.method, request.path);
                let mut ctx = RequestContext::new(request_id, request, ParamVec::new());
                debug!(request_id = %request_id, "{message}");
                self.executor
                    .error_handler()
                    .handle(&mut ctx, 404, &message);
                ctx
            }
        };

        ctx.response
            .set_header(REQUEST_ID_HEADER, request_id.to_string());
        ctx.response
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The limiter shared by every `RateLimited` controller.
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("config", &self.config)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct ApplicationBuilder {
    config: AppConfig,
    metadata: Option<Arc<dyn MetadataProvider>>,
    methods: MethodTable,
    auth_provider: Option<Arc<dyn AuthProvider>>,
    processors: Vec<(String, Arc<dyn Processor>)>,
    resolvers: Vec<(String, Arc<dyn ParamResolver>)>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
}

impl ApplicationBuilder {
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn metadata(mut self, provider: impl MetadataProvider + 'static) -> Self {
        self.metadata = Some(Arc::new(provider));
        self
    }

    pub fn metadata_arc(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.metadata = Some(provider);
        self
    }

    pub fn methods(mut self, methods: MethodTable) -> Self {
        self.methods = methods;
        self
    }

    /// Without a provider, auth declarations compile to open routes.
    pub fn auth_provider(mut self, provider: Arc<dyn AuthProvider>) -> Self {
        self.auth_provider = Some(provider);
        self
    }

    /// Bind an extra processor; replaces a built-in one for the same
    /// annotation.
    pub fn processor(mut self, annotation: impl Into<String>, processor: Arc<dyn Processor>) -> Self {
        self.processors.push((annotation.into(), processor));
        self
    }

    /// Register an extra parameter kind or replace a built-in one.
    pub fn resolver(mut self, kind: impl Into<String>, resolver: Arc<dyn ParamResolver>) -> Self {
        self.resolvers.push((kind.into(), resolver));
        self
    }

    pub fn error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Validate the configuration and compile every route.
    pub fn build(self) -> Result<Application, ConfigError> {
        self.config.validate()?;

        let rate_limiter = Arc::new(RateLimiter::new(self.config.rate_limit.clone()));
        let mut processors = ProcessorRegistry::new();
        processors.register(
            PAGINATED,
            Arc::new(PaginationProcessor::new(self.config.pagination.clone())),
        );
        processors.register(
            RATE_LIMITED,
            Arc::new(RateLimitProcessor::new(Arc::clone(&rate_limiter))),
        );
        for (annotation, processor) in self.processors {
            processors.register(annotation, processor);
        }

        let mut resolvers = ResolverRegistry::with_defaults();
        for (kind, resolver) in self.resolvers {
            resolvers.register(kind, resolver);
        }

        let bindings = Bindings {
            methods: self.methods,
            processors,
            resolvers,
            auth: AuthSelector::new(self.auth_provider, self.config.auth.realm.clone()),
        };
        let metadata = self
            .metadata
            .unwrap_or_else(|| Arc::new(StaticMetadata::default()));
        let routes = compile(metadata.as_ref(), &bindings)?;
        let router = Router::new(routes)?;

        let executor = Executor::new(
            self.error_handler
                .unwrap_or_else(|| Arc::new(DefaultErrorHandler)),
        );
        info!(routes = router.len(), "Application built");

        Ok(Application {
            config: self.config,
            router,
            executor,
            rate_limiter,
        })
    }
}
