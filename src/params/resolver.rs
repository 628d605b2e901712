use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::coerce::coerce;
use crate::error::PipelineError;
use crate::meta::ParamDescriptor;
use crate::pipeline::{RequestContext, PRINCIPAL_ATTR};
use crate::services::pagination::PaginationState;

/// Strategy producing the raw value of one handler argument.
///
/// Resolvers only read request state. `Ok(None)` means the value is absent;
/// presence and type checks are applied by [`BoundParam`].
pub trait ParamResolver: Send + Sync {
    fn resolve(
        &self,
        param: &ParamDescriptor,
        ctx: &RequestContext,
    ) -> Result<Option<Value>, PipelineError>;

    /// Checked once at compile time. `Err` carries the reason the
    /// declaration can never resolve.
    fn validate(&self, _param: &ParamDescriptor) -> Result<(), String> {
        Ok(())
    }
}

/// A parameter descriptor with its resolver, fixed at compile time.
#[derive(Clone)]
pub struct BoundParam {
    pub descriptor: ParamDescriptor,
    pub resolver: Arc<dyn ParamResolver>,
}

impl BoundParam {
    /// Resolve, check presence and coerce. Absent optional values are `null`.
    pub fn resolve(&self, ctx: &RequestContext) -> Result<Value, PipelineError> {
        let param = &self.descriptor;
        match self.resolver.resolve(param, ctx)? {
            Some(raw) => coerce(raw, param.value_type).map_err(|reason| {
                PipelineError::bad_request(format!(
                    "Invalid value for parameter '{}': {}",
                    param.name, reason
                ))
            }),
            None if param.required => Err(PipelineError::bad_request(format!(
                "Missing required {} parameter '{}'",
                param.kind, param.name
            ))),
            None => Ok(Value::Null),
        }
    }
}

impl std::fmt::Debug for BoundParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundParam")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

pub struct PathResolver;

impl ParamResolver for PathResolver {
    fn resolve(&self, param: &ParamDescriptor, ctx: &RequestContext) -> Result<Option<Value>, PipelineError> {
        Ok(ctx
            .path_param(&param.name)
            .map(|v| Value::String(v.to_string())))
    }
}

pub struct QueryResolver;

impl ParamResolver for QueryResolver {
    fn resolve(&self, param: &ParamDescriptor, ctx: &RequestContext) -> Result<Option<Value>, PipelineError> {
        Ok(ctx
            .request
            .get_query_param(&param.name)
            .map(|v| Value::String(v.to_string())))
    }
}

pub struct HeaderResolver;

impl ParamResolver for HeaderResolver {
    fn resolve(&self, param: &ParamDescriptor, ctx: &RequestContext) -> Result<Option<Value>, PipelineError> {
        Ok(ctx
            .request
            .get_header(&param.name)
            .map(|v| Value::String(v.to_string())))
    }
}

/// The whole decoded JSON body, regardless of the parameter name.
pub struct BodyResolver;

impl ParamResolver for BodyResolver {
    fn resolve(&self, _param: &ParamDescriptor, ctx: &RequestContext) -> Result<Option<Value>, PipelineError> {
        Ok(ctx.request.body.clone())
    }
}

/// Request metadata selected by parameter name.
pub struct ContextResolver;

impl ContextResolver {
    pub const NAMES: [&'static str; 6] = ["request_id", "client", "method", "path", "url", PRINCIPAL_ATTR];
}

impl ParamResolver for ContextResolver {
    fn validate(&self, param: &ParamDescriptor) -> Result<(), String> {
        if Self::NAMES.contains(&param.name.as_str()) {
            Ok(())
        } else {
            Err(format!(
                "unknown context value '{}', expected one of: {}",
                param.name,
                Self::NAMES.join(", ")
            ))
        }
    }

    fn resolve(&self, param: &ParamDescriptor, ctx: &RequestContext) -> Result<Option<Value>, PipelineError> {
        let value = match param.name.as_str() {
            "request_id" => Some(Value::String(ctx.request_id.to_string())),
            "client" => Some(Value::String(ctx.request.client.clone())),
            "method" => Some(Value::String(ctx.request.method.to_string())),
            "path" => Some(Value::String(ctx.request.path.clone())),
            "url" => Some(Value::String(ctx.request.url.clone())),
            PRINCIPAL_ATTR => ctx.principal().cloned(),
            _ => None,
        };
        Ok(value)
    }
}

/// Pagination summary stored by the `Paginated` processor.
pub struct PaginationResolver;

impl ParamResolver for PaginationResolver {
    fn resolve(&self, _param: &ParamDescriptor, ctx: &RequestContext) -> Result<Option<Value>, PipelineError> {
        PaginationState::from_context(ctx)
            .map(|state| {
                serde_json::to_value(state.summary())
                    .map_err(|e| PipelineError::handler(format!("pagination summary: {e}")))
            })
            .transpose()
    }
}

/// Parameter kind tag → resolver.
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    resolvers: HashMap<String, Arc<dyn ParamResolver>>,
}

impl ResolverRegistry {
    /// An empty registry; see [`with_defaults`](Self::with_defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in kind installed.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("path", Arc::new(PathResolver));
        registry.register("query", Arc::new(QueryResolver));
        registry.register("header", Arc::new(HeaderResolver));
        registry.register("body", Arc::new(BodyResolver));
        registry.register("context", Arc::new(ContextResolver));
        registry.register("pagination", Arc::new(PaginationResolver));
        registry
    }

    /// Register or replace the resolver for `kind`.
    pub fn register(&mut self, kind: impl Into<String>, resolver: Arc<dyn ParamResolver>) {
        let kind = kind.into();
        debug!(kind = %kind, "Parameter resolver registered");
        self.resolvers.insert(kind, resolver);
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn ParamResolver>> {
        self.resolvers.get(kind).map(Arc::clone)
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.resolvers.contains_key(kind)
    }

    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl std::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
