//! Controller method implementations.
//!
//! Metadata describes controllers; the [`MethodTable`] supplies the code.
//! Handlers and filters are registered under `(controller, method)` and
//! looked up once while routes are bound. A filter declared on a base
//! controller is registered under the base controller's name.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::pipeline::{Outcome, RequestContext};

/// Route handler: receives the request context and its resolved arguments
/// in declaration order.
pub type HandlerFn = Arc<dyn Fn(&mut RequestContext, &[Value]) -> Outcome + Send + Sync>;

/// Before or after filter.
pub type FilterFn = Arc<dyn Fn(&mut RequestContext) -> Outcome + Send + Sync>;

/// `(controller, method)` → implementation.
#[derive(Clone, Default)]
pub struct MethodTable {
    handlers: HashMap<(String, String), HandlerFn>,
    filters: HashMap<(String, String), FilterFn>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_handler<F>(&mut self, controller: &str, method: &str, handler: F)
    where
        F: Fn(&mut RequestContext, &[Value]) -> Outcome + Send + Sync + 'static,
    {
        debug!(controller = %controller, method = %method, "Handler registered");
        self.handlers
            .insert((controller.to_string(), method.to_string()), Arc::new(handler));
    }

    pub fn register_filter<F>(&mut self, controller: &str, method: &str, filter: F)
    where
        F: Fn(&mut RequestContext) -> Outcome + Send + Sync + 'static,
    {
        debug!(controller = %controller, method = %method, "Filter registered");
        self.filters
            .insert((controller.to_string(), method.to_string()), Arc::new(filter));
    }

    /// Chaining form of [`register_handler`](Self::register_handler).
    pub fn handler<F>(mut self, controller: &str, method: &str, handler: F) -> Self
    where
        F: Fn(&mut RequestContext, &[Value]) -> Outcome + Send + Sync + 'static,
    {
        self.register_handler(controller, method, handler);
        self
    }

    /// Chaining form of [`register_filter`](Self::register_filter).
    pub fn filter<F>(mut self, controller: &str, method: &str, filter: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Outcome + Send + Sync + 'static,
    {
        self.register_filter(controller, method, filter);
        self
    }

    pub fn get_handler(&self, controller: &str, method: &str) -> Option<HandlerFn> {
        self.handlers
            .get(&(controller.to_string(), method.to_string()))
            .map(Arc::clone)
    }

    pub fn get_filter(&self, controller: &str, method: &str) -> Option<FilterFn> {
        self.filters
            .get(&(controller.to_string(), method.to_string()))
            .map(Arc::clone)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len() + self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty() && self.filters.is_empty()
    }
}

impl std::fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodTable")
            .field("handlers", &self.handlers.len())
            .field("filters", &self.filters.len())
            .finish()
    }
}
