use http::Method;
use std::sync::Arc;

use crate::filter::FilterDescriptor;
use crate::params::BoundParam;
use crate::processor::Processor;
use crate::registry::{FilterFn, HandlerFn};
use crate::security::AuthGuard;

/// A processor bound to the class annotation that selected it.
#[derive(Clone)]
pub struct BoundProcessor {
    pub annotation: Arc<str>,
    pub processor: Arc<dyn Processor>,
}

/// A filter descriptor with its implementation.
#[derive(Clone)]
pub struct BoundFilter {
    pub descriptor: FilterDescriptor,
    pub run: FilterFn,
}

/// A compiled, immutable route.
///
/// Stage lists are in execution order. Routes are shared through `Arc` and
/// read concurrently without synchronization.
pub struct Route {
    pub controller: Arc<str>,
    pub method: Arc<str>,
    pub verb: Method,
    pub path: String,
    /// Shared by every route of the controller
    pub processors: Arc<[BoundProcessor]>,
    pub before_filters: Vec<BoundFilter>,
    pub auth: Option<Arc<dyn AuthGuard>>,
    pub params: Vec<BoundParam>,
    pub handler: HandlerFn,
    pub after_filters: Vec<BoundFilter>,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let processors: Vec<&str> = self.processors.iter().map(|p| &*p.annotation).collect();
        let before: Vec<String> = self
            .before_filters
            .iter()
            .map(|b| b.descriptor.method.to_string())
            .collect();
        let after: Vec<String> = self
            .after_filters
            .iter()
            .map(|b| b.descriptor.method.to_string())
            .collect();
        f.debug_struct("Route")
            .field("controller", &self.controller)
            .field("method", &self.method)
            .field("verb", &self.verb)
            .field("path", &self.path)
            .field("processors", &processors)
            .field("before_filters", &before)
            .field("auth", &self.auth.as_ref().map(|g| g.method()))
            .field("params", &self.params)
            .field("after_filters", &after)
            .finish()
    }
}
