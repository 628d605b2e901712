use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::ids::RequestId;
use crate::server::{ParamVec, Request, Response};

/// Attribute under which an accepted authentication guard stores the principal.
pub const PRINCIPAL_ATTR: &str = "principal";

/// Named, heterogeneously typed values scoped to one request.
///
/// Processors and filters use it to hand state to later stages, e.g. the
/// pagination processor stores its state for the handler to update.
#[derive(Default)]
pub struct Attributes {
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    /// Typed lookup; `None` when absent or stored with a different type.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key).and_then(|v| v.downcast_mut::<T>())
    }

    /// Remove and return a typed value. A value of another type is left in place.
    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        if !self.values.get(key).is_some_and(|v| v.is::<T>()) {
            return None;
        }
        self.values
            .remove(key)
            .and_then(|v| v.downcast::<T>().ok())
            .map(|b| *b)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for Attributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("Attributes").field("keys", &keys).finish()
    }
}

/// Mutable state of one request as it moves through the pipeline.
#[derive(Debug)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub request: Request,
    /// Parameters captured by the route pattern
    pub path_params: ParamVec,
    pub response: Response,
    pub attributes: Attributes,
    /// Controller owning the matched route
    pub controller: Arc<str>,
    /// Handler method of the matched route
    pub handler: Arc<str>,
}

impl RequestContext {
    pub fn new(request_id: RequestId, request: Request, path_params: ParamVec) -> Self {
        Self {
            request_id,
            request,
            path_params,
            response: Response::new(),
            attributes: Attributes::new(),
            controller: Arc::from(""),
            handler: Arc::from(""),
        }
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Principal stored by the authentication guard, if the route is guarded
    /// and the request was accepted.
    pub fn principal(&self) -> Option<&Value> {
        self.attributes.get::<Value>(PRINCIPAL_ATTR)
    }
}
