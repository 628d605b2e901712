//! Before/after filter descriptors and their deterministic ordering.
//!
//! A filter is a controller method annotated to run around every route of
//! its controller. Filters are ordered by `(priority, seq)`: lowest priority
//! first, ties broken by declaration sequence with ancestors numbered before
//! descendants. Two descriptors are equal when they name the same method.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which side of the handler a filter runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterDirection {
    Before,
    After,
}

impl std::fmt::Display for FilterDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterDirection::Before => f.write_str("before"),
            FilterDirection::After => f.write_str("after"),
        }
    }
}

/// Identity of a controller method: declaring controller plus method name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub controller: Arc<str>,
    pub method: Arc<str>,
}

impl MethodRef {
    pub fn new(controller: &str, method: &str) -> Self {
        Self {
            controller: Arc::from(controller),
            method: Arc::from(method),
        }
    }
}

impl std::fmt::Display for MethodRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.controller, self.method)
    }
}

/// A filter declaration, prior to binding an implementation.
#[derive(Debug, Clone)]
pub struct FilterDescriptor {
    pub method: MethodRef,
    pub direction: FilterDirection,
    pub priority: i32,
    /// Position in the flattened declaration order of the controller chain
    pub seq: u32,
}

impl FilterDescriptor {
    /// Sort key; lower runs first.
    #[must_use]
    pub fn order_key(&self) -> (i32, u32) {
        (self.priority, self.seq)
    }
}

impl PartialEq for FilterDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method
    }
}

impl Eq for FilterDescriptor {}

/// The ordered before and after filters of one controller, inherited ones
/// included.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    before: Vec<FilterDescriptor>,
    after: Vec<FilterDescriptor>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter, replacing any filter with the same method name.
    ///
    /// The replaced filter may belong to an ancestor and may have either
    /// direction; the replacement keeps its own direction and sequence.
    pub fn add(&mut self, filter: FilterDescriptor) {
        let name = Arc::clone(&filter.method.method);
        self.before.retain(|f| f.method.method != name);
        self.after.retain(|f| f.method.method != name);

        let list = match filter.direction {
            FilterDirection::Before => &mut self.before,
            FilterDirection::After => &mut self.after,
        };
        list.push(filter);
        list.sort_by_key(FilterDescriptor::order_key);
    }

    pub fn before(&self) -> &[FilterDescriptor] {
        &self.before
    }

    pub fn after(&self) -> &[FilterDescriptor] {
        &self.after
    }

    /// All filters, before ones first.
    pub fn iter(&self) -> impl Iterator<Item = &FilterDescriptor> {
        self.before.iter().chain(self.after.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.before.len() + self.after.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}
