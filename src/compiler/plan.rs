use http::Method;
use std::fmt;
use std::sync::Arc;

use crate::filter::{FilterDescriptor, FilterSet};
use crate::meta::{AuthAnnotation, ParamDescriptor};
use crate::security::AuthMethod;

/// Flattened, metadata-only view of one controller with everything it
/// inherits. Cached per controller by the compiler.
#[derive(Debug, Clone)]
pub struct ControllerPlan {
    pub name: Arc<str>,
    pub base_path: Option<String>,
    /// Annotation types with a registered processor, inherited first
    pub processors: Vec<Arc<str>>,
    pub filters: FilterSet,
    /// Effective class-level auth, own or inherited
    pub auth: Option<PlannedAuth>,
    /// First sequence number free for a subclass's filters
    pub next_seq: u32,
}

/// A validated auth declaration and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAuth {
    pub method: AuthMethod,
    pub annotation: AuthAnnotation,
    /// `Controller` or `Controller::method`
    pub location: String,
}

/// One route, fully ordered and validated but not yet bound to code.
#[derive(Debug, Clone)]
pub struct RoutePlan {
    pub controller: Arc<str>,
    pub method: Arc<str>,
    pub verb: Method,
    pub path: String,
    pub processors: Vec<Arc<str>>,
    pub before_filters: Vec<FilterDescriptor>,
    pub auth: Option<PlannedAuth>,
    pub params: Vec<ParamDescriptor>,
    pub after_filters: Vec<FilterDescriptor>,
}

/// Join a controller base path and a method path.
///
/// The result always starts with `/` and never ends with one, except for
/// the root path itself.
pub fn join_paths(base: &str, path: &str) -> String {
    let mut joined = String::with_capacity(base.len() + path.len() + 2);
    for segment in base.split('/').chain(path.split('/')) {
        if segment.is_empty() {
            continue;
        }
        joined.push('/');
        joined.push_str(segment);
    }
    if joined.is_empty() {
        joined.push('/');
    }
    joined
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

impl fmt::Display for RoutePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<7} {}  -> {}::{}", self.verb.as_str(), self.path, self.controller, self.method)?;
        if !self.processors.is_empty() {
            f.write_str("\n    processors: ")?;
            write_list(f, &self.processors)?;
        }
        if !self.before_filters.is_empty() {
            let names: Vec<String> = self
                .before_filters
                .iter()
                .map(|d| format!("{}({})", d.method, d.priority))
                .collect();
            f.write_str("\n    before:     ")?;
            write_list(f, &names)?;
        }
        if let Some(auth) = &self.auth {
            write!(f, "\n    auth:       {} (declared on {})", auth.method, auth.location)?;
        }
        if !self.params.is_empty() {
            let params: Vec<String> = self
                .params
                .iter()
                .map(|p| {
                    let req = if p.required { "!" } else { "" };
                    format!("{}{}: {} {}", p.name, req, p.kind, p.value_type)
                })
                .collect();
            f.write_str("\n    params:     ")?;
            write_list(f, &params)?;
        }
        if !self.after_filters.is_empty() {
            let names: Vec<String> = self
                .after_filters
                .iter()
                .map(|d| format!("{}({})", d.method, d.priority))
                .collect();
            f.write_str("\n    after:      ")?;
            write_list(f, &names)?;
        }
        Ok(())
    }
}
