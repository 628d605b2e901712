use http::Method;
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::compiler::Route;
use crate::error::ConfigError;
use crate::server::ParamVec;

/// A routed request: the compiled route plus its path captures.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub path_params: ParamVec,
}

impl RouteMatch {
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

struct Entry {
    verb: Method,
    regex: Regex,
    route: Arc<Route>,
    params: Vec<Arc<str>>,
}

/// Matches request paths against compiled route patterns, first
/// registered route first.
pub struct Router {
    entries: Vec<Entry>,
}

impl Router {
    pub fn new(routes: Vec<Arc<Route>>) -> Result<Self, ConfigError> {
        let mut entries = Vec::with_capacity(routes.len());
        for route in routes {
            let (regex, params) =
                Self::path_to_regex(&route.path).map_err(|e| ConfigError::InvalidRoute {
                    controller: route.controller.to_string(),
                    method: route.method.to_string(),
                    reason: e.to_string(),
                })?;
            entries.push(Entry {
                verb: route.verb.clone(),
                regex,
                route,
                params,
            });
        }

        let summary: Vec<String> = entries
            .iter()
            .take(10)
            .map(|e| format!("{} {}", e.verb, e.route.path))
            .collect();
        info!(
            routes_count = entries.len(),
            routes_summary = ?summary,
            "Routing table loaded"
        );
        Ok(Self { entries })
    }

    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let start = Instant::now();
        let path = match path.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed,
            _ => path,
        };

        for entry in &self.entries {
            if entry.verb != *method {
                continue;
            }
            let Some(caps) = entry.regex.captures(path) else {
                continue;
            };
            let mut path_params = ParamVec::new();
            for (i, name) in entry.params.iter().enumerate() {
                if let Some(m) = caps.get(i + 1) {
                    let value = percent_decode_str(m.as_str()).decode_utf8_lossy().into_owned();
                    path_params.push((Arc::clone(name), value));
                }
            }
            debug!(
                method = %method,
                path = %path,
                route_pattern = %entry.route.path,
                path_params = ?path_params,
                duration_us = start.elapsed().as_micros() as u64,
                "Route matched"
            );
            return Some(RouteMatch {
                route: Arc::clone(&entry.route),
                path_params,
            });
        }

        debug!(method = %method, path = %path, "No route matched");
        None
    }

    pub fn routes(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.entries.iter().map(|e| &e.route)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compile a path pattern into an anchored regex and its parameter
    /// names. Parameters are written `:name` or `{name}` and match one
    /// segment; everything else matches literally.
    pub(crate) fn path_to_regex(path: &str) -> Result<(Regex, Vec<Arc<str>>), regex::Error> {
        let mut pattern = String::with_capacity(path.len() + 8);
        pattern.push('^');
        let mut params = Vec::new();

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let name = segment
                .strip_prefix(':')
                .or_else(|| segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')));
            pattern.push('/');
            match name {
                Some(name) if !name.is_empty() => {
                    pattern.push_str("([^/]+)");
                    params.push(Arc::from(name));
                }
                _ => pattern.push_str(&regex::escape(segment)),
            }
        }
        if params.is_empty() && pattern.len() == 1 {
            pattern.push('/');
        }
        pattern.push('$');

        Ok((Regex::new(&pattern)?, params))
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let routes: Vec<String> = self
            .entries
            .iter()
            .map(|e| format!("{} {}", e.verb, e.route.path))
            .collect();
        f.debug_struct("Router").field("routes", &routes).finish()
    }
}
