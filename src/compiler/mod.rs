//! # Route compiler
//!
//! Turns controller metadata into immutable [`Route`]s in two phases:
//!
//! 1. **Plan** ([`RouteCompiler::plan_all`]): metadata only. Flattens each
//!    controller's superclass chain, unions inherited and own filters and
//!    processors, orders filters, validates auth declarations and parameter
//!    kinds, and joins route paths. Produces [`RoutePlan`]s.
//! 2. **Bind** ([`RouteCompiler::bind`]): attaches the registered filter and
//!    handler implementations, processors, parameter resolvers and auth
//!    guards. Produces [`Route`]s.
//!
//! Every failure is a [`ConfigError`]; nothing here is request-scoped.
//!
//! ## Inheritance
//!
//! A controller's chain is planned ancestors first and ends at a controller
//! with no `extends` or at [`ROOT_CONTROLLER`]. Each controller's plan is
//! computed once and reused by every subclass.
//!
//! - Processors keep first-seen order and are deduplicated by annotation.
//!   Annotations without a registered processor are ignored.
//! - Filters are numbered in declaration order across the chain, ancestors
//!   first, and ordered by `(priority, seq)`. A filter with the same method
//!   name as an inherited one replaces it.
//! - Class-level auth is inherited; a controller's own declaration replaces
//!   it and a method-level declaration overrides both for that route.
//! - Only a controller's own methods produce routes.
//!
//! ## Example
//!
//! ```rust
//! use nubes::compiler::{compile, Bindings};
//! use nubes::meta::{ControllerDescriptor, MethodDescriptor, StaticMetadata};
//! use nubes::pipeline::Outcome;
//! use nubes::registry::MethodTable;
//!
//! let meta = StaticMetadata::new(vec![ControllerDescriptor::new("Health")
//!     .base_path("/health")
//!     .method(MethodDescriptor::new("check").route("GET", "/"))]);
//! let methods = MethodTable::new().handler("Health", "check", |ctx, _| {
//!     ctx.response.write("ok");
//!     Outcome::Continue
//! });
//!
//! let routes = compile(&meta, &Bindings::new(methods)).unwrap();
//! assert_eq!(routes[0].path, "/health");
//! ```
//!
//! [`ROOT_CONTROLLER`]: crate::meta::ROOT_CONTROLLER

mod bind;
mod plan;
mod route;

pub use plan::{join_paths, ControllerPlan, PlannedAuth, RoutePlan};
pub use route::{BoundFilter, BoundProcessor, Route};

use http::Method;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::filter::{FilterDescriptor, MethodRef};
use crate::meta::{MetadataProvider, ROOT_CONTROLLER};
use crate::params::ResolverRegistry;
use crate::processor::ProcessorRegistry;
use crate::registry::MethodTable;
use crate::security::AuthSelector;

/// Everything binding needs besides metadata.
#[derive(Debug, Clone)]
pub struct Bindings {
    pub methods: MethodTable,
    pub processors: ProcessorRegistry,
    pub resolvers: ResolverRegistry,
    pub auth: AuthSelector,
}

impl Bindings {
    /// Default resolvers, no processors, authentication disabled.
    pub fn new(methods: MethodTable) -> Self {
        Self {
            methods,
            processors: ProcessorRegistry::new(),
            resolvers: ResolverRegistry::with_defaults(),
            auth: AuthSelector::disabled(),
        }
    }
}

/// Plan and bind every route the provider describes.
pub fn compile(
    provider: &dyn MetadataProvider,
    bindings: &Bindings,
) -> Result<Vec<Arc<Route>>, ConfigError> {
    RouteCompiler::new(provider, bindings).compile()
}

pub struct RouteCompiler<'a> {
    provider: &'a dyn MetadataProvider,
    bindings: &'a Bindings,
    plans: HashMap<String, Arc<ControllerPlan>>,
    bound_processors: HashMap<Arc<str>, Arc<[BoundProcessor]>>,
}

impl<'a> RouteCompiler<'a> {
    pub fn new(provider: &'a dyn MetadataProvider, bindings: &'a Bindings) -> Self {
        Self {
            provider,
            bindings,
            plans: HashMap::new(),
            bound_processors: HashMap::new(),
        }
    }

    /// Plan and bind all routes.
    pub fn compile(&mut self) -> Result<Vec<Arc<Route>>, ConfigError> {
        let plans = self.plan_all()?;
        let mut routes = Vec::with_capacity(plans.len());
        for plan in plans {
            routes.push(Arc::new(self.bind(plan)?));
        }
        info!(
            routes = routes.len(),
            controllers = self.plans.len(),
            auth_enabled = self.bindings.auth.has_provider(),
            "Routes compiled"
        );
        Ok(routes)
    }

    /// Plan the routes of every routable controller, in provider order.
    ///
    /// Two routes with the same verb and path are rejected.
    pub fn plan_all(&mut self) -> Result<Vec<RoutePlan>, ConfigError> {
        let mut all = Vec::new();
        let mut seen: HashSet<(Method, String)> = HashSet::new();
        for name in self.provider.controller_names() {
            for plan in self.plan_routes(&name)? {
                if !seen.insert((plan.verb.clone(), plan.path.clone())) {
                    return Err(ConfigError::InvalidRoute {
                        controller: plan.controller.to_string(),
                        method: plan.method.to_string(),
                        reason: format!("duplicate route {} {}", plan.verb, plan.path),
                    });
                }
                all.push(plan);
            }
        }
        Ok(all)
    }

    /// Plan the routes declared by one controller. Abstract controllers
    /// yield none.
    pub fn plan_routes(&mut self, name: &str) -> Result<Vec<RoutePlan>, ConfigError> {
        let controller_plan = self.plan_controller(name)?;
        let descriptor = self
            .provider
            .describe(name)
            .ok_or_else(|| ConfigError::UnknownController(name.to_string()))?;
        let Some(base_path) = controller_plan.base_path.as_deref() else {
            return Ok(Vec::new());
        };

        let mut routes = Vec::new();
        for method in &descriptor.methods {
            let Some(route) = &method.route else {
                continue;
            };
            let invalid = |reason: String| ConfigError::InvalidRoute {
                controller: name.to_string(),
                method: method.name.clone(),
                reason,
            };

            let verb = Method::from_bytes(route.method.trim().to_ascii_uppercase().as_bytes())
                .map_err(|_| invalid(format!("invalid HTTP verb '{}'", route.method)))?;

            let auth = match &method.auth {
                Some(annotation) => {
                    let location = format!("{name}::{}", method.name);
                    let method = AuthSelector::validate(annotation, &location)?;
                    Some(PlannedAuth {
                        method,
                        annotation: annotation.clone(),
                        location,
                    })
                }
                None => controller_plan.auth.clone(),
            };

            for param in &method.params {
                let Some(resolver) = self.bindings.resolvers.get(&param.kind) else {
                    return Err(ConfigError::UnresolvableParameter {
                        controller: name.to_string(),
                        method: method.name.clone(),
                        param: param.name.clone(),
                        kind: param.kind.clone(),
                    });
                };
                resolver
                    .validate(param)
                    .map_err(|reason| ConfigError::InvalidParameter {
                        controller: name.to_string(),
                        method: method.name.clone(),
                        param: param.name.clone(),
                        reason,
                    })?;
            }

            let plan = RoutePlan {
                controller: Arc::clone(&controller_plan.name),
                method: Arc::from(method.name.as_str()),
                verb,
                path: join_paths(base_path, &route.path),
                processors: controller_plan.processors.clone(),
                before_filters: controller_plan.filters.before().to_vec(),
                auth,
                params: method.params.clone(),
                after_filters: controller_plan.filters.after().to_vec(),
            };
            debug!(
                controller = %plan.controller,
                method = %plan.method,
                verb = %plan.verb,
                path = %plan.path,
                "Route planned"
            );
            routes.push(plan);
        }
        Ok(routes)
    }

    /// Flatten one controller and its ancestors. Cached.
    pub fn plan_controller(&mut self, name: &str) -> Result<Arc<ControllerPlan>, ConfigError> {
        let mut visiting = Vec::new();
        self.plan_chain(name, &mut visiting)
    }

    fn plan_chain(
        &mut self,
        name: &str,
        visiting: &mut Vec<String>,
    ) -> Result<Arc<ControllerPlan>, ConfigError> {
        if let Some(plan) = self.plans.get(name) {
            return Ok(Arc::clone(plan));
        }
        if let Some(pos) = visiting.iter().position(|v| v == name) {
            let mut cycle = visiting[pos..].to_vec();
            cycle.push(name.to_string());
            return Err(ConfigError::InheritanceCycle(cycle));
        }
        let descriptor = self
            .provider
            .describe(name)
            .ok_or_else(|| ConfigError::UnknownController(name.to_string()))?;

        visiting.push(name.to_string());
        let parent = match descriptor.extends.as_deref() {
            None | Some(ROOT_CONTROLLER) => None,
            Some(parent) => Some(self.plan_chain(parent, visiting)?),
        };
        visiting.pop();

        let mut processors = parent
            .as_ref()
            .map(|p| p.processors.clone())
            .unwrap_or_default();
        for annotation in &descriptor.annotations {
            if processors.iter().any(|p| p.as_ref() == annotation.as_str()) {
                continue;
            }
            if self.bindings.processors.contains(annotation) {
                processors.push(Arc::from(annotation.as_str()));
            } else {
                debug!(
                    controller = %name,
                    annotation = %annotation,
                    "No processor registered for annotation, ignoring"
                );
            }
        }

        let mut filters = parent.as_ref().map(|p| p.filters.clone()).unwrap_or_default();
        let mut seq = parent.as_ref().map_or(0, |p| p.next_seq);
        for method in &descriptor.methods {
            if let Some(filter) = method.filter {
                filters.add(FilterDescriptor {
                    method: MethodRef::new(name, &method.name),
                    direction: filter.direction,
                    priority: filter.priority,
                    seq,
                });
                seq += 1;
            }
        }

        let auth = match &descriptor.auth {
            Some(annotation) => Some(PlannedAuth {
                method: AuthSelector::validate(annotation, name)?,
                annotation: annotation.clone(),
                location: name.to_string(),
            }),
            None => parent.as_ref().and_then(|p| p.auth.clone()),
        };

        let plan = Arc::new(ControllerPlan {
            name: Arc::from(name),
            base_path: descriptor.base_path.clone(),
            processors,
            filters,
            auth,
            next_seq: seq,
        });
        debug!(
            controller = %name,
            parent = ?descriptor.extends,
            processors = plan.processors.len(),
            filters = plan.filters.len(),
            "Controller planned"
        );
        self.plans.insert(name.to_string(), Arc::clone(&plan));
        Ok(plan)
    }
}
