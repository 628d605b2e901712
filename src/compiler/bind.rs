use std::sync::Arc;
use tracing::debug;

use super::plan::RoutePlan;
use super::route::{BoundFilter, BoundProcessor, Route};
use super::RouteCompiler;
use crate::error::ConfigError;
use crate::filter::FilterDescriptor;
use crate::params::BoundParam;

impl RouteCompiler<'_> {
    /// Attach implementations to a planned route.
    pub fn bind(&mut self, plan: RoutePlan) -> Result<Route, ConfigError> {
        let processors = self.bind_processors(&plan)?;
        let before_filters = self.bind_filters(&plan.before_filters)?;
        let after_filters = self.bind_filters(&plan.after_filters)?;

        let handler = self
            .bindings
            .methods
            .get_handler(&plan.controller, &plan.method)
            .ok_or_else(|| ConfigError::MissingImplementation {
                controller: plan.controller.to_string(),
                method: plan.method.to_string(),
                role: "handler",
            })?;

        let auth = match &plan.auth {
            Some(planned) => self
                .bindings
                .auth
                .select(&planned.annotation, &planned.location)?,
            None => None,
        };

        let mut params = Vec::with_capacity(plan.params.len());
        for descriptor in plan.params {
            let resolver = self.bindings.resolvers.get(&descriptor.kind).ok_or_else(|| {
                ConfigError::UnresolvableParameter {
                    controller: plan.controller.to_string(),
                    method: plan.method.to_string(),
                    param: descriptor.name.clone(),
                    kind: descriptor.kind.clone(),
                }
            })?;
            params.push(BoundParam {
                descriptor,
                resolver,
            });
        }

        debug!(
            controller = %plan.controller,
            method = %plan.method,
            processors = processors.len(),
            before_filters = before_filters.len(),
            guarded = auth.is_some(),
            params = params.len(),
            after_filters = after_filters.len(),
            "Route bound"
        );

        Ok(Route {
            controller: plan.controller,
            method: plan.method,
            verb: plan.verb,
            path: plan.path,
            processors,
            before_filters,
            auth,
            params,
            handler,
            after_filters,
        })
    }

    fn bind_processors(&mut self, plan: &RoutePlan) -> Result<Arc<[BoundProcessor]>, ConfigError> {
        if let Some(bound) = self.bound_processors.get(&plan.controller) {
            return Ok(Arc::clone(bound));
        }
        let mut bound = Vec::with_capacity(plan.processors.len());
        for annotation in &plan.processors {
            let processor = self.bindings.processors.get(annotation).ok_or_else(|| {
                ConfigError::MissingImplementation {
                    controller: plan.controller.to_string(),
                    method: annotation.to_string(),
                    role: "processor",
                }
            })?;
            bound.push(BoundProcessor {
                annotation: Arc::clone(annotation),
                processor,
            });
        }
        let bound: Arc<[BoundProcessor]> = bound.into();
        self.bound_processors
            .insert(Arc::clone(&plan.controller), Arc::clone(&bound));
        Ok(bound)
    }

    fn bind_filters(&self, descriptors: &[FilterDescriptor]) -> Result<Vec<BoundFilter>, ConfigError> {
        descriptors
            .iter()
            .map(|descriptor| {
                let run = self
                    .bindings
                    .methods
                    .get_filter(&descriptor.method.controller, &descriptor.method.method)
                    .ok_or_else(|| ConfigError::MissingImplementation {
                        controller: descriptor.method.controller.to_string(),
                        method: descriptor.method.method.to_string(),
                        role: "filter",
                    })?;
                Ok(BoundFilter {
                    descriptor: descriptor.clone(),
                    run,
                })
            })
            .collect()
    }
}
