use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::context::RequestContext;
use super::error_handler::{DefaultErrorHandler, ErrorHandler};
use super::Outcome;
use crate::compiler::{BoundFilter, Route};
use crate::error::{ErrorKind, PipelineError};

/// Pipeline position of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PreProcess,
    BeforeFilters,
    Auth,
    ParamResolution,
    Handler,
    AfterFilters,
    PostProcess,
    /// Terminal: completed or halted
    Done,
    /// Terminal: a stage failed
    Error,
}

impl Stage {
    /// The stage entered after this one returns `Continue`.
    #[must_use]
    pub fn next(self) -> Stage {
        match self {
            Stage::PreProcess => Stage::BeforeFilters,
            Stage::BeforeFilters => Stage::Auth,
            Stage::Auth => Stage::ParamResolution,
            Stage::ParamResolution => Stage::Handler,
            Stage::Handler => Stage::AfterFilters,
            Stage::AfterFilters => Stage::PostProcess,
            Stage::PostProcess | Stage::Done => Stage::Done,
            Stage::Error => Stage::Error,
        }
    }

    /// Stages before the handler; failures here still run cleanup.
    #[must_use]
    pub fn is_before_phase(self) -> bool {
        matches!(
            self,
            Stage::PreProcess | Stage::BeforeFilters | Stage::Auth | Stage::ParamResolution
        )
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::PreProcess => "pre_process",
            Stage::BeforeFilters => "before_filters",
            Stage::Auth => "auth",
            Stage::ParamResolution => "param_resolution",
            Stage::Handler => "handler",
            Stage::AfterFilters => "after_filters",
            Stage::PostProcess => "post_process",
            Stage::Done => "done",
            Stage::Error => "error",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives requests through compiled routes.
#[derive(Clone)]
pub struct Executor {
    error_handler: Arc<dyn ErrorHandler>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(Arc::new(DefaultErrorHandler))
    }
}

impl Executor {
    pub fn new(error_handler: Arc<dyn ErrorHandler>) -> Self {
        Self { error_handler }
    }

    pub fn error_handler(&self) -> &Arc<dyn ErrorHandler> {
        &self.error_handler
    }

    /// Run `ctx` through `route` and return the terminal stage.
    pub fn execute(&self, route: &Route, ctx: &mut RequestContext) -> Stage {
        ctx.controller = Arc::clone(&route.controller);
        ctx.handler = Arc::clone(&route.method);

        let start = Instant::now();
        let mut args: Vec<Value> = Vec::new();
        let mut stage = Stage::PreProcess;

        while !stage.is_terminal() {
            let outcome = match stage {
                Stage::PreProcess => Self::run_processors(route, ctx, true),
                Stage::BeforeFilters => Self::run_filters(&route.before_filters, ctx),
                Stage::Auth => match &route.auth {
                    Some(guard) => guard.check(ctx),
                    None => Outcome::Continue,
                },
                Stage::ParamResolution => match Self::resolve_params(route, ctx) {
                    Ok(resolved) => {
                        args = resolved;
                        Outcome::Continue
                    }
                    Err(err) => Outcome::Fail(err),
                },
                Stage::Handler => {
                    debug!(
                        request_id = %ctx.request_id,
                        controller = %route.controller,
                        handler = %route.method,
                        args = args.len(),
                        "Invoking handler"
                    );
                    (route.handler)(ctx, &args)
                }
                Stage::AfterFilters => Self::run_filters(&route.after_filters, ctx),
                Stage::PostProcess => Self::run_processors(route, ctx, false),
                Stage::Done | Stage::Error => break,
            };

            stage = match outcome {
                Outcome::Continue => {
                    debug!(request_id = %ctx.request_id, stage = %stage, "Stage completed");
                    stage.next()
                }
                Outcome::Halt => {
                    debug!(request_id = %ctx.request_id, stage = %stage, "Pipeline halted");
                    Stage::Done
                }
                Outcome::Fail(err) => {
                    // The error handler writes last so cleanup cannot replace the error response.
                    if stage.is_before_phase() {
                        Self::cleanup(route, ctx);
                    }
                    self.fail(ctx, stage, &err);
                    Stage::Error
                }
            };
        }

        info!(
            request_id = %ctx.request_id,
            controller = %route.controller,
            handler = %route.method,
            status = ctx.response.status,
            outcome = %stage,
            latency_us = start.elapsed().as_micros() as u64,
            "Request completed"
        );
        stage
    }

    fn fail(&self, ctx: &mut RequestContext, stage: Stage, err: &PipelineError) {
        if err.kind == ErrorKind::Handler {
            error!(
                request_id = %ctx.request_id,
                controller = %ctx.controller,
                handler = %ctx.handler,
                stage = %stage,
                status = err.status,
                error = %err.message,
                "Handler error"
            );
        } else {
            warn!(
                request_id = %ctx.request_id,
                stage = %stage,
                kind = %err.kind,
                status = err.status,
                error = %err.message,
                "Request rejected"
            );
        }
        self.error_handler.handle(ctx, err.status, &err.message);
    }

    /// After filters then post processing, after a before-phase failure.
    fn cleanup(route: &Route, ctx: &mut RequestContext) {
        for (stage, outcome) in [
            (Stage::AfterFilters, Self::run_filters(&route.after_filters, ctx)),
            (Stage::PostProcess, Self::run_processors(route, ctx, false)),
        ] {
            if let Outcome::Fail(err) = outcome {
                warn!(
                    request_id = %ctx.request_id,
                    stage = %stage,
                    error = %err,
                    "Cleanup stage failed after earlier error"
                );
            }
        }
    }

    fn run_processors(route: &Route, ctx: &mut RequestContext, pre: bool) -> Outcome {
        for bound in route.processors.iter() {
            let outcome = if pre {
                bound.processor.pre_handle(ctx)
            } else {
                bound.processor.post_handle(ctx)
            };
            if !outcome.is_continue() {
                debug!(
                    request_id = %ctx.request_id,
                    processor = bound.processor.name(),
                    annotation = %bound.annotation,
                    pre = pre,
                    "Processor stopped the pipeline"
                );
                return outcome;
            }
        }
        Outcome::Continue
    }

    fn run_filters(filters: &[BoundFilter], ctx: &mut RequestContext) -> Outcome {
        for filter in filters {
            let outcome = (filter.run)(ctx);
            if !outcome.is_continue() {
                debug!(
                    request_id = %ctx.request_id,
                    filter = %filter.descriptor.method,
                    direction = %filter.descriptor.direction,
                    "Filter stopped the pipeline"
                );
                return outcome;
            }
        }
        Outcome::Continue
    }

    fn resolve_params(route: &Route, ctx: &RequestContext) -> Result<Vec<Value>, PipelineError> {
        route.params.iter().map(|p| p.resolve(ctx)).collect()
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor").finish_non_exhaustive()
    }
}
