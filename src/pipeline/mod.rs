//! # Pipeline executor
//!
//! Runs one request through a compiled [`Route`](crate::compiler::Route):
//!
//! ```text
//! PreProcess → BeforeFilters → Auth → ParamResolution → Handler
//!            → AfterFilters → PostProcess → Done
//! ```
//!
//! Every stage step returns an [`Outcome`]. `Continue` advances, `Halt`
//! ends the request successfully with no further stages, `Fail` hands the
//! error to the [`ErrorHandler`] and moves to [`Stage::Error`].
//!
//! A failure before the handler still runs the after filters and the
//! processors' `post_handle` so cleanup work happens. The error handler
//! writes the response after cleanup, and cleanup failures are only logged,
//! so the original error always reaches the client. A failure in the
//! handler or later stops immediately.

mod context;
mod core;
mod error_handler;

pub use self::core::{Executor, Stage};
pub use context::{Attributes, RequestContext, PRINCIPAL_ATTR};
pub use error_handler::{DefaultErrorHandler, ErrorHandler};

use crate::error::PipelineError;

/// Result of one pipeline step.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Proceed to the next step.
    Continue,
    /// Stop here; the response is complete.
    Halt,
    /// Stop here and report the error.
    Fail(PipelineError),
}

impl Outcome {
    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, Outcome::Continue)
    }
}

impl From<Result<(), PipelineError>> for Outcome {
    fn from(result: Result<(), PipelineError>) -> Self {
        match result {
            Ok(()) => Outcome::Continue,
            Err(err) => Outcome::Fail(err),
        }
    }
}

impl From<PipelineError> for Outcome {
    fn from(err: PipelineError) -> Self {
        Outcome::Fail(err)
    }
}
