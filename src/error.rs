//! Error taxonomy.
//!
//! Two families of errors exist and they never mix:
//!
//! - [`ConfigError`] is raised while compiling routes or validating
//!   configuration. It is fatal: an [`Application`](crate::app::Application)
//!   cannot be built while one is outstanding, so these never reach request
//!   handling.
//! - [`PipelineError`] is raised by a pipeline stage for a single request.
//!   It carries the HTTP status handed to the
//!   [`ErrorHandler`](crate::pipeline::ErrorHandler) and a coarse
//!   [`ErrorKind`] used for logging.

use thiserror::Error;

/// Startup-time configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `REDIRECT` authentication was declared without a target URL.
    #[error("{location}: redirect authentication requires a non-empty redirect URL")]
    MissingRedirectTarget { location: String },

    /// The declared authentication method is not one of the supported methods.
    #[error("{location}: unsupported authentication method '{method}'")]
    UnsupportedAuthMethod { location: String, method: String },

    /// A handler parameter declares a kind with no registered resolver.
    #[error("{controller}::{method}: no resolver registered for parameter '{param}' of kind '{kind}'")]
    UnresolvableParameter {
        controller: String,
        method: String,
        param: String,
        kind: String,
    },

    /// The resolver for the parameter's kind rejects the declaration.
    #[error("{controller}::{method}: invalid parameter '{param}': {reason}")]
    InvalidParameter {
        controller: String,
        method: String,
        param: String,
        reason: String,
    },

    /// The metadata provider does not know the named controller.
    #[error("unknown controller '{0}'")]
    UnknownController(String),

    /// The superclass chain loops back onto itself.
    #[error("inheritance cycle detected: {}", .0.join(" -> "))]
    InheritanceCycle(Vec<String>),

    /// Metadata names a method for which no implementation was registered.
    #[error("{controller}::{method}: no {role} implementation registered")]
    MissingImplementation {
        controller: String,
        method: String,
        role: &'static str,
    },

    /// A route annotation could not be turned into a route.
    #[error("{controller}::{method}: invalid route: {reason}")]
    InvalidRoute {
        controller: String,
        method: String,
        reason: String,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Coarse classification of per-request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range client input.
    Validation,
    /// A policy such as the rate limit rejected the request.
    Policy,
    /// Missing or invalid credentials.
    Authentication,
    /// No route matched the request.
    NotFound,
    /// Raised by application handler code.
    Handler,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Policy => "policy",
            ErrorKind::Authentication => "authentication",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Handler => "handler",
        };
        f.write_str(s)
    }
}

/// A recoverable, per-request failure raised by a pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error ({status}): {message}")]
pub struct PipelineError {
    pub kind: ErrorKind,
    pub status: u16,
    pub message: String,
}

impl PipelineError {
    pub fn new(kind: ErrorKind, status: u16, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    /// 400 validation failure.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, 400, message)
    }

    /// 401 authentication failure.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, 401, message)
    }

    /// Rate-limit rejection using the configured distinguished status.
    pub fn rate_limited(status: u16) -> Self {
        Self::new(ErrorKind::Policy, status, "Rate limit exceeded")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, 404, message)
    }

    /// 500 failure raised by handler code.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Handler, 500, message)
    }
}
