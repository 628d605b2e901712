use base64::{engine::general_purpose, Engine as _};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{AuthMethod, AuthProvider, Credentials};
use crate::error::PipelineError;
use crate::pipeline::{Outcome, RequestContext, PRINCIPAL_ATTR};

/// Header carrying an API token.
pub const API_TOKEN_HEADER: &str = "X-Api-Token";
/// Query parameter fallback for API tokens.
pub const API_TOKEN_QUERY: &str = "api_token";
/// Cookie holding the session id checked by redirect authentication.
pub const SESSION_COOKIE: &str = "nubes.session";

/// Request-time authentication check bound into a route.
pub trait AuthGuard: Send + Sync {
    fn method(&self) -> AuthMethod;

    /// `Continue` with the principal stored, `Fail` with 401, or `Halt` for
    /// a redirect.
    fn check(&self, ctx: &mut RequestContext) -> Outcome;
}

fn accept(ctx: &mut RequestContext, principal: Value) -> Outcome {
    debug!(request_id = %ctx.request_id, "Request authenticated");
    ctx.attributes.insert(PRINCIPAL_ATTR, principal);
    Outcome::Continue
}

fn authorization_scheme<'a>(ctx: &'a RequestContext, scheme: &str) -> Option<&'a str> {
    let header = ctx.request.get_header("authorization")?;
    let (name, value) = header.trim().split_once(' ')?;
    name.eq_ignore_ascii_case(scheme).then(|| value.trim())
}

pub struct BasicGuard {
    provider: Arc<dyn AuthProvider>,
    challenge: String,
}

impl BasicGuard {
    pub fn new(provider: Arc<dyn AuthProvider>, realm: &str) -> Self {
        Self {
            provider,
            challenge: format!("Basic realm=\"{realm}\""),
        }
    }

    fn credentials(ctx: &RequestContext) -> Option<Credentials> {
        let encoded = authorization_scheme(ctx, "basic")?;
        let decoded = general_purpose::STANDARD.decode(encoded).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some(Credentials::Basic {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn reject(&self, ctx: &mut RequestContext, message: &str) -> Outcome {
        ctx.response
            .set_header("WWW-Authenticate", self.challenge.clone());
        Outcome::Fail(PipelineError::unauthorized(message))
    }
}

impl AuthGuard for BasicGuard {
    fn method(&self) -> AuthMethod {
        AuthMethod::Basic
    }

    fn check(&self, ctx: &mut RequestContext) -> Outcome {
        let Some(credentials) = Self::credentials(ctx) else {
            return self.reject(ctx, "Missing or malformed basic credentials");
        };
        match self.provider.authenticate(&credentials) {
            Some(principal) => accept(ctx, principal),
            None => {
                warn!(request_id = %ctx.request_id, "Basic credentials rejected");
                self.reject(ctx, "Invalid credentials")
            }
        }
    }
}

pub struct JwtGuard {
    provider: Arc<dyn AuthProvider>,
}

impl JwtGuard {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self { provider }
    }
}

impl AuthGuard for JwtGuard {
    fn method(&self) -> AuthMethod {
        AuthMethod::Jwt
    }

    fn check(&self, ctx: &mut RequestContext) -> Outcome {
        let token = authorization_scheme(ctx, "bearer")
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let principal = token.and_then(|t| self.provider.authenticate(&Credentials::Bearer(t)));
        match principal {
            Some(principal) => accept(ctx, principal),
            None => {
                warn!(request_id = %ctx.request_id, "Bearer token missing or rejected");
                ctx.response
                    .set_header("WWW-Authenticate", "Bearer".to_string());
                Outcome::Fail(PipelineError::unauthorized("Invalid or missing bearer token"))
            }
        }
    }
}

pub struct ApiTokenGuard {
    provider: Arc<dyn AuthProvider>,
}

impl ApiTokenGuard {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self { provider }
    }
}

impl AuthGuard for ApiTokenGuard {
    fn method(&self) -> AuthMethod {
        AuthMethod::ApiToken
    }

    fn check(&self, ctx: &mut RequestContext) -> Outcome {
        let token = ctx
            .request
            .get_header(API_TOKEN_HEADER)
            .or_else(|| ctx.request.get_query_param(API_TOKEN_QUERY))
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let principal = token.and_then(|t| self.provider.authenticate(&Credentials::ApiToken(t)));
        match principal {
            Some(principal) => accept(ctx, principal),
            None => {
                warn!(request_id = %ctx.request_id, "API token missing or rejected");
                Outcome::Fail(PipelineError::unauthorized("Invalid or missing API token"))
            }
        }
    }
}

/// Session check that sends unauthenticated callers to a login page.
pub struct RedirectGuard {
    provider: Arc<dyn AuthProvider>,
    target: String,
}

impl RedirectGuard {
    pub fn new(provider: Arc<dyn AuthProvider>, target: impl Into<String>) -> Self {
        Self {
            provider,
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl AuthGuard for RedirectGuard {
    fn method(&self) -> AuthMethod {
        AuthMethod::Redirect
    }

    fn check(&self, ctx: &mut RequestContext) -> Outcome {
        let session = ctx
            .request
            .get_cookie(SESSION_COOKIE)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let principal =
            session.and_then(|s| self.provider.authenticate(&Credentials::Session(s)));
        match principal {
            Some(principal) => accept(ctx, principal),
            None => {
                debug!(
                    request_id = %ctx.request_id,
                    location = %self.target,
                    "No valid session, redirecting"
                );
                ctx.response.status = 302;
                ctx.response.set_header("Location", self.target.clone());
                Outcome::Halt
            }
        }
    }
}
