//! # Authentication
//!
//! Routes may declare an authentication method at class or method level.
//! At compile time the [`AuthSelector`] validates the declaration and turns
//! it into an [`AuthGuard`]; at request time the guard extracts credentials
//! and hands them to the application's [`AuthProvider`].
//!
//! | method      | credentials                                  | rejection                          |
//! |-------------|----------------------------------------------|------------------------------------|
//! | `BASIC`     | `Authorization: Basic base64(user:pass)`     | 401, `WWW-Authenticate: Basic`     |
//! | `JWT`       | `Authorization: Bearer <token>`              | 401, `WWW-Authenticate: Bearer`    |
//! | `API_TOKEN` | `X-Api-Token` header, else `api_token` query | 401                                |
//! | `REDIRECT`  | `nubes.session` cookie                       | 302 to the declared redirect URL   |
//!
//! Verification itself (password check, token signature, session lookup)
//! belongs to the provider. The crate only selects and drives it.
//!
//! ## No provider
//!
//! When the application is built without an [`AuthProvider`], every auth
//! declaration compiles to an unguarded route. Declarations are still
//! validated, so an unknown method or a redirect without target fails the
//! build either way.
//!
//! ```rust
//! use nubes::security::{AuthProvider, Credentials};
//! use serde_json::{json, Value};
//!
//! struct StaticTokens;
//!
//! impl AuthProvider for StaticTokens {
//!     fn authenticate(&self, credentials: &Credentials) -> Option<Value> {
//!         match credentials {
//!             Credentials::ApiToken(t) if t == "s3cret" => Some(json!({ "sub": "ci" })),
//!             _ => None,
//!         }
//!     }
//! }
//! ```

use serde_json::Value;
use std::str::FromStr;

mod guards;
mod selector;

pub use guards::{
    ApiTokenGuard, AuthGuard, BasicGuard, JwtGuard, RedirectGuard, API_TOKEN_HEADER,
    API_TOKEN_QUERY, SESSION_COOKIE,
};
pub use selector::AuthSelector;

/// Supported authentication methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMethod {
    Basic,
    Jwt,
    ApiToken,
    Redirect,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Basic => "BASIC",
            AuthMethod::Jwt => "JWT",
            AuthMethod::ApiToken => "API_TOKEN",
            AuthMethod::Redirect => "REDIRECT",
        }
    }
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = ();

    /// Case-insensitive; `-` is accepted for `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "BASIC" => Ok(AuthMethod::Basic),
            "JWT" => Ok(AuthMethod::Jwt),
            "API_TOKEN" => Ok(AuthMethod::ApiToken),
            "REDIRECT" => Ok(AuthMethod::Redirect),
            _ => Err(()),
        }
    }
}

/// Credentials extracted from a request by a guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { username: String, password: String },
    Bearer(String),
    ApiToken(String),
    /// Session identifier taken from the session cookie
    Session(String),
}

impl Credentials {
    pub fn method(&self) -> AuthMethod {
        match self {
            Credentials::Basic { .. } => AuthMethod::Basic,
            Credentials::Bearer(_) => AuthMethod::Jwt,
            Credentials::ApiToken(_) => AuthMethod::ApiToken,
            Credentials::Session(_) => AuthMethod::Redirect,
        }
    }
}

/// Application-supplied credential verification.
///
/// Returns the authenticated principal, stored on the request under the
/// `principal` attribute, or `None` to reject.
pub trait AuthProvider: Send + Sync {
    fn authenticate(&self, credentials: &Credentials) -> Option<Value>;
}
