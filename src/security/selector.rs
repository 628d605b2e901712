use std::sync::Arc;
use tracing::{debug, warn};

use super::guards::{ApiTokenGuard, AuthGuard, BasicGuard, JwtGuard, RedirectGuard};
use super::{AuthMethod, AuthProvider};
use crate::error::ConfigError;
use crate::meta::AuthAnnotation;

/// Maps auth declarations to guards.
#[derive(Clone)]
pub struct AuthSelector {
    provider: Option<Arc<dyn AuthProvider>>,
    realm: String,
}

impl AuthSelector {
    pub fn new(provider: Option<Arc<dyn AuthProvider>>, realm: impl Into<String>) -> Self {
        Self {
            provider,
            realm: realm.into(),
        }
    }

    /// Selector with no provider: every declaration yields an open route.
    pub fn disabled() -> Self {
        Self::new(None, "nubes")
    }

    #[must_use]
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Check a declaration without building a guard.
    ///
    /// `location` names the declaring controller or method in error messages.
    pub fn validate(annotation: &AuthAnnotation, location: &str) -> Result<AuthMethod, ConfigError> {
        let method: AuthMethod =
            annotation
                .method
                .parse()
                .map_err(|()| ConfigError::UnsupportedAuthMethod {
                    location: location.to_string(),
                    method: annotation.method.clone(),
                })?;

        if method == AuthMethod::Redirect
            && annotation
                .redirect_url
                .as_deref()
                .map_or(true, |u| u.trim().is_empty())
        {
            return Err(ConfigError::MissingRedirectTarget {
                location: location.to_string(),
            });
        }
        Ok(method)
    }

    /// Build the guard for a declaration.
    ///
    /// Returns `Ok(None)` when no provider is configured; the declaration
    /// is validated first regardless.
    pub fn select(
        &self,
        annotation: &AuthAnnotation,
        location: &str,
    ) -> Result<Option<Arc<dyn AuthGuard>>, ConfigError> {
        let method = Self::validate(annotation, location)?;

        let Some(provider) = &self.provider else {
            warn!(
                location = %location,
                method = %method,
                "No auth provider configured, route left unguarded"
            );
            return Ok(None);
        };
        let provider = Arc::clone(provider);

        let guard: Arc<dyn AuthGuard> = match method {
            AuthMethod::Basic => Arc::new(BasicGuard::new(provider, &self.realm)),
            AuthMethod::Jwt => Arc::new(JwtGuard::new(provider)),
            AuthMethod::ApiToken => Arc::new(ApiTokenGuard::new(provider)),
            AuthMethod::Redirect => {
                let target = annotation.redirect_url.clone().unwrap_or_default();
                Arc::new(RedirectGuard::new(provider, target))
            }
        };
        debug!(location = %location, method = %method, "Auth guard selected");
        Ok(Some(guard))
    }
}

impl std::fmt::Debug for AuthSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSelector")
            .field("has_provider", &self.has_provider())
            .field("realm", &self.realm)
            .finish()
    }
}
