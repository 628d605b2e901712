//! Transport-facing request type.
//!
//! A transport collaborator converts its native request into a [`Request`]
//! before handing it to [`Application::handle`](crate::app::Application::handle).
//! Header and parameter storage is inline (`SmallVec`) for the common case.

use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Maximum inline headers/cookies before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Maximum inline path/query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Header or cookie storage; names are shared `Arc<str>`.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Path or query parameter storage.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Identity used when the transport could not determine the remote host.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// An incoming request as supplied by the transport.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Absolute URL as received, query string included
    pub url: String,
    /// Decoded query string parameters, in order of appearance
    pub query_params: ParamVec,
    /// HTTP headers
    pub headers: HeaderVec,
    /// Cookies parsed from the `Cookie` header
    pub cookies: HeaderVec,
    /// Remote client identity (remote host)
    pub client: String,
    /// JSON body, if the transport decoded one
    pub body: Option<Value>,
}

impl Request {
    /// Start building a request for `target`, which may be an absolute URL
    /// or an origin-form path such as `/items?page=2`.
    pub fn builder(method: Method, target: &str) -> RequestBuilder {
        RequestBuilder {
            method,
            target: target.to_string(),
            headers: HeaderVec::new(),
            client: UNKNOWN_CLIENT.to_string(),
            body: None,
        }
    }

    /// Get a query parameter by name.
    ///
    /// Last occurrence wins for repeated names (`?page=1&page=2` yields `2`).
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Builder for [`Request`], used by transports and tests.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    target: String,
    headers: HeaderVec,
    client: String,
    body: Option<Value>,
}

impl RequestBuilder {
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    /// Remote host of the caller; keys rate-limit state.
    pub fn client(mut self, client: impl Into<String>) -> Self {
        self.client = client.into();
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn build(self) -> Request {
        let (path, url, query_params) = split_target(&self.target, &self.headers);
        let cookies = parse_cookies(&self.headers);
        debug!(
            method = %self.method,
            path = %path,
            query_count = query_params.len(),
            header_count = self.headers.len(),
            "Request built"
        );
        Request {
            method: self.method,
            path,
            url,
            query_params,
            headers: self.headers,
            cookies,
            client: self.client,
            body: self.body,
        }
    }
}

/// Resolve a request target into `(path, absolute url, query params)`.
///
/// Origin-form targets are made absolute using the `Host` header, falling
/// back to `localhost`.
fn split_target(target: &str, headers: &HeaderVec) -> (String, String, ParamVec) {
    let parsed = Url::parse(target).or_else(|_| {
        let host = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("host"))
            .map(|(_, v)| v.as_str())
            .unwrap_or("localhost");
        Url::parse(&format!("http://{host}/")).and_then(|base| base.join(target))
    });
    match parsed {
        Ok(url) => {
            let query = url
                .query_pairs()
                .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
                .collect();
            (url.path().to_string(), url.as_str().to_string(), query)
        }
        Err(_) => {
            let path = target.split('?').next().unwrap_or("/").to_string();
            (path, target.to_string(), parse_query_params(target))
        }
    }
}

/// Parse query string parameters from a path or URL.
///
/// Everything after the first `?` is form-url-decoded.
pub fn parse_query_params(target: &str) -> ParamVec {
    match target.split_once('?') {
        Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
            .collect(),
        None => ParamVec::new(),
    }
}

/// Extract cookies from the `Cookie` header.
pub fn parse_cookies(headers: &HeaderVec) -> HeaderVec {
    headers
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case("cookie"))
        .flat_map(|(_, c)| c.split(';'))
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim().to_string();
            Some((Arc::from(name), value))
        })
        .collect()
}
