use serde_json::Value;
use std::sync::Arc;

use super::request::HeaderVec;

/// Response body accumulated by the pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    #[default]
    Empty,
    /// Text written in chunks by filters and handlers
    Text(String),
    Json(Value),
}

/// Response state shared by every stage of a request pipeline.
///
/// Stages mutate it in place; the transport serializes whatever is left once
/// the pipeline reaches a terminal state.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: Body,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// An empty `200 OK` response.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: HeaderVec::new(),
            body: Body::Empty,
        }
    }

    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut res = Self::new();
        res.status = status;
        res.set_json(body);
        res
    }

    /// JSON error payload `{ "error": message, "status": status }`.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(
            status,
            serde_json::json!({ "error": message, "status": status }),
        )
    }

    /// Append a text chunk to the body. A JSON body is replaced.
    pub fn write(&mut self, chunk: &str) {
        match &mut self.body {
            Body::Text(buf) => buf.push_str(chunk),
            other => *other = Body::Text(chunk.to_string()),
        }
    }

    pub fn set_json(&mut self, body: Value) {
        self.set_header("content-type", "application/json".to_string());
        self.body = Body::Json(body);
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            Body::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(v) => Some(v),
            _ => None,
        }
    }

    /// First header with this name (case-insensitive).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace every header with this name.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Add a header, keeping existing values with the same name.
    pub fn add_header(&mut self, name: &str, value: String) {
        self.headers.push((Arc::from(name), value));
    }
}

/// Canonical reason phrase for the statuses this crate emits.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        302 => "Found",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        420 => "Enhance Your Calm",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
