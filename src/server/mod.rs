//! Request/response types exchanged with the transport collaborator.
//!
//! The HTTP transport itself lives outside this crate. A transport builds a
//! [`Request`], calls [`Application::handle`](crate::app::Application::handle)
//! and serializes the returned [`Response`].

pub mod request;
pub mod response;

pub use request::{
    parse_cookies, parse_query_params, HeaderVec, ParamVec, Request, RequestBuilder,
    MAX_INLINE_HEADERS, MAX_INLINE_PARAMS, UNKNOWN_CLIENT,
};
pub use response::{status_reason, Body, Response};
