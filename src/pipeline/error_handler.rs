use serde_json::json;
use tracing::warn;

use super::context::RequestContext;

/// Hook invoked once when a pipeline stage fails.
///
/// Implementations shape the error response; headers already set by earlier
/// stages (such as `WWW-Authenticate`) should be preserved.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, ctx: &mut RequestContext, status: u16, message: &str);
}

/// Writes `{"error": message, "status": status}` with the failing status.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle(&self, ctx: &mut RequestContext, status: u16, message: &str) {
        warn!(
            request_id = %ctx.request_id,
            controller = %ctx.controller,
            handler = %ctx.handler,
            status = status,
            message = %message,
            "Request failed"
        );
        ctx.response.status = status;
        ctx.response
            .set_json(json!({ "error": message, "status": status }));
    }
}
