//! Request-scoped services installed as class-level processors.
//!
//! - [`rate_limit`]: sliding-window limiter for `RateLimited` controllers.
//! - [`pagination`]: paging state and `Link` headers for `Paginated`
//!   controllers.

pub mod pagination;
pub mod rate_limit;

pub use pagination::{
    compute_total_pages, PaginationConfig, PaginationProcessor, PaginationState,
    PaginationSummary, PAGINATED, PAGINATION_ATTR,
};
pub use rate_limit::{
    ClientAccessRecord, Decision, RateLimitConfig, RateLimitProcessor, RateLimiter, RATE_LIMITED,
};
