//! Path routing for compiled routes.
//!
//! Each route pattern becomes an anchored regex; captured segments are
//! percent-decoded into path parameters. A trailing slash on the request
//! path is ignored.

mod core;
#[cfg(test)]
mod tests;

pub use self::core::{RouteMatch, Router};
