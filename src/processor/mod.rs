//! Class-level processors: hooks bound to a controller annotation that wrap
//! every route of that controller.
//!
//! A processor's `pre_handle` runs before any filter and its `post_handle`
//! after every after filter. One instance serves every controller carrying
//! its annotation, so implementations must be `Send + Sync` and keep any
//! shared state internally synchronized.

mod core;

pub use self::core::{Processor, ProcessorRegistry};
