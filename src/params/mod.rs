//! Handler parameter resolution.
//!
//! Each declared parameter names a kind tag. The compiler looks the tag up
//! in the [`ResolverRegistry`] once and binds the resolver into the route;
//! at request time the bound resolver extracts the raw value, which is then
//! checked for presence and coerced to the declared [`ValueType`].
//!
//! Built-in kinds:
//!
//! | kind         | source                                                  |
//! |--------------|---------------------------------------------------------|
//! | `path`       | route pattern capture                                   |
//! | `query`      | query string (last occurrence wins)                     |
//! | `header`     | request header, case-insensitive                        |
//! | `body`       | the decoded JSON body                                   |
//! | `context`    | `request_id`, `client`, `method`, `path`, `url`, `principal` |
//! | `pagination` | pagination summary of a `Paginated` controller          |
//!
//! [`ValueType`]: crate::meta::ValueType

mod coerce;
mod resolver;

pub use coerce::coerce;
pub use resolver::{
    BodyResolver, BoundParam, ContextResolver, HeaderResolver, PaginationResolver, ParamResolver,
    PathResolver, QueryResolver, ResolverRegistry,
};
