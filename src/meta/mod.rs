//! # Controller metadata
//!
//! Plain descriptor records standing in for annotated controller classes.
//! A [`MetadataProvider`] yields, per controller: its base path, declared
//! methods with their route/filter/auth annotations and parameter kinds,
//! class-level annotation types and its superclass.
//!
//! [`StaticMetadata`] is the in-tree provider. It is built in code with the
//! descriptor builders or loaded from a YAML/JSON manifest:
//!
//! ```yaml
//! controllers:
//!   - name: ItemsController
//!     base_path: /items
//!     extends: BaseController
//!     annotations: [Paginated, RateLimited]
//!     methods:
//!       - name: list
//!         route: { path: "/", method: GET }
//!       - name: log
//!         filter: { direction: before, priority: 1 }
//! ```

mod load;
mod provider;
mod types;

pub use load::{load_manifest, manifest_from_json_str, manifest_from_yaml_str};
pub use provider::{Manifest, MetadataProvider, StaticMetadata};
pub use types::{
    AuthAnnotation, ControllerDescriptor, FilterAnnotation, MethodDescriptor, ParamDescriptor,
    RouteAnnotation, ValueType,
};

/// Sentinel superclass name terminating every inheritance chain.
pub const ROOT_CONTROLLER: &str = "Object";
