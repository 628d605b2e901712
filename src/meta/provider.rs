use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use super::types::ControllerDescriptor;

/// Source of controller metadata.
///
/// Discovery (annotation scanning, code generation, a manifest file) happens
/// behind this trait; the compiler only ever sees plain descriptors.
pub trait MetadataProvider: Send + Sync {
    /// Names of the controllers that produce routes, in discovery order.
    fn controller_names(&self) -> Vec<String>;

    /// Descriptor for any known controller type, routable or abstract.
    fn describe(&self, name: &str) -> Option<Arc<ControllerDescriptor>>;
}

/// On-disk manifest shape: a flat list of controller descriptors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub controllers: Vec<ControllerDescriptor>,
}

/// In-memory [`MetadataProvider`] preserving declaration order.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    controllers: Vec<Arc<ControllerDescriptor>>,
    index: HashMap<String, usize>,
}

impl StaticMetadata {
    pub fn new(controllers: Vec<ControllerDescriptor>) -> Self {
        let mut meta = Self::default();
        for controller in controllers {
            meta.insert(controller);
        }
        meta
    }

    /// Add or replace a controller descriptor. A replaced descriptor keeps its
    /// original discovery position.
    pub fn insert(&mut self, controller: ControllerDescriptor) {
        let name = controller.name.clone();
        let controller = Arc::new(controller);
        match self.index.get(&name) {
            Some(&idx) => {
                warn!(controller = %name, "Duplicate controller descriptor replaced");
                self.controllers[idx] = controller;
            }
            None => {
                self.index.insert(name, self.controllers.len());
                self.controllers.push(controller);
            }
        }
    }

    pub fn from_manifest(manifest: Manifest) -> Self {
        Self::new(manifest.controllers)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

impl MetadataProvider for StaticMetadata {
    fn controller_names(&self) -> Vec<String> {
        self.controllers
            .iter()
            .filter(|c| c.is_routable())
            .map(|c| c.name.clone())
            .collect()
    }

    fn describe(&self, name: &str) -> Option<Arc<ControllerDescriptor>> {
        self.index
            .get(name)
            .map(|&idx| Arc::clone(&self.controllers[idx]))
    }
}
