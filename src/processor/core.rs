use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::pipeline::{Outcome, RequestContext};

pub trait Processor: Send + Sync {
    /// Short name used in logs and route listings.
    fn name(&self) -> &str;

    fn pre_handle(&self, _ctx: &mut RequestContext) -> Outcome {
        Outcome::Continue
    }

    fn post_handle(&self, _ctx: &mut RequestContext) -> Outcome {
        Outcome::Continue
    }
}

/// Annotation type → processor instance.
#[derive(Default, Clone)]
pub struct ProcessorRegistry {
    bindings: HashMap<String, Arc<dyn Processor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `processor` to `annotation`, replacing any previous binding.
    pub fn register(&mut self, annotation: impl Into<String>, processor: Arc<dyn Processor>) {
        let annotation = annotation.into();
        debug!(
            annotation = %annotation,
            processor = processor.name(),
            "Processor registered"
        );
        self.bindings.insert(annotation, processor);
    }

    pub fn get(&self, annotation: &str) -> Option<Arc<dyn Processor>> {
        self.bindings.get(annotation).map(Arc::clone)
    }

    #[must_use]
    pub fn contains(&self, annotation: &str) -> bool {
        self.bindings.contains_key(annotation)
    }

    /// Registered annotation types, sorted.
    pub fn annotations(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("annotations", &self.annotations())
            .finish()
    }
}
