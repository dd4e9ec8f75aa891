//! Document extension hooks.
//!
//! Hooks run after a document is assembled and may edit top-level `links`
//! and `meta` and the payload of every emitted relationship. They run in
//! registration order.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::model::{Links, RelationshipLinkage, ResourceIdentifier};

/// Callback invoked while a document is finalised.
pub trait DocumentHook: Send + Sync {
    /// Called once per emitted relationship of every resource object.
    fn on_relationship(
        &self,
        _resource: &ResourceIdentifier,
        _name: &str,
        _linkage: &mut RelationshipLinkage,
    ) {
    }

    /// Called once per document with its top-level links and meta.
    fn on_document(&self, _links: &mut Links, _meta: &mut Map<String, Value>) {}
}

/// Ordered list of hooks.
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn DocumentHook>>,
}

impl HookRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook.
    pub fn register(&mut self, hook: Arc<dyn DocumentHook>) {
        self.hooks.push(hook);
    }

    /// Returns the number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns true if no hook is registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub(crate) fn apply_relationship(
        &self,
        resource: &ResourceIdentifier,
        name: &str,
        linkage: &mut RelationshipLinkage,
    ) {
        for hook in &self.hooks {
            hook.on_relationship(resource, name, linkage);
        }
    }

    pub(crate) fn apply_document(&self, links: &mut Links, meta: &mut Map<String, Value>) {
        for hook in &self.hooks {
            hook.on_document(links, meta);
        }
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
