//! Hook registry.
//!
//! Maps each [`HookType`] to its ordered handler list. The list for a type
//! is fixed once the binary has wired its handlers; dispatch works on a
//! snapshot so later registration never affects an in-flight fan-out.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::handler::HookHandler;
use crate::types::{HookInfo, HookType};

/// Registry of lifecycle hook handlers.
///
/// Within a type, handlers are kept in registration order, stably sorted by
/// priority (descending).
#[derive(Default)]
pub struct HookRegistry {
    hooks: BTreeMap<HookType, Vec<Arc<dyn HookHandler>>>,
}

impl HookRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler.
    ///
    /// A handler with the same name for the same type is replaced in place.
    pub fn register(&mut self, handler: Arc<dyn HookHandler>) {
        let hook_type = handler.hook_type();
        debug!(
            name = handler.name(),
            hook_type = %hook_type,
            priority = handler.priority(),
            "registering hook"
        );

        let handlers = self.hooks.entry(hook_type).or_default();
        if let Some(slot) = handlers.iter_mut().find(|h| h.name() == handler.name()) {
            *slot = handler;
        } else {
            handlers.push(handler);
        }
        handlers.sort_by_key(|h| std::cmp::Reverse(h.priority()));
    }

    /// Unregister a handler by name from every type.
    ///
    /// Returns `true` if anything was removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let mut found = false;
        for handlers in self.hooks.values_mut() {
            let before = handlers.len();
            handlers.retain(|h| h.name() != name);
            found |= handlers.len() < before;
        }
        if found {
            debug!(name, "unregistered hook");
        }
        found
    }

    /// Snapshot of the handlers for `hook_type`, in dispatch order.
    #[must_use]
    pub fn handlers_for(&self, hook_type: HookType) -> Vec<Arc<dyn HookHandler>> {
        self.hooks.get(&hook_type).cloned().unwrap_or_default()
    }

    /// Handler names for `hook_type`, in dispatch order.
    ///
    /// Each call allocates a new list; mutating it never touches the registry.
    #[must_use]
    pub fn registered_hook_names(&self, hook_type: HookType) -> Vec<String> {
        self.hooks
            .get(&hook_type)
            .map(|hs| hs.iter().map(|h| h.name().to_owned()).collect())
            .unwrap_or_default()
    }

    /// Every registered handler, grouped by type in lifecycle order.
    #[must_use]
    pub fn list_all(&self) -> Vec<HookInfo> {
        self.hooks
            .values()
            .flatten()
            .map(|h| HookInfo {
                name: h.name().to_owned(),
                hook_type: h.hook_type(),
                priority: h.priority(),
                description: h.description().map(ToOwned::to_owned),
                timeout_ms: h.timeout_ms(),
            })
            .collect()
    }

    /// Total number of registered handlers.
    #[must_use]
    pub fn count(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hook_count", &self.count())
            .finish()
    }
}
