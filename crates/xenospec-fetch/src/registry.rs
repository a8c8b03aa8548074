// crates/xenospec-fetch/src/registry.rs
// ============================================================================
// Module: XenoSpec Module Registry
// Description: The in-memory module registry consulted before filesystem
// roots when resolving a dotted-name specifier.
// Purpose: Implement spec.md §4.7 step 4's "already-registered modules are
// visible" rule without ever dynamically importing source modules.
// Dependencies: indexmap, xenospec-yaml
// ============================================================================

//! ## Overview
//! A [`ModuleRegistry`] holds already-registered, named [`Node`] trees.
//! Registration is always explicit — the engine embedding XenoSpec decides
//! what is visible under which name. This is the safety property named in
//! spec.md §4.7: fetch never imports source modules on the caller's behalf.

use indexmap::IndexMap;
use xenospec_yaml::Node;

/// Registry of in-memory modules, keyed by their first dotted-name segment.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: IndexMap<String, Node>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            modules: IndexMap::new(),
        }
    }

    /// Registers a module under a name, replacing any prior registration.
    pub fn register(&mut self, name: impl Into<String>, value: Node) {
        self.modules.insert(name.into(), value);
    }

    /// Returns the module registered under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.modules.get(name)
    }

    /// Returns `true` if a module is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }
}
