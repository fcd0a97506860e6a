//! Name-keyed asset registries.
//!
//! Meshes and materials are looked up by name. The lookup lives behind this
//! one small component so string keys don't leak through the renderer; an
//! insert under an existing name overwrites (last write wins) and logs a
//! warning instead of failing, which is what a terrain reload relies on.

use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct NamedRegistry<T> {
    entries: HashMap<String, Arc<T>>,
}

impl<T> NamedRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register `value` under `name`, returning a shared handle to it.
    ///
    /// Overwriting an existing name is allowed and logged; handles issued for
    /// the previous value stay valid for as long as their holders keep them.
    pub fn insert(&mut self, name: &str, value: T) -> Arc<T> {
        let value = Arc::new(value);
        if self
            .entries
            .insert(name.to_string(), value.clone())
            .is_some()
        {
            log::warn!("registry entry {:?} overwritten", name);
        }
        value
    }

    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.entries.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup() {
        let mut registry = NamedRegistry::new();
        registry.insert("vehicle", 7u32);
        assert_eq!(registry.get("vehicle").as_deref(), Some(&7));
        assert!(registry.get("terrain").is_none());
    }

    #[test]
    fn overwrite_is_last_write_wins_and_keeps_old_handles_alive() {
        let mut registry = NamedRegistry::new();
        let first = registry.insert("terrain", 1u32);
        let second = registry.insert("terrain", 2u32);
        assert_eq!(registry.len(), 1);
        assert_eq!(*first, 1);
        assert_eq!(*second, 2);
        assert_eq!(registry.get("terrain").as_deref(), Some(&2));
    }
}
