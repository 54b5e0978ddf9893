//! Custom element registration
//!
//! Element names are claimed once; later definitions under the same name
//! are ignored, so loading the same resource twice is harmless.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::host::FoldHost;
use crate::row::FoldEntityRow;

/// Element name the fold row registers under
pub const FOLD_ROW_ELEMENT: &str = "fold-entity-row";

/// Constructor stored for a custom element
pub type ElementConstructor = fn(FoldHost) -> FoldEntityRow;

/// Registry of custom element constructors by name
pub struct ElementRegistry {
    definitions: DashMap<String, ElementConstructor>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self {
            definitions: DashMap::new(),
        }
    }

    /// Register `constructor` under `name` unless the name is taken
    ///
    /// Returns true if this call registered the element.
    pub fn define(&self, name: &str, constructor: ElementConstructor) -> bool {
        match self.definitions.entry(name.to_string()) {
            Entry::Occupied(_) => {
                trace!(name, "Element already defined");
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(constructor);
                debug!(name, "Defined element");
                true
            }
        }
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Construct a registered element
    pub fn create(&self, name: &str, host: FoldHost) -> Option<FoldEntityRow> {
        let constructor = *self.definitions.get(name)?;
        Some(constructor(host))
    }
}

impl Default for ElementRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Register the fold row element
pub fn define_fold_row(registry: &ElementRegistry) -> bool {
    registry.define(FOLD_ROW_ELEMENT, FoldEntityRow::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHost;

    fn other_constructor(host: FoldHost) -> FoldEntityRow {
        FoldEntityRow::new(host)
    }

    #[test]
    fn test_define_once() {
        let registry = ElementRegistry::new();
        assert!(!registry.is_defined(FOLD_ROW_ELEMENT));

        assert!(define_fold_row(&registry));
        assert!(!define_fold_row(&registry));
        assert!(!registry.define(FOLD_ROW_ELEMENT, other_constructor));
        assert!(registry.is_defined(FOLD_ROW_ELEMENT));
    }

    #[test]
    fn test_create() {
        let registry = ElementRegistry::new();
        define_fold_row(&registry);

        let host = MemoryHost::new();
        let row = registry.create(FOLD_ROW_ELEMENT, host.fold_host()).unwrap();
        assert!(row.config().is_none());
        assert!(registry.create("hui-unknown-row", host.fold_host()).is_none());
    }
}
