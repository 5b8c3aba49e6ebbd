//! Per-attribute value transform registry.

use std::collections::BTreeMap;

/// Transform applied to a resolved raw value on read.
pub type GetMutator = Box<dyn Fn(Option<String>) -> Option<String>>;

/// Transform applied to `(value, locale)` before storage on write.
pub type SetMutator = Box<dyn Fn(String, &str) -> String>;

/// Registry mapping attribute keys to optional read/write transforms.
///
/// Populated at entity-definition time and looked up by key; the engine
/// never derives transform names dynamically.
#[derive(Default)]
pub struct MutatorRegistry {
    get_mutators: BTreeMap<String, GetMutator>,
    set_mutators: BTreeMap<String, SetMutator>,
}

impl MutatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a read transform for one attribute key.
    pub fn register_get(
        &mut self,
        key: impl Into<String>,
        mutator: impl Fn(Option<String>) -> Option<String> + 'static,
    ) {
        self.get_mutators.insert(key.into(), Box::new(mutator));
    }

    /// Registers a write transform for one attribute key.
    pub fn register_set(
        &mut self,
        key: impl Into<String>,
        mutator: impl Fn(String, &str) -> String + 'static,
    ) {
        self.set_mutators.insert(key.into(), Box::new(mutator));
    }

    pub fn get_mutator(&self, key: &str) -> Option<&GetMutator> {
        self.get_mutators.get(key)
    }

    pub fn set_mutator(&self, key: &str) -> Option<&SetMutator> {
        self.set_mutators.get(key)
    }
}
