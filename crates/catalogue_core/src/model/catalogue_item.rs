//! Catalogue item domain model.
//!
//! # Responsibility
//! - Define one localized value row and its polymorphic owner reference.
//!
//! # Invariants
//! - `(owner, key, locale)` identifies at most one item.
//! - `id == None` marks a detached item that is not backed by a row yet.

use serde::{Deserialize, Serialize};

/// Discriminated reference to the entity a catalogue item belongs to.
///
/// One catalogue table serves any number of owner entity types; the pair
/// `(kind, id)` is the compound key tying a row back to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRef {
    /// Owner entity discriminator, e.g. a table or type name.
    pub kind: String,
    /// Row id of the owner within its own storage.
    pub id: i64,
}

impl OwnerRef {
    pub fn new(kind: impl Into<String>, id: i64) -> Self {
        Self {
            kind: kind.into(),
            id,
        }
    }
}

/// One localized value: a `(key, locale, value)` triple owned by one entity.
///
/// Storage internals (`id`, `owner`) are hidden from serialized output, so
/// external consumers only ever see the `{key, value, locale}` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueItem {
    /// Storage row id. `None` until the item is persisted.
    #[serde(skip)]
    pub id: Option<i64>,
    /// Attribute name on the owning entity.
    pub key: String,
    /// Localized text value.
    pub value: String,
    /// Short language tag, e.g. `en`.
    pub locale: String,
    /// Owning entity reference. `None` while the owner itself is unpersisted.
    #[serde(skip)]
    pub owner: Option<OwnerRef>,
}

impl CatalogueItem {
    /// Creates a detached item that is not yet backed by a storage row.
    pub fn detached(
        key: impl Into<String>,
        locale: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            key: key.into(),
            value: value.into(),
            locale: locale.into(),
            owner: None,
        }
    }

    /// Returns whether this item is backed by a storage row.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
