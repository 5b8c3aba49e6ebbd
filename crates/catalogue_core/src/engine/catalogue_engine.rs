//! Catalogue attribute resolution and mutation engine.
//!
//! # Responsibility
//! - Resolve reads per `(key, locale)` with fallback-locale substitution.
//! - Buffer writes for unpersisted owners and flush them exactly once on
//!   first persist.
//! - Keep the in-memory row cache coherent after every mutation.
//!
//! # Invariants
//! - Only declared catalogue attributes pass through the engine; everything
//!   else is rejected with `CatalogueError::NonCatalogable`.
//! - After any mutating call, this instance's cached view reflects the
//!   effect without re-fetching from storage.
//! - Known locales for fallback resolution are computed from persisted rows
//!   only, also while the owner is still unpersisted.

use crate::config::CatalogueConfig;
use crate::engine::mutators::MutatorRegistry;
use crate::model::catalogue_item::{CatalogueItem, OwnerRef};
use crate::repo::catalogue_repo::{CatalogueRepository, RepoError};
use log::info;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CatalogueResult<T> = Result<T, CatalogueError>;

/// Engine error for catalogue attribute operations.
#[derive(Debug)]
pub enum CatalogueError {
    /// The key is not declared as a catalogue attribute. Carries the valid
    /// key set for diagnostics.
    NonCatalogable {
        key: String,
        catalogue_attributes: Vec<String>,
    },
    /// Row-store failure, propagated as-is.
    Repo(RepoError),
}

impl Display for CatalogueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonCatalogable {
                key,
                catalogue_attributes,
            } => write!(
                f,
                "attribute `{key}` cannot be translated because it is not one of the catalogue attributes: {}",
                catalogue_attributes.join(", ")
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogueError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NonCatalogable { .. } => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for CatalogueError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Value accepted by the attribute-record write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// One value, stored under the current locale.
    Scalar(String),
    /// Locale-keyed values. Empty or numeric locale keys (list-style input)
    /// default to the current locale.
    PerLocale(Vec<(String, String)>),
}

/// Mixed input record used by the bulk-create path.
pub type AttributeRecord = BTreeMap<String, AttributeValue>;

/// Per-key, per-locale buffer for owners that are not persisted yet.
///
/// Flushed into rows exactly once when the owner first persists, then never
/// touched again.
#[derive(Debug, Default, Clone)]
struct PendingPool {
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl PendingPool {
    fn get(&self, key: &str, locale: &str) -> Option<&String> {
        self.entries.get(key).and_then(|locales| locales.get(locale))
    }

    fn set(&mut self, key: &str, locale: &str, value: String) {
        self.entries
            .entry(key.to_string())
            .or_default()
            .insert(locale.to_string(), value);
    }

    fn contains(&self, key: &str, locale: &str) -> bool {
        self.get(key, locale).is_some()
    }

    fn remove(&mut self, key: &str, locale: &str) {
        if let Some(locales) = self.entries.get_mut(key) {
            locales.remove(locale);
            if locales.is_empty() {
                self.entries.remove(key);
            }
        }
    }

    fn remove_locale(&mut self, locale: &str) {
        for locales in self.entries.values_mut() {
            locales.remove(locale);
        }
        self.entries.retain(|_, locales| !locales.is_empty());
    }

    fn entries_for(&self, key: &str) -> BTreeMap<String, String> {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    fn snapshot(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        self.entries.clone()
    }

    fn take(&mut self) -> BTreeMap<String, BTreeMap<String, String>> {
        std::mem::take(&mut self.entries)
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Catalogue engine held by one owner entity instance.
///
/// Owner entities compose this engine and delegate their catalogue-attribute
/// access to it; plain attributes never enter the engine.
pub struct CatalogueEngine<R: CatalogueRepository> {
    repo: R,
    config: CatalogueConfig,
    owner_kind: String,
    owner_id: Option<i64>,
    catalogue_attributes: Vec<String>,
    mutators: MutatorRegistry,
    pool: PendingPool,
    cache: Option<Vec<CatalogueItem>>,
}

impl<R: CatalogueRepository> CatalogueEngine<R> {
    /// Creates an engine for an owner that is not persisted yet.
    ///
    /// Writes go to the pending pool until [`Self::mark_persisted`] runs.
    pub fn new(
        repo: R,
        config: CatalogueConfig,
        owner_kind: impl Into<String>,
        catalogue_attributes: Vec<String>,
    ) -> Self {
        Self {
            repo,
            config,
            owner_kind: owner_kind.into(),
            owner_id: None,
            catalogue_attributes,
            mutators: MutatorRegistry::new(),
            pool: PendingPool::default(),
            cache: None,
        }
    }

    /// Creates an engine bound to an already-persisted owner.
    pub fn for_owner(
        repo: R,
        config: CatalogueConfig,
        owner: OwnerRef,
        catalogue_attributes: Vec<String>,
    ) -> Self {
        let mut engine = Self::new(repo, config, owner.kind, catalogue_attributes);
        engine.owner_id = Some(owner.id);
        engine
    }

    pub fn is_persisted(&self) -> bool {
        self.owner_id.is_some()
    }

    /// Returns the owner reference once the owner is persisted.
    pub fn owner(&self) -> Option<OwnerRef> {
        self.owner_id
            .map(|id| OwnerRef::new(self.owner_kind.clone(), id))
    }

    pub fn config(&self) -> &CatalogueConfig {
        &self.config
    }

    /// Registry of per-attribute read/write transforms.
    pub fn mutators_mut(&mut self) -> &mut MutatorRegistry {
        &mut self.mutators
    }

    /// Declared catalogue attribute keys.
    pub fn catalogue_attributes(&self) -> &[String] {
        &self.catalogue_attributes
    }

    pub fn is_catalogue_attribute(&self, key: &str) -> bool {
        self.catalogue_attributes.iter().any(|attr| attr == key)
    }

    /// Returns the value for `(key, locale)` after locale normalisation.
    ///
    /// Missing values resolve to `None`; only undeclared keys are an error.
    pub fn item(
        &mut self,
        key: &str,
        locale: &str,
        use_fallback: bool,
    ) -> CatalogueResult<Option<String>> {
        self.guard(key)?;
        let locale = self.normalised_locale(key, locale, use_fallback)?;

        let raw = match self.owner() {
            None => self.pool.get(key, &locale).cloned(),
            Some(owner) => self
                .cached_items(&owner)?
                .iter()
                .find(|item| item.key == key && item.locale == locale)
                .map(|item| item.value.clone()),
        };

        Ok(match self.mutators.get_mutator(key) {
            Some(mutator) => mutator(raw),
            None => raw,
        })
    }

    /// Returns the value for `key` at `locale`, with fallback resolution.
    pub fn translate(&mut self, key: &str, locale: &str) -> CatalogueResult<Option<String>> {
        self.item(key, locale, true)
    }

    /// Current-locale read at the attribute-access boundary.
    ///
    /// Absent values are coerced to an empty string.
    pub fn attribute_value(&mut self, key: &str) -> CatalogueResult<String> {
        let locale = self.config.current_locale.clone();
        Ok(self.item(key, &locale, true)?.unwrap_or_default())
    }

    /// Sets one value for `(key, locale)`, chaining-friendly.
    pub fn set_item(
        &mut self,
        key: &str,
        locale: &str,
        value: impl Into<String>,
    ) -> CatalogueResult<&mut Self> {
        self.write_item(key, locale, value.into())?;
        Ok(self)
    }

    /// Sets several locale entries for one key, returning the first item set.
    ///
    /// Empty or numeric locale keys default to the current locale.
    pub fn set_many(
        &mut self,
        key: &str,
        entries: &[(String, String)],
    ) -> CatalogueResult<Option<CatalogueItem>> {
        self.guard(key)?;

        let mut first = None;
        for (locale, value) in entries {
            let locale = self.effective_locale(locale).to_string();
            let item = self.write_item(key, &locale, value.clone())?;
            if first.is_none() {
                first = Some(item);
            }
        }

        Ok(first)
    }

    /// Attribute-access boundary write: scalars go to the current locale,
    /// locale maps fan out entry by entry.
    pub fn set_attribute_value(
        &mut self,
        key: &str,
        value: AttributeValue,
    ) -> CatalogueResult<Option<CatalogueItem>> {
        match value {
            AttributeValue::Scalar(value) => {
                let locale = self.config.current_locale.clone();
                Ok(Some(self.write_item(key, &locale, value)?))
            }
            AttributeValue::PerLocale(entries) => self.set_many(key, &entries),
        }
    }

    /// Returns whether a value exists for `(key, locale)`.
    ///
    /// Defaults the locale to the current one. No fallback resolution.
    pub fn has_item(&mut self, key: &str, locale: Option<&str>) -> CatalogueResult<bool> {
        let locale = locale.unwrap_or(&self.config.current_locale).to_string();

        match self.owner() {
            None => Ok(self.pool.contains(key, &locale)),
            Some(owner) => Ok(self
                .cached_items(&owner)?
                .iter()
                .any(|item| item.key == key && item.locale == locale)),
        }
    }

    /// Removes the exact `(key, locale)` value; missing entries are a no-op.
    pub fn forget_item(&mut self, key: &str, locale: &str) -> CatalogueResult<&mut Self> {
        match self.owner() {
            None => self.pool.remove(key, locale),
            Some(owner) => {
                self.repo.delete_where(&owner, Some(key), Some(locale))?;
                self.cached_items(&owner)?
                    .retain(|item| !(item.key == key && item.locale == locale));
            }
        }

        Ok(self)
    }

    /// Removes every key's value for one locale.
    pub fn forget_locale(&mut self, locale: &str) -> CatalogueResult<&mut Self> {
        match self.owner() {
            None => self.pool.remove_locale(locale),
            Some(owner) => {
                self.repo.delete_where(&owner, None, Some(locale))?;
                self.cached_items(&owner)?
                    .retain(|item| item.locale != locale);
            }
        }

        Ok(self)
    }

    /// All values grouped by key, then locale.
    pub fn all_translations(
        &mut self,
    ) -> CatalogueResult<BTreeMap<String, BTreeMap<String, String>>> {
        match self.owner() {
            None => Ok(self.pool.snapshot()),
            Some(owner) => {
                let mut grouped: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
                for item in self.cached_items(&owner)?.iter() {
                    grouped
                        .entry(item.key.clone())
                        .or_default()
                        .insert(item.locale.clone(), item.value.clone());
                }
                Ok(grouped)
            }
        }
    }

    /// Locale-to-value mapping for one key.
    pub fn items_for(&mut self, key: &str) -> CatalogueResult<BTreeMap<String, String>> {
        self.guard(key)?;

        match self.owner() {
            None => Ok(self.pool.entries_for(key)),
            Some(owner) => Ok(self
                .cached_items(&owner)?
                .iter()
                .filter(|item| item.key == key)
                .map(|item| (item.locale.clone(), item.value.clone()))
                .collect()),
        }
    }

    /// Distinct locales with a persisted value for `key`, in first-seen order.
    ///
    /// Pending-pool entries are intentionally not consulted: for an
    /// unpersisted owner this returns an empty set, so fallback substitution
    /// applies even when the pool holds the requested locale.
    pub fn locales_for(&mut self, key: &str) -> CatalogueResult<Vec<String>> {
        let Some(owner) = self.owner() else {
            return Ok(Vec::new());
        };

        let items = self.cached_items(&owner)?;
        let mut locales: Vec<String> = Vec::new();
        for item in items.iter().filter(|item| item.key == key) {
            if !locales.contains(&item.locale) {
                locales.push(item.locale.clone());
            }
        }

        Ok(locales)
    }

    /// Splits declared catalogue keys out of a mixed input record.
    ///
    /// Extracted keys are removed from `record` so the plain-field creator
    /// never sees them.
    pub fn extract_catalogue_fields(&self, record: &mut AttributeRecord) -> AttributeRecord {
        let mut extracted = AttributeRecord::new();
        for key in &self.catalogue_attributes {
            if let Some(value) = record.remove(key) {
                extracted.insert(key.clone(), value);
            }
        }
        extracted
    }

    /// Writes every entry of an extracted record through the normal set paths.
    pub fn apply_record(&mut self, record: AttributeRecord) -> CatalogueResult<()> {
        for (key, value) in record {
            self.set_attribute_value(&key, value)?;
        }
        Ok(())
    }

    /// Marks the owner as durably stored and flushes the pending pool.
    ///
    /// Every pooled `(key, locale)` pair becomes one row and the cache is
    /// seeded with the created rows. The pool is cleared only after every
    /// row is created, so a failed flush keeps the pooled values and a
    /// later call retries them. Calling this again with an empty pool is a
    /// no-op.
    pub fn mark_persisted(&mut self, owner_id: i64) -> CatalogueResult<()> {
        self.owner_id = Some(owner_id);
        if self.pool.is_empty() {
            return Ok(());
        }

        let owner = OwnerRef::new(self.owner_kind.clone(), owner_id);
        let pooled = self.pool.snapshot();
        let mut created = Vec::new();
        for (key, locales) in &pooled {
            for (locale, value) in locales {
                let locale = self.effective_locale(locale);
                created.push(self.repo.insert_item(&owner, key, locale, value)?);
            }
        }
        self.pool.take();

        info!(
            "event=catalogue_flush module=engine status=ok owner={}:{} items={}",
            owner.kind,
            owner.id,
            created.len()
        );
        self.cache = Some(created);

        Ok(())
    }

    fn guard(&self, key: &str) -> CatalogueResult<()> {
        if self.is_catalogue_attribute(key) {
            return Ok(());
        }

        Err(CatalogueError::NonCatalogable {
            key: key.to_string(),
            catalogue_attributes: self.catalogue_attributes.clone(),
        })
    }

    // Get-time interpretation mapping: redirects which locale's value is
    // read, never creates data.
    fn normalised_locale(
        &mut self,
        key: &str,
        locale: &str,
        use_fallback: bool,
    ) -> CatalogueResult<String> {
        let known = self.locales_for(key)?;
        if known.iter().any(|l| l == locale) {
            return Ok(locale.to_string());
        }

        if !use_fallback {
            return Ok(locale.to_string());
        }

        if let Some(fallback) = &self.config.fallback_locale {
            return Ok(fallback.clone());
        }

        Ok(locale.to_string())
    }

    // Empty or numeric locale keys stem from list-style input records.
    fn effective_locale<'a>(&'a self, locale: &'a str) -> &'a str {
        if locale.is_empty() || locale.chars().all(|c| c.is_ascii_digit()) {
            &self.config.current_locale
        } else {
            locale
        }
    }

    fn write_item(
        &mut self,
        key: &str,
        locale: &str,
        value: String,
    ) -> CatalogueResult<CatalogueItem> {
        self.guard(key)?;

        let value = match self.mutators.set_mutator(key) {
            Some(mutator) => mutator(value, locale),
            None => value,
        };

        match self.owner() {
            None => {
                self.pool.set(key, locale, value.clone());
                Ok(CatalogueItem::detached(key, locale, value))
            }
            Some(owner) => {
                let fresh = self.repo.upsert_item(&owner, key, locale, &value)?;
                let cache = self.cached_items(&owner)?;
                cache.retain(|item| !(item.key == key && item.locale == locale));
                cache.push(fresh.clone());
                Ok(fresh)
            }
        }
    }

    fn cached_items(&mut self, owner: &OwnerRef) -> CatalogueResult<&mut Vec<CatalogueItem>> {
        if self.cache.is_none() {
            self.cache = Some(self.repo.items_for_owner(owner)?);
        }
        Ok(self.cache.get_or_insert_with(Vec::new))
    }
}
