//! Injected configuration for the catalogue engine.
//!
//! # Responsibility
//! - Carry locale and schema-naming settings as one explicit value.
//! - Keep the engine free of process-global configuration lookups.
//!
//! # Invariants
//! - `locale_identifier` and `morph_name` are plain SQL identifiers; the
//!   repository rejects anything else before interpolating them into SQL.

/// Value object configuring locale resolution and row-store column naming.
///
/// Constructed once by the embedding application and handed to engine and
/// repository at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogueConfig {
    /// Locale used when callers do not name one explicitly.
    pub current_locale: String,
    /// Locale substituted when the requested locale has no stored value.
    pub fallback_locale: Option<String>,
    /// Column name tagging each row's locale.
    pub locale_identifier: String,
    /// Prefix for the polymorphic owner columns (`<morph>_type`, `<morph>_id`).
    pub morph_name: String,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            current_locale: "en".to_string(),
            fallback_locale: None,
            locale_identifier: "lang".to_string(),
            morph_name: "catalogable".to_string(),
        }
    }
}

impl CatalogueConfig {
    /// Returns the config with a different current locale.
    pub fn with_current_locale(mut self, locale: impl Into<String>) -> Self {
        self.current_locale = locale.into();
        self
    }

    /// Returns the config with a fallback locale enabled.
    pub fn with_fallback_locale(mut self, locale: impl Into<String>) -> Self {
        self.fallback_locale = Some(locale.into());
        self
    }

    /// Returns the config with a different locale column name.
    pub fn with_locale_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.locale_identifier = identifier.into();
        self
    }

    /// Column name holding the owner discriminator.
    pub fn owner_type_column(&self) -> String {
        format!("{}_type", self.morph_name)
    }

    /// Column name holding the owner row id.
    pub fn owner_id_column(&self) -> String {
        format!("{}_id", self.morph_name)
    }
}

#[cfg(test)]
mod tests {
    use super::CatalogueConfig;

    #[test]
    fn defaults_match_conventional_schema_naming() {
        let config = CatalogueConfig::default();
        assert_eq!(config.current_locale, "en");
        assert_eq!(config.fallback_locale, None);
        assert_eq!(config.locale_identifier, "lang");
        assert_eq!(config.owner_type_column(), "catalogable_type");
        assert_eq!(config.owner_id_column(), "catalogable_id");
    }

    #[test]
    fn builder_helpers_override_single_fields() {
        let config = CatalogueConfig::default()
            .with_current_locale("it")
            .with_fallback_locale("en");
        assert_eq!(config.current_locale, "it");
        assert_eq!(config.fallback_locale.as_deref(), Some("en"));
    }
}
