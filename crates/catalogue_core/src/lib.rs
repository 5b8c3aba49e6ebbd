//! Core engine for per-attribute, per-locale catalogue values.
//! This crate is the single source of truth for catalogue resolution rules.

pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;

pub use config::CatalogueConfig;
pub use engine::catalogue_engine::{
    AttributeRecord, AttributeValue, CatalogueEngine, CatalogueError, CatalogueResult,
};
pub use engine::mutators::MutatorRegistry;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::catalogue_item::{CatalogueItem, OwnerRef};
pub use repo::catalogue_repo::{
    CatalogueRepository, RepoError, RepoResult, SqliteCatalogueRepository,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
