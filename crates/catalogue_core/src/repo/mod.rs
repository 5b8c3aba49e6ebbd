//! Repository layer for catalogue row persistence.
//!
//! # Responsibility
//! - Define the row-store contract required by the engine.
//! - Isolate SQLite query details behind that contract.
//!
//! # Invariants
//! - `upsert_item` leaves exactly one row per `(owner, key, locale)`.
//! - Configured column names are validated before SQL interpolation.

pub mod catalogue_repo;
