//! Domain model for catalogue rows and owner references.
//!
//! # Responsibility
//! - Define the canonical localized-value record shared by repo and engine.
//!
//! # Invariants
//! - For one owner, at most one item exists per `(key, locale)` pair; the
//!   repository enforces this on every write.

pub mod catalogue_item;
