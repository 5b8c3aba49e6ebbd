//! Catalogue resolution and mutation engine.
//!
//! # Responsibility
//! - Decide, per attribute key and locale, what value to read or write.
//! - Reconcile the pre-persistence pending pool against persisted rows.
//!
//! # Invariants
//! - Only declared catalogue attributes pass through the engine.
//! - After any mutating call, the instance's cached view reflects the
//!   effect without a re-fetch from storage.

pub mod catalogue_engine;
pub mod mutators;
