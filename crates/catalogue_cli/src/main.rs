//! Schema scaffolding entry point.
//!
//! # Responsibility
//! - Emit the catalogue-items schema SQL for external migration tooling.
//! - Keep output deterministic so it can be piped into migration files.

fn main() {
    println!("-- catalogue_core v{}", catalogue_core::core_version());
    println!("{}", catalogue_core::db::migrations::schema_sql());
}
