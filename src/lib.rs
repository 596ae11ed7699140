//! quire: incremental API documentation builder.
//!
//! This crate is the front door over `quire-core`: it re-exports the core
//! modules and adds the CLI operations, a placeholder template engine and
//! the JSON response types printed by the `quire` binary.

// Re-export core modules
pub use quire_core::config;
pub use quire_core::diff;
pub use quire_core::error;
pub use quire_core::hash;
pub use quire_core::project;
pub use quire_core::reflection;
pub use quire_core::render;
pub use quire_core::store;

pub mod cli;
pub mod engine;
pub mod output;
