//! Core infrastructure for quire.
//!
//! This crate provides the incremental documentation build pipeline:
//! - Reflection model for documented classes, members and functions
//! - Project table with lazy cross-entity resolution
//! - Entity stores (in-memory and content-addressed JSON files)
//! - Render diff against the last committed snapshot
//! - Render orchestrator, themes and template helpers
//! - Error types and error codes

pub mod config;
pub mod diff;
pub mod error;
mod fsutil;
pub mod hash;
pub mod project;
pub mod reflection;
pub mod render;
pub mod store;
