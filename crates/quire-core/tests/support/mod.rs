//! Shared test support utilities.
//!
//! This module provides a recording template engine and fixtures for
//! on-disk themes and projects.

pub mod engine;
pub mod fixtures;
