//! Compile-only test to verify public API surface.
//!
//! This file serves as a compile-time contract for the public API.
//! If this file fails to compile, the public API has regressed.

// This test is about compile-time verification, not runtime usage
#![allow(unused_imports)]

// ============================================================================
// Core Types
// ============================================================================

// reflection module - entity model
use quire::reflection::{
    ClassEntity, ClassId, ClassKind, ConstantEntity, DocBlock, Entity, EntityKind, FunctionEntity,
    MethodEntity, Modifiers, ParameterEntity, PropertyEntity, Reflection, ReflectionError, Tag,
    ThrownException, Visibility,
};

// project module - project-wide entity table
use quire::project::{ClassRef, Project};

// config module - project settings
use quire::config::{MemberOrdering, ProjectConfig, SortConfig, CONFIG_FILE_NAME, DEFAULT_THEME};

// store module - entity persistence
use quire::store::{JsonStore, MemoryStore, Store, StoreError, StoreResult};

// diff module - change detection
use quire::diff::{Diff, DiffError, DiffSummary, Snapshot, SNAPSHOT_FILE_NAME};

// hash module - content hashing
use quire::hash::ContentHash;

// render module - orchestrator, themes, helpers
use quire::render::{
    describe, snippet, LinkHelper, NamespaceTreeBuilder, RenderError, RenderProgress,
    RenderStage, Renderer, SearchIndex, SearchIndexer, TemplateEngine, TemplateError, Theme,
    ThemeManifest, ThemeSet, TreeBuilder, MANIFEST_FILE_NAME,
};

// error module - error types and codes
use quire::error::{OutputErrorCode, QuireError};

// ============================================================================
// Front Door
// ============================================================================

use quire::cli::{run_clean, run_import, run_render, run_status, CliSettings};
use quire::engine::PlaceholderEngine;
use quire::output::{
    emit_response, CleanResponse, DiffResponse, ErrorInfo, ErrorResponse, ImportResponse,
    SCHEMA_VERSION,
};

// ============================================================================
// Test
// ============================================================================

#[test]
fn api_surface_compiles() {
    let _ = std::any::type_name::<ClassEntity>();
    let _ = std::any::type_name::<Project>();
    let _ = std::any::type_name::<JsonStore>();
    let _ = std::any::type_name::<Diff>();
    let _ = std::any::type_name::<Renderer<PlaceholderEngine>>();
    let _ = std::any::type_name::<QuireError>();
    let _ = std::any::type_name::<ErrorResponse>();
}

#[test]
fn schema_version_is_stable() {
    assert_eq!(SCHEMA_VERSION, "1");
}
