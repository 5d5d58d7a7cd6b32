//! Shared types, error model, and configuration for the course importer.
//!
//! This crate is the foundation depended on by all other importer crates.
//! It provides:
//! - [`CourseImportError`]: the unified error type and its [`ImportErrorKind`] taxonomy
//! - Domain types ([`FieldSuggestion`], [`CourseFieldSuggestions`], [`CourseImportResult`])
//! - Configuration ([`AppConfig`], [`ImporterConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ImporterConfig, ImporterSection, config_dir, config_file_path, init_config,
    load_config, load_config_from, validate_config,
};
pub use error::{CourseImportError, ImportErrorKind, Result};
pub use types::{
    Confidence, CourseFieldSuggestions, CourseImportResult, CourseItem, Difficulty,
    FieldSuggestion, ImportMetadata, ImportTimings, Instructor,
};
