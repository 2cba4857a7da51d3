//! Shared types, error model, and configuration for qbank.
//!
//! This crate is the foundation depended on by all other qbank crates.
//! It provides:
//! - [`QbankError`], the unified error type
//! - The pipeline data model ([`IndexEntry`], [`Segment`], [`QuizItem`], [`RuleDef`])
//! - Configuration ([`AppConfig`], [`SegmenterConfig`], config loading)
//! - Lenient JSONL reading and writing

pub mod config;
pub mod error;
pub mod jsonl;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, PathsConfig, SegmenterConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{QbankError, Result};
pub use jsonl::{JsonlRecords, parse_jsonl, read_jsonl, to_jsonl, write_jsonl};
pub use types::{
    Answer, Assets, FrontMatter, IndexEntry, ItemKind, QuizItem, RuleDef, Segment, SetMode,
    TRUE_FALSE_CHOICES,
};
