//! Pipeline orchestration for the question-bank build.
//!
//! Ties the normalizer, segmenter, rule engine, and packer together into
//! per-stage runners and an end-to-end `run_all`.

pub mod pipeline;

pub use pipeline::{
    GenerateReport, IngestReport, ProgressReporter, RunReport, SegmentReport, SilentProgress,
    generate, ingest, pack, rules_from_config, run_all, segment,
};
