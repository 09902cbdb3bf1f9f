//! # graph-cluster-pipeline
//!
//! Orchestrates a sequence of graph-clustering methods (in-process wrapper
//! scripts and external binaries) into a single multi-stage pipeline: each
//! stage consumes the network and/or clustering produced by the previous
//! stage, runs one clustering method, and emits a new clustering that feeds
//! the next stage.
//!
//! The crate does not implement any clustering algorithm. Its job is the
//! orchestration core:
//!
//! - **Format toolkit** ([`format`]) — delimiter detection, canonical
//!   schema validation, lossless reformatting of tabular artifacts
//! - **Method adapter registry** ([`methods`]) — one adapter per supported
//!   method, each owning its parameter contract and native-format
//!   conversions
//! - **Dependency validator** ([`pipeline::validation`]) — rejects invalid
//!   method orderings before anything runs
//! - **Orchestrator** ([`pipeline::runner`]) — threads artifacts between
//!   stages and produces the final clustering

pub mod config;
pub mod exec;
pub mod format;
pub mod methods;
pub mod pipeline;

// Re-export commonly used types.
pub use config::{RunConfig, ToolPaths};
pub use exec::{ProcessOutput, ProcessRequest, ProcessRunner, SystemProcessRunner};
pub use format::{detect_delimiter, ArtifactKind, Delimiter, HeaderSpec};
pub use methods::{MethodAdapter, MethodDescriptor, MethodRegistry};
pub use pipeline::{
    ClusteringArtifact, ErrorCode, NetworkArtifact, PipelineError, PipelineRunner, PipelineSpec,
    PipelineState, Result, RunDirectory, StageSpec, ValidationEngine,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
