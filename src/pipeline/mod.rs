//! Pipeline specification, validation, and execution.
//!
//! ## Submodules
//!
//! - [`spec`] — declarative pipeline specification (stages + parameters)
//! - [`artifacts`] — typed network/clustering artifacts and naming contract
//! - [`validation`] — whole-pipeline dependency validator
//! - [`runner`] — orchestration and artifact threading
//! - [`observer`] — logging and timing hooks
//! - [`errors`] / [`error_code`] — error taxonomy

pub mod artifacts;
pub mod error_code;
pub mod errors;
pub mod observer;
pub mod runner;
pub mod spec;
pub mod validation;

// Re-export the types most callers need.
pub use artifacts::{ClusteringArtifact, NetworkArtifact, RunDirectory, StageResult};
pub use error_code::ErrorCode;
pub use errors::{PipelineError, Result};
pub use observer::{NoopObserver, PipelineObserver, StageReport, TracingObserver};
pub use runner::{PipelineRunner, PipelineState};
pub use spec::{ParamMap, PipelineSpec, StageSpec};
pub use validation::{resolve_derived_params, ValidationEngine, ValidationReport};
