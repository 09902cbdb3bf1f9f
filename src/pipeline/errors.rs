//! Error types for the pipeline lifecycle.
//!
//! A single [`PipelineError`] enum covers both build-time problems (spec
//! parsing, parameter validation, dependency ordering) and execution-time
//! failures (format conversion, external tool errors). Every variant maps to
//! a stable [`ErrorCode`] for programmatic matching.
//!
//! Parameter and dependency errors are always raised *before* any external
//! process is launched; format and tool errors abort the enclosing pipeline
//! run at the point of detection. There is no partial-pipeline resume.

use std::path::PathBuf;

use thiserror::Error;

use super::error_code::ErrorCode;

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Unified error type for pipeline validation and execution.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No supported delimiter (comma, space, tab) was found on a data line.
    #[error("unsupported delimiter in {path} at line {line_number}: {line:?} (expected comma, space, or tab)")]
    UnsupportedDelimiter {
        path: PathBuf,
        line_number: usize,
        line: String,
    },

    /// A tabular artifact does not satisfy the canonical schema.
    #[error("schema validation failed for {path}: {message}")]
    SchemaValidation { path: PathBuf, message: String },

    /// A stage omits a parameter its method requires.
    #[error("method '{method}' is missing required parameter '{param}'")]
    MissingParameter { method: String, param: String },

    /// A refinement method was invoked without an existing clustering.
    #[error("method '{method}' requires an existing clustering from an earlier stage")]
    MissingInput { method: String },

    /// A stage names a method absent from the registry.
    #[error("unknown method '{method}'")]
    UnknownMethod { method: String },

    /// The pipeline's method ordering violates a structural precondition.
    #[error("dependency violation for method '{method}': {message}")]
    Dependency { method: String, message: String },

    /// An external clustering tool exited with a non-zero status.
    #[error("external tool '{program}' exited with status {status}: {stderr}")]
    ExternalTool {
        program: String,
        status: i32,
        stderr: String,
    },

    /// An external clustering tool exceeded the configured timeout.
    #[error("external tool '{program}' timed out after {timeout_secs}s")]
    ExternalToolTimeout { program: String, timeout_secs: u64 },

    /// The pipeline specification file could not be parsed.
    #[error("invalid pipeline specification: {message}")]
    SpecParse { message: String },

    /// An I/O operation failed; carries the path it operated on.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// The stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedDelimiter { .. } => ErrorCode::UnsupportedDelimiter,
            Self::SchemaValidation { .. } => ErrorCode::SchemaValidation,
            Self::MissingParameter { .. } => ErrorCode::MissingParameter,
            Self::MissingInput { .. } => ErrorCode::MissingInput,
            Self::UnknownMethod { .. } => ErrorCode::UnknownMethod,
            Self::Dependency { .. } => ErrorCode::Dependency,
            Self::ExternalTool { .. } => ErrorCode::ExternalTool,
            Self::ExternalToolTimeout { .. } => ErrorCode::ExternalToolTimeout,
            Self::SpecParse { .. } => ErrorCode::SpecParse,
            Self::Io { .. } => ErrorCode::Io,
        }
    }

    /// Attach a path to a raw `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn schema(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SchemaValidation {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn missing_parameter(method: impl Into<String>, param: impl Into<String>) -> Self {
        Self::MissingParameter {
            method: method.into(),
            param: param.into(),
        }
    }

    pub fn dependency(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Dependency {
            method: method.into(),
            message: message.into(),
        }
    }

    pub fn spec_parse(message: impl Into<String>) -> Self {
        Self::SpecParse {
            message: message.into(),
        }
    }
}
