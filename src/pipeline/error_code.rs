//! Stable error codes shared by every pipeline error.
//!
//! Codes are serialized in `snake_case` and are part of the crate's public
//! contract: callers match on the code rather than on message text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable, machine-matchable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A tabular file uses none of the supported delimiters.
    UnsupportedDelimiter,
    /// A tabular file is missing required columns or has the wrong shape.
    SchemaValidation,
    /// A stage omits a parameter its method requires.
    MissingParameter,
    /// A refinement method was invoked without an existing clustering.
    MissingInput,
    /// A stage names a method that is not in the registry.
    UnknownMethod,
    /// The pipeline's method ordering violates a structural precondition.
    Dependency,
    /// An external clustering tool exited with a non-zero status.
    ExternalTool,
    /// An external clustering tool exceeded the configured timeout.
    ExternalToolTimeout,
    /// The pipeline specification file could not be parsed.
    SpecParse,
    /// An underlying I/O operation failed.
    Io,
}

impl ErrorCode {
    /// The `snake_case` name used in JSON and in `Display` output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedDelimiter => "unsupported_delimiter",
            Self::SchemaValidation => "schema_validation",
            Self::MissingParameter => "missing_parameter",
            Self::MissingInput => "missing_input",
            Self::UnknownMethod => "unknown_method",
            Self::Dependency => "dependency",
            Self::ExternalTool => "external_tool",
            Self::ExternalToolTimeout => "external_tool_timeout",
            Self::SpecParse => "spec_parse",
            Self::Io => "io",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
