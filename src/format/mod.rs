//! Format toolkit — delimiter detection, canonical schema validation, and
//! lossless reformatting of the tabular artifacts that flow between stages.
//!
//! Every artifact handed to an adapter, and every artifact an adapter
//! produces, must satisfy the canonical schema the *next* consumer expects,
//! regardless of which delimiter or header convention the producing tool
//! used natively. This module is the only place that knows about delimiters
//! and headers; adapters and the orchestrator deal in canonical files.

pub mod delimiter;
pub mod table;

pub use delimiter::{detect_delimiter, has_header, Delimiter};
pub use table::{
    convert, convert_to_canonical, read_table, validate_canonical, ArtifactKind, HeaderSpec,
    Table,
};
