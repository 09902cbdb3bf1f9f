//! Pipeline specification types.
//!
//! A [`PipelineSpec`] is an ordered list of stages, each naming a clustering
//! method and its parameter set. Order is significant: it is the execution
//! order, not a DAG.
//!
//! # JSON shape
//!
//! The canonical form is a list, which allows the same method at two
//! different stages:
//!
//! ```json
//! [
//!   { "method": "ikc", "params": { "k": 10 } },
//!   { "method": "wcc", "params": { "threshold": "1log10" } }
//! ]
//! ```
//!
//! The legacy object form (method names as keys, insertion order as
//! execution order) is still accepted on load:
//!
//! ```json
//! { "ikc": { "k": 10 }, "wcc": {} }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{PipelineError, Result};

/// Parameter set for one stage: raw JSON values keyed by parameter name.
pub type ParamMap = serde_json::Map<String, Value>;

/// One stage of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSpec {
    /// Method name; must be in the adapter registry.
    pub method: String,

    /// Method parameters.
    #[serde(default)]
    pub params: ParamMap,
}

impl StageSpec {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: ParamMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Typed accessors. Each returns `None` when the parameter is absent
    /// or has an incompatible JSON type.
    pub fn param_u64(&self, key: &str) -> Option<u64> {
        self.params.get(key).and_then(Value::as_u64)
    }

    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.params.get(key).and_then(Value::as_f64)
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    pub fn param_bool(&self, key: &str) -> Option<bool> {
        self.params.get(key).and_then(Value::as_bool)
    }

    /// Render a parameter as a command-line argument value.
    pub fn param_display(&self, key: &str) -> Option<String> {
        self.params.get(key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// An ordered pipeline specification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineSpec {
    pub stages: Vec<StageSpec>,
}

impl PipelineSpec {
    pub fn new(stages: Vec<StageSpec>) -> Self {
        Self { stages }
    }

    /// Parse a spec from a JSON value, accepting both the canonical list
    /// form and the legacy object form.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(_) => {
                let stages: Vec<StageSpec> = serde_json::from_value(value)
                    .map_err(|e| PipelineError::spec_parse(e.to_string()))?;
                Ok(Self { stages })
            }
            Value::Object(map) => {
                // Legacy form: insertion order is execution order.
                let mut stages = Vec::with_capacity(map.len());
                for (method, params) in map {
                    let params = match params {
                        Value::Object(p) => p,
                        Value::Null => ParamMap::new(),
                        other => {
                            return Err(PipelineError::spec_parse(format!(
                                "parameters for method '{method}' must be an object, found {other}"
                            )))
                        }
                    };
                    stages.push(StageSpec { method, params });
                }
                Ok(Self { stages })
            }
            other => Err(PipelineError::spec_parse(format!(
                "expected a JSON list or object, found {other}"
            ))),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| PipelineError::spec_parse(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        Self::from_json_str(&json)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Iterate stages in execution order with their 0-based index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &StageSpec)> {
        self.stages.iter().enumerate()
    }
}
