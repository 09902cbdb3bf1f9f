//! Connectivity-modularity pipeline adapter (`cm`).
//!
//! Post-processes an existing clustering, re-clustering poorly-connected
//! communities with the named base method until every cluster meets the
//! connectivity threshold. Both `clustering` (base method name) and
//! `threshold` (e.g. `"1log10"`) are required.

use std::path::PathBuf;

use crate::config::ToolPaths;
use crate::exec::{ensure_success, ProcessRequest};
use crate::pipeline::artifacts::{StageResult, TempArtifact};
use crate::pipeline::errors::{PipelineError, Result};

use super::{check_preconditions, finalize_stage, InvokeContext, MethodAdapter, MethodDescriptor};

static CM: MethodDescriptor = MethodDescriptor {
    name: "cm",
    required_params: &["clustering", "threshold"],
    optional_params: &[],
    needs_existing_clustering: true,
};

pub struct CmAdapter {
    script: PathBuf,
    python: String,
}

impl CmAdapter {
    pub fn new(tools: &ToolPaths) -> Self {
        Self {
            script: tools.module_script("run_cm.py"),
            python: tools.python.clone(),
        }
    }
}

impl MethodAdapter for CmAdapter {
    fn descriptor(&self) -> &'static MethodDescriptor {
        &CM
    }

    fn invoke(&self, ctx: &InvokeContext<'_>) -> Result<StageResult> {
        check_preconditions(&CM, ctx.params, ctx.clustering)?;
        let stage = ctx.stage_view(CM.name);

        let clustering = ctx.clustering.ok_or_else(|| PipelineError::MissingInput {
            method: CM.name.to_string(),
        })?;

        let raw = ctx.run_dir.scratch(ctx.stage_index, "cm_raw.tsv");
        let _raw_guard = TempArtifact::new(&raw);

        // Presence of both parameters guaranteed by the precondition check.
        let base_method = stage.param_display("clustering").unwrap_or_default();
        let threshold = stage.param_display("threshold").unwrap_or_default();

        let request = ProcessRequest::new(&self.python)
            .arg(self.script.to_string_lossy())
            .args([
                "--edgelist".to_string(),
                ctx.network.path().to_string_lossy().into_owned(),
                "--existing-clustering".to_string(),
                clustering.path().to_string_lossy().into_owned(),
                "--clustering".to_string(),
                base_method,
                "--threshold".to_string(),
                threshold,
                "--output".to_string(),
                raw.to_string_lossy().into_owned(),
            ])
            .timeout(ctx.timeout);

        let output = ctx.runner.run(&request)?;
        ensure_success(&self.script.to_string_lossy(), &output)?;

        finalize_stage(ctx, CM.name, &raw)
    }
}
