//! Stochastic-block-model fitting adapter (`sbm`).
//!
//! Runs the `run_sbm.py` wrapper, which sniffs the input delimiter itself
//! and writes a headered `node_id`/`cluster_id` table.

use std::path::PathBuf;

use crate::config::ToolPaths;
use crate::exec::{ensure_success, ProcessRequest};
use crate::pipeline::artifacts::{StageResult, TempArtifact};
use crate::pipeline::errors::Result;

use super::{check_preconditions, finalize_stage, InvokeContext, MethodAdapter, MethodDescriptor};

static SBM: MethodDescriptor = MethodDescriptor {
    name: "sbm",
    required_params: &[],
    optional_params: &["degree_corrected"],
    needs_existing_clustering: false,
};

pub struct SbmAdapter {
    script: PathBuf,
    python: String,
}

impl SbmAdapter {
    pub fn new(tools: &ToolPaths) -> Self {
        Self {
            script: tools.module_script("run_sbm.py"),
            python: tools.python.clone(),
        }
    }
}

impl MethodAdapter for SbmAdapter {
    fn descriptor(&self) -> &'static MethodDescriptor {
        &SBM
    }

    fn invoke(&self, ctx: &InvokeContext<'_>) -> Result<StageResult> {
        check_preconditions(&SBM, ctx.params, ctx.clustering)?;
        let stage = ctx.stage_view(SBM.name);

        let raw = ctx.run_dir.scratch(ctx.stage_index, "sbm_raw.tsv");
        let _raw_guard = TempArtifact::new(&raw);

        let mut request = ProcessRequest::new(&self.python)
            .arg(self.script.to_string_lossy())
            .args([
                "--edgelist".to_string(),
                ctx.network.path().to_string_lossy().into_owned(),
                "--output".to_string(),
                raw.to_string_lossy().into_owned(),
            ])
            .timeout(ctx.timeout);

        if stage.param_bool("degree_corrected").unwrap_or(false) {
            request = request.arg("--degree-corrected");
        }

        let output = ctx.runner.run(&request)?;
        ensure_success(&self.script.to_string_lossy(), &output)?;

        finalize_stage(ctx, SBM.name, &raw)
    }
}
