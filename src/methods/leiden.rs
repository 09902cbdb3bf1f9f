//! Leiden adapters (`leiden-mod`, `leiden-cpm`).
//!
//! Both variants run the `run_leiden.py` wrapper script. The script sniffs
//! the input delimiter itself, so the canonical network file is passed
//! through unmodified. Its output is a headered `node_id`/`cluster_id`
//! table in the input's delimiter, canonicalized here before returning.

use std::path::PathBuf;

use crate::config::ToolPaths;
use crate::exec::{ensure_success, ProcessRequest};
use crate::pipeline::artifacts::{StageResult, TempArtifact};
use crate::pipeline::errors::Result;

use super::{check_preconditions, finalize_stage, InvokeContext, MethodAdapter, MethodDescriptor};

static LEIDEN_MOD: MethodDescriptor = MethodDescriptor {
    name: "leiden-mod",
    required_params: &[],
    optional_params: &["n_iterations", "seed"],
    needs_existing_clustering: false,
};

static LEIDEN_CPM: MethodDescriptor = MethodDescriptor {
    name: "leiden-cpm",
    // CPM is meaningless without a resolution value.
    required_params: &["res"],
    optional_params: &["n_iterations", "seed"],
    needs_existing_clustering: false,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeidenModel {
    Modularity,
    Cpm,
}

impl LeidenModel {
    fn flag_value(&self) -> &'static str {
        match self {
            Self::Modularity => "mod",
            Self::Cpm => "cpm",
        }
    }
}

pub struct LeidenAdapter {
    script: PathBuf,
    python: String,
    model: LeidenModel,
}

impl LeidenAdapter {
    pub fn modularity(tools: &ToolPaths) -> Self {
        Self {
            script: tools.module_script("run_leiden.py"),
            python: tools.python.clone(),
            model: LeidenModel::Modularity,
        }
    }

    pub fn cpm(tools: &ToolPaths) -> Self {
        Self {
            script: tools.module_script("run_leiden.py"),
            python: tools.python.clone(),
            model: LeidenModel::Cpm,
        }
    }
}

impl MethodAdapter for LeidenAdapter {
    fn descriptor(&self) -> &'static MethodDescriptor {
        match self.model {
            LeidenModel::Modularity => &LEIDEN_MOD,
            LeidenModel::Cpm => &LEIDEN_CPM,
        }
    }

    fn invoke(&self, ctx: &InvokeContext<'_>) -> Result<StageResult> {
        let descriptor = self.descriptor();
        check_preconditions(descriptor, ctx.params, ctx.clustering)?;
        let stage = ctx.stage_view(descriptor.name);

        let raw = ctx.run_dir.scratch(ctx.stage_index, "leiden_raw.csv");
        let _raw_guard = TempArtifact::new(&raw);

        let mut request = ProcessRequest::new(&self.python)
            .arg(self.script.to_string_lossy())
            .args([
                "--edgelist".to_string(),
                ctx.network.path().to_string_lossy().into_owned(),
                "--output".to_string(),
                raw.to_string_lossy().into_owned(),
                "--model".to_string(),
                self.model.flag_value().to_string(),
            ])
            .timeout(ctx.timeout);

        if self.model == LeidenModel::Cpm {
            // Presence guaranteed by the precondition check.
            if let Some(res) = stage.param_display("res") {
                request = request.args(["--resolution".to_string(), res]);
            }
        }
        if let Some(iters) = stage.param_display("n_iterations") {
            request = request.args(["--n-iterations".to_string(), iters]);
        }
        if let Some(seed) = stage.param_display("seed") {
            request = request.args(["--seed".to_string(), seed]);
        }

        let output = ctx.runner.run(&request)?;
        ensure_success(&self.script.to_string_lossy(), &output)?;

        finalize_stage(ctx, descriptor.name, &raw)
    }
}
