//! Iterative k-core (`ikc`) adapter — the seeding method for `aoc`.
//!
//! The IKC wrapper expects a headerless comma-delimited edge list, so the
//! canonical network is converted into a scratch file first; the conversion
//! is owned by a drop-guard and removed whether or not the tool succeeds.
//! IKC's raw output is likewise headerless comma, canonicalized on the way
//! out.

use std::path::PathBuf;

use crate::config::ToolPaths;
use crate::exec::{ensure_success, ProcessRequest};
use crate::format::{convert, Delimiter, HeaderSpec};
use crate::pipeline::artifacts::{StageResult, TempArtifact};
use crate::pipeline::errors::Result;

use super::{check_preconditions, finalize_stage, InvokeContext, MethodAdapter, MethodDescriptor};

static IKC: MethodDescriptor = MethodDescriptor {
    name: "ikc",
    required_params: &[],
    optional_params: &["k"],
    needs_existing_clustering: false,
};

pub struct IkcAdapter {
    script: PathBuf,
    python: String,
}

impl IkcAdapter {
    pub fn new(tools: &ToolPaths) -> Self {
        Self {
            script: tools.module_script("run_ikc.py"),
            python: tools.python.clone(),
        }
    }
}

impl MethodAdapter for IkcAdapter {
    fn descriptor(&self) -> &'static MethodDescriptor {
        &IKC
    }

    fn invoke(&self, ctx: &InvokeContext<'_>) -> Result<StageResult> {
        check_preconditions(&IKC, ctx.params, ctx.clustering)?;
        let stage = ctx.stage_view(IKC.name);

        let edges = ctx.run_dir.scratch(ctx.stage_index, "ikc_edges.csv");
        convert(
            ctx.network.path(),
            &edges,
            Delimiter::Comma,
            HeaderSpec::Strip,
        )?;
        let _edges_guard = TempArtifact::new(&edges);

        let raw = ctx.run_dir.scratch(ctx.stage_index, "ikc_raw.csv");
        let _raw_guard = TempArtifact::new(&raw);

        let mut request = ProcessRequest::new(&self.python)
            .arg(self.script.to_string_lossy())
            .args([
                "--edgelist".to_string(),
                edges.to_string_lossy().into_owned(),
                "--output".to_string(),
                raw.to_string_lossy().into_owned(),
            ])
            .timeout(ctx.timeout);

        if let Some(k) = stage.param_display("k") {
            request = request.args(["-k".to_string(), k]);
        }

        let output = ctx.runner.run(&request)?;
        ensure_success(&self.script.to_string_lossy(), &output)?;

        finalize_stage(ctx, IKC.name, &raw)
    }
}
