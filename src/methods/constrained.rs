//! Constrained-clustering adapters (`wcc`, `cc`).
//!
//! Both refine an existing clustering by running the external
//! `constrained_clustering` binary in `MincutOnly` mode; they differ only in
//! the connectedness criterion (`wcc` = well-connectedness, criterion 1;
//! `cc` = plain connectivity, criterion 0). The binary expects headerless
//! tab-delimited inputs, so both artifacts are converted into stage-scoped
//! scratch files guarded for cleanup.

use std::path::PathBuf;

use crate::config::ToolPaths;
use crate::exec::{ensure_success, ProcessRequest};
use crate::format::{convert, Delimiter, HeaderSpec};
use crate::pipeline::artifacts::{StageResult, TempArtifact};
use crate::pipeline::errors::{PipelineError, Result};

use super::{check_preconditions, finalize_stage, InvokeContext, MethodAdapter, MethodDescriptor};

static WCC: MethodDescriptor = MethodDescriptor {
    name: "wcc",
    required_params: &[],
    optional_params: &["threshold"],
    needs_existing_clustering: true,
};

static CC: MethodDescriptor = MethodDescriptor {
    name: "cc",
    required_params: &[],
    optional_params: &[],
    needs_existing_clustering: true,
};

pub struct ConstrainedAdapter {
    binary: PathBuf,
    descriptor: &'static MethodDescriptor,
    connectedness_criterion: u8,
}

impl ConstrainedAdapter {
    /// Well-connected clusters variant.
    pub fn wcc(tools: &ToolPaths) -> Self {
        Self {
            binary: tools.external_binary("constrained_clustering"),
            descriptor: &WCC,
            connectedness_criterion: 1,
        }
    }

    /// Connected clusters variant.
    pub fn cc(tools: &ToolPaths) -> Self {
        Self {
            binary: tools.external_binary("constrained_clustering"),
            descriptor: &CC,
            connectedness_criterion: 0,
        }
    }
}

impl MethodAdapter for ConstrainedAdapter {
    fn descriptor(&self) -> &'static MethodDescriptor {
        self.descriptor
    }

    fn invoke(&self, ctx: &InvokeContext<'_>) -> Result<StageResult> {
        let name = self.descriptor.name;
        check_preconditions(self.descriptor, ctx.params, ctx.clustering)?;
        let stage = ctx.stage_view(name);

        // Guaranteed by the precondition check.
        let clustering = ctx.clustering.ok_or_else(|| PipelineError::MissingInput {
            method: name.to_string(),
        })?;

        let edges = ctx.run_dir.scratch(ctx.stage_index, "mincut_edges.tsv");
        convert(
            ctx.network.path(),
            &edges,
            Delimiter::Tab,
            HeaderSpec::Strip,
        )?;
        let _edges_guard = TempArtifact::new(&edges);

        let existing = ctx.run_dir.scratch(ctx.stage_index, "mincut_existing.tsv");
        convert(
            clustering.path(),
            &existing,
            Delimiter::Tab,
            HeaderSpec::Strip,
        )?;
        let _existing_guard = TempArtifact::new(&existing);

        let raw = ctx.run_dir.scratch(ctx.stage_index, "mincut_raw.tsv");
        let _raw_guard = TempArtifact::new(&raw);
        let log_file = ctx.run_dir.stage_log(ctx.stage_index, name);

        let mut request = ProcessRequest::new(self.binary.to_string_lossy())
            .arg("MincutOnly")
            .args([
                "--edgelist".to_string(),
                edges.to_string_lossy().into_owned(),
                "--existing-clustering".to_string(),
                existing.to_string_lossy().into_owned(),
                "--output-file".to_string(),
                raw.to_string_lossy().into_owned(),
                "--num-processors".to_string(),
                "1".to_string(),
                "--log-file".to_string(),
                log_file.to_string_lossy().into_owned(),
                "--connectedness-criterion".to_string(),
                self.connectedness_criterion.to_string(),
                "--log-level".to_string(),
                "1".to_string(),
            ])
            .timeout(ctx.timeout);

        if let Some(threshold) = stage.param_display("threshold") {
            request = request.args(["--threshold".to_string(), threshold]);
        }

        let output = ctx.runner.run(&request)?;
        ensure_success(&self.binary.to_string_lossy(), &output)?;

        finalize_stage(ctx, name, &raw)
    }
}
