//! Infomap adapter.
//!
//! The Infomap wrapper reads a headerless edge list and writes its
//! communities as `com.tsv` (headerless tab) inside an output directory,
//! rather than to a single output file. The adapter converts the network
//! down, points the tool at a stage-scoped directory, and canonicalizes
//! `com.tsv` on the way out.

use std::path::PathBuf;

use crate::config::ToolPaths;
use crate::exec::{ensure_success, ProcessRequest};
use crate::format::{convert, Delimiter, HeaderSpec};
use crate::pipeline::artifacts::{StageResult, TempArtifact};
use crate::pipeline::errors::Result;

use super::{check_preconditions, finalize_stage, InvokeContext, MethodAdapter, MethodDescriptor};

static INFOMAP: MethodDescriptor = MethodDescriptor {
    name: "infomap",
    required_params: &[],
    optional_params: &[],
    needs_existing_clustering: false,
};

pub struct InfomapAdapter {
    script: PathBuf,
    python: String,
}

impl InfomapAdapter {
    pub fn new(tools: &ToolPaths) -> Self {
        Self {
            script: tools.module_script("run_infomap.py"),
            python: tools.python.clone(),
        }
    }
}

impl MethodAdapter for InfomapAdapter {
    fn descriptor(&self) -> &'static MethodDescriptor {
        &INFOMAP
    }

    fn invoke(&self, ctx: &InvokeContext<'_>) -> Result<StageResult> {
        check_preconditions(&INFOMAP, ctx.params, ctx.clustering)?;

        let edges = ctx.run_dir.scratch(ctx.stage_index, "infomap_edges.tsv");
        convert(
            ctx.network.path(),
            &edges,
            Delimiter::Tab,
            HeaderSpec::Strip,
        )?;
        let _edges_guard = TempArtifact::new(&edges);

        let out_dir = ctx.run_dir.scratch(ctx.stage_index, "infomap_out");
        let _out_guard = TempArtifact::new(&out_dir);

        let request = ProcessRequest::new(&self.python)
            .arg(self.script.to_string_lossy())
            .args([
                "--edgelist".to_string(),
                edges.to_string_lossy().into_owned(),
                "--output-directory".to_string(),
                out_dir.to_string_lossy().into_owned(),
            ])
            .timeout(ctx.timeout);

        let output = ctx.runner.run(&request)?;
        ensure_success(&self.script.to_string_lossy(), &output)?;

        finalize_stage(ctx, INFOMAP.name, &out_dir.join("com.tsv"))
    }
}
