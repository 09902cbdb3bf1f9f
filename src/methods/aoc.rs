//! Assembling-overlapping-clusters adapter (`aoc`).
//!
//! Augments a k-core seed clustering with overlapping memberships, so it is
//! only valid after an `ikc` stage. The `k` parameter is nominally required,
//! but the dependency validator derives it from the preceding `ikc` stage's
//! `k` when omitted — by the time this adapter runs, `k` is present.
//!
//! The external `aoc` binary takes headerless tab inputs like the
//! constrained-clustering binary.

use std::path::PathBuf;

use crate::config::ToolPaths;
use crate::exec::{ensure_success, ProcessRequest};
use crate::format::{convert, Delimiter, HeaderSpec};
use crate::pipeline::artifacts::{StageResult, TempArtifact};
use crate::pipeline::errors::{PipelineError, Result};

use super::{check_preconditions, finalize_stage, InvokeContext, MethodAdapter, MethodDescriptor};

static AOC: MethodDescriptor = MethodDescriptor {
    name: "aoc",
    required_params: &["k"],
    optional_params: &[],
    needs_existing_clustering: true,
};

pub struct AocAdapter {
    binary: PathBuf,
}

impl AocAdapter {
    pub fn new(tools: &ToolPaths) -> Self {
        Self {
            binary: tools.external_binary("aoc"),
        }
    }
}

impl MethodAdapter for AocAdapter {
    fn descriptor(&self) -> &'static MethodDescriptor {
        &AOC
    }

    fn invoke(&self, ctx: &InvokeContext<'_>) -> Result<StageResult> {
        check_preconditions(&AOC, ctx.params, ctx.clustering)?;
        let stage = ctx.stage_view(AOC.name);

        let clustering = ctx.clustering.ok_or_else(|| PipelineError::MissingInput {
            method: AOC.name.to_string(),
        })?;

        let edges = ctx.run_dir.scratch(ctx.stage_index, "aoc_edges.tsv");
        convert(
            ctx.network.path(),
            &edges,
            Delimiter::Tab,
            HeaderSpec::Strip,
        )?;
        let _edges_guard = TempArtifact::new(&edges);

        let existing = ctx.run_dir.scratch(ctx.stage_index, "aoc_existing.tsv");
        convert(
            clustering.path(),
            &existing,
            Delimiter::Tab,
            HeaderSpec::Strip,
        )?;
        let _existing_guard = TempArtifact::new(&existing);

        let raw = ctx.run_dir.scratch(ctx.stage_index, "aoc_raw.tsv");
        let _raw_guard = TempArtifact::new(&raw);

        // Presence guaranteed by the precondition check.
        let k = stage.param_display("k").unwrap_or_default();

        let request = ProcessRequest::new(self.binary.to_string_lossy())
            .args([
                "--edgelist".to_string(),
                edges.to_string_lossy().into_owned(),
                "--existing-clustering".to_string(),
                existing.to_string_lossy().into_owned(),
                "--k".to_string(),
                k,
                "--output-file".to_string(),
                raw.to_string_lossy().into_owned(),
            ])
            .timeout(ctx.timeout);

        let output = ctx.runner.run(&request)?;
        ensure_success(&self.binary.to_string_lossy(), &output)?;

        finalize_stage(ctx, AOC.name, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::testing::{
        canonical_clustering, canonical_network, recording_runner, test_run_dir,
    };
    use serde_json::json;

    #[test]
    fn test_requires_k() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = test_run_dir(dir.path());
        let network = canonical_network(dir.path());
        let clustering = canonical_clustering(dir.path());
        let (runner, calls) = recording_runner();

        let adapter = AocAdapter::new(&ToolPaths::default());
        let params = crate::pipeline::spec::ParamMap::new();
        let ctx = InvokeContext {
            network: &network,
            clustering: Some(&clustering),
            params: &params,
            run_dir: &run_dir,
            stage_index: 1,
            runner: &runner,
            timeout: None,
        };

        let err = adapter.invoke(&ctx).unwrap_err();
        assert!(matches!(err, PipelineError::MissingParameter { .. }));
        assert_eq!(calls.lock().unwrap().len(), 0);
    }

    #[test]
    fn test_passes_k_and_converted_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = test_run_dir(dir.path());
        let network = canonical_network(dir.path());
        let clustering = canonical_clustering(dir.path());
        let (runner, calls) = recording_runner();

        let adapter = AocAdapter::new(&ToolPaths::default());
        let mut params = crate::pipeline::spec::ParamMap::new();
        params.insert("k".into(), json!(5));
        let ctx = InvokeContext {
            network: &network,
            clustering: Some(&clustering),
            params: &params,
            run_dir: &run_dir,
            stage_index: 1,
            runner: &runner,
            timeout: None,
        };

        let result = adapter.invoke(&ctx).unwrap();
        assert_eq!(result.clustering.path(), run_dir.stage_output(1, "aoc"));

        let calls = calls.lock().unwrap();
        let args = &calls[0].args;
        assert!(args.contains(&"--k".to_string()));
        assert!(args.contains(&"5".to_string()));
        assert!(!run_dir.scratch(1, "aoc_edges.tsv").exists());
        assert!(!run_dir.scratch(1, "aoc_existing.tsv").exists());
    }
}
