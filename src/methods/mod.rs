//! Method adapter registry.
//!
//! One adapter per supported clustering method. Each adapter declares its
//! parameter contract through a static [`MethodDescriptor`], translates a
//! stage request into one external invocation, and canonicalizes the tool's
//! raw output via the format toolkit before returning. Adapters never retry
//! and convert a non-zero exit status into
//! [`PipelineError::ExternalTool`](crate::pipeline::errors::PipelineError).
//!
//! The registry is built once per run from a [`RunConfig`] and read-only
//! thereafter.

pub mod aoc;
pub mod cm;
pub mod constrained;
pub mod ikc;
pub mod infomap;
pub mod leiden;
pub mod sbm;

use std::time::Duration;

use rustc_hash::FxHashMap;

use crate::config::RunConfig;
use crate::exec::ProcessRunner;
use crate::format::{convert_to_canonical, ArtifactKind};
use crate::pipeline::artifacts::{
    ClusteringArtifact, NetworkArtifact, RunDirectory, StageResult,
};
use crate::pipeline::errors::{PipelineError, Result};
use crate::pipeline::spec::{ParamMap, StageSpec};

/// Static parameter contract for one method.
#[derive(Debug, Clone, Copy)]
pub struct MethodDescriptor {
    /// Registry name (e.g. `"leiden-cpm"`).
    pub name: &'static str,
    /// Parameters that must be present; checked before any process launch.
    pub required_params: &'static [&'static str],
    /// Parameters the adapter understands but does not require.
    pub optional_params: &'static [&'static str],
    /// Whether the method refines an existing clustering.
    pub needs_existing_clustering: bool,
}

/// Everything an adapter needs for one invocation.
pub struct InvokeContext<'a> {
    pub network: &'a NetworkArtifact,
    pub clustering: Option<&'a ClusteringArtifact>,
    pub params: &'a ParamMap,
    pub run_dir: &'a RunDirectory,
    pub stage_index: usize,
    pub runner: &'a dyn ProcessRunner,
    pub timeout: Option<Duration>,
}

impl<'a> InvokeContext<'a> {
    /// Borrow the parameters as a stage view for typed access.
    fn stage_view(&self, method: &str) -> StageSpec {
        StageSpec {
            method: method.to_string(),
            params: self.params.clone(),
        }
    }
}

/// The adapter contract: translate `(network, clustering, params)` into one
/// completed external invocation plus a canonical clustering artifact.
pub trait MethodAdapter: Send + Sync {
    fn descriptor(&self) -> &'static MethodDescriptor;

    /// Run the method. Implementations must call
    /// [`check_preconditions`] first so no external process is ever
    /// launched with an unmet parameter contract.
    fn invoke(&self, ctx: &InvokeContext<'_>) -> Result<StageResult>;
}

/// Shared precondition check for every adapter.
///
/// Fails with [`PipelineError::MissingParameter`] for each absent required
/// parameter (first one wins) and with [`PipelineError::MissingInput`] when
/// a refinement method has no existing clustering. Runs before any external
/// process is launched: a partially-run external tool cannot be cheaply
/// rolled back.
pub fn check_preconditions(
    descriptor: &MethodDescriptor,
    params: &ParamMap,
    clustering: Option<&ClusteringArtifact>,
) -> Result<()> {
    for param in descriptor.required_params {
        if !params.contains_key(*param) {
            return Err(PipelineError::missing_parameter(descriptor.name, *param));
        }
    }
    if descriptor.needs_existing_clustering && clustering.is_none() {
        return Err(PipelineError::MissingInput {
            method: descriptor.name.to_string(),
        });
    }
    Ok(())
}

/// Canonicalize a tool's raw clustering output into the stage's
/// deterministic output path and thread the network through unchanged.
pub fn finalize_stage(
    ctx: &InvokeContext<'_>,
    method: &str,
    raw_output: &std::path::Path,
) -> Result<StageResult> {
    let canonical = ctx.run_dir.stage_output(ctx.stage_index, method);
    convert_to_canonical(raw_output, &canonical, ArtifactKind::Clustering)?;
    Ok(StageResult {
        network: ctx.network.clone(),
        clustering: ClusteringArtifact::new(canonical),
    })
}

// ─── Registry ───────────────────────────────────────────────────────────────

/// Read-only mapping from method name to adapter, built once per run.
pub struct MethodRegistry {
    adapters: FxHashMap<&'static str, Box<dyn MethodAdapter>>,
}

impl MethodRegistry {
    /// Empty registry, for tests that install doubles.
    pub fn empty() -> Self {
        Self {
            adapters: FxHashMap::default(),
        }
    }

    /// Registry with every supported method, wired to the tool locations in
    /// `config`.
    pub fn with_defaults(config: &RunConfig) -> Self {
        let tools = &config.tools;
        let mut registry = Self::empty();
        registry.register(Box::new(leiden::LeidenAdapter::modularity(tools)));
        registry.register(Box::new(leiden::LeidenAdapter::cpm(tools)));
        registry.register(Box::new(ikc::IkcAdapter::new(tools)));
        registry.register(Box::new(infomap::InfomapAdapter::new(tools)));
        registry.register(Box::new(sbm::SbmAdapter::new(tools)));
        registry.register(Box::new(constrained::ConstrainedAdapter::wcc(tools)));
        registry.register(Box::new(constrained::ConstrainedAdapter::cc(tools)));
        registry.register(Box::new(cm::CmAdapter::new(tools)));
        registry.register(Box::new(aoc::AocAdapter::new(tools)));
        registry
    }

    /// Install an adapter under its descriptor name. Later registrations
    /// replace earlier ones, which is how tests substitute doubles.
    pub fn register(&mut self, adapter: Box<dyn MethodAdapter>) {
        self.adapters.insert(adapter.descriptor().name, adapter);
    }

    pub fn get(&self, method: &str) -> Option<&dyn MethodAdapter> {
        self.adapters.get(method).map(Box::as_ref)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.adapters.contains_key(method)
    }

    /// Descriptor lookup without touching the adapter itself.
    pub fn descriptor(&self, method: &str) -> Option<&'static MethodDescriptor> {
        self.get(method).map(MethodAdapter::descriptor)
    }

    /// Registered method names, sorted for stable output.
    pub fn method_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.adapters.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

// ─── Test doubles ───────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> MethodDescriptor {
        MethodDescriptor {
            name: "test-method",
            required_params: &["res"],
            optional_params: &["seed"],
            needs_existing_clustering: true,
        }
    }

    #[test]
    fn test_preconditions_missing_param() {
        let params = ParamMap::new();
        let clustering = ClusteringArtifact::new("c.tsv");
        let err = check_preconditions(&descriptor(), &params, Some(&clustering)).unwrap_err();
        match err {
            PipelineError::MissingParameter { method, param } => {
                assert_eq!(method, "test-method");
                assert_eq!(param, "res");
            }
            other => panic!("expected MissingParameter, got {other}"),
        }
    }

    #[test]
    fn test_preconditions_missing_clustering() {
        let mut params = ParamMap::new();
        params.insert("res".into(), serde_json::json!(0.1));
        let err = check_preconditions(&descriptor(), &params, None).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput { .. }));
    }

    #[test]
    fn test_preconditions_satisfied() {
        let mut params = ParamMap::new();
        params.insert("res".into(), serde_json::json!(0.1));
        let clustering = ClusteringArtifact::new("c.tsv");
        check_preconditions(&descriptor(), &params, Some(&clustering)).unwrap();
    }

    #[test]
    fn test_default_registry_contains_all_methods() {
        let config = RunConfig::new(Some("/tmp/w".into()), None);
        let registry = MethodRegistry::with_defaults(&config);
        assert_eq!(
            registry.method_names(),
            vec![
                "aoc",
                "cc",
                "cm",
                "ikc",
                "infomap",
                "leiden-cpm",
                "leiden-mod",
                "sbm",
                "wcc"
            ]
        );
    }

    #[test]
    fn test_registry_descriptor_lookup() {
        let config = RunConfig::new(Some("/tmp/w".into()), None);
        let registry = MethodRegistry::with_defaults(&config);
        let desc = registry.descriptor("leiden-cpm").unwrap();
        assert!(desc.required_params.contains(&"res"));
        assert!(!desc.needs_existing_clustering);
        assert!(registry.descriptor("wcc").unwrap().needs_existing_clustering);
        assert!(registry.descriptor("nope").is_none());
    }
}
