//! Pipeline orchestrator — walks the stage list and threads artifacts.
//!
//! The orchestrator performs no transformation of its own: it canonicalizes
//! the input network once, then for each stage resolves the adapter, invokes
//! it with the current `(network, clustering)` pair, and feeds the result to
//! the next stage. After the last stage it copies the final clustering to
//! the configured output path.
//!
//! # State machine
//!
//! `Ready → Running(0) → Running(1) → … → Completed`, with a single
//! terminal `Failed` state reachable from any `Running` state. There is no
//! retry or partial resume: a failure anywhere aborts the whole run.

use std::fs;
use std::time::Instant;

use tracing::info;

use crate::config::RunConfig;
use crate::exec::ProcessRunner;
use crate::format::{convert_to_canonical, validate_canonical, ArtifactKind};
use crate::methods::{InvokeContext, MethodRegistry};

use super::artifacts::{ClusteringArtifact, NetworkArtifact, RunDirectory};
use super::errors::{PipelineError, Result};
use super::observer::{PipelineObserver, StageClock, TracingObserver};
use super::spec::PipelineSpec;
use super::validation::{resolve_derived_params, ValidationEngine};

/// Execution state of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Ready,
    Running { stage: usize },
    Completed,
    Failed,
}

/// Orchestrates one pipeline run end to end.
pub struct PipelineRunner<'a> {
    registry: &'a MethodRegistry,
    process_runner: &'a dyn ProcessRunner,
    observer: Box<dyn PipelineObserver + 'a>,
    state: PipelineState,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(registry: &'a MethodRegistry, process_runner: &'a dyn ProcessRunner) -> Self {
        Self {
            registry,
            process_runner,
            observer: Box::new(TracingObserver),
            state: PipelineState::Ready,
        }
    }

    pub fn with_observer(mut self, observer: impl PipelineObserver + 'a) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Validate and execute `spec` over `input_network`, writing the final
    /// clustering to `config.output_file`.
    pub fn run(
        &mut self,
        mut spec: PipelineSpec,
        input_network: &std::path::Path,
        config: &RunConfig,
    ) -> Result<ClusteringArtifact> {
        let started = Instant::now();
        match self.execute(&mut spec, input_network, config) {
            Ok(clustering) => {
                self.state = PipelineState::Completed;
                self.observer
                    .on_pipeline_complete(spec.len(), started.elapsed());
                Ok(clustering)
            }
            Err(error) => {
                self.state = PipelineState::Failed;
                self.observer.on_pipeline_failed(&error);
                Err(error)
            }
        }
    }

    fn execute(
        &mut self,
        spec: &mut PipelineSpec,
        input_network: &std::path::Path,
        config: &RunConfig,
    ) -> Result<ClusteringArtifact> {
        if spec.is_empty() {
            return Err(PipelineError::spec_parse(
                "pipeline must contain at least one stage",
            ));
        }

        // Fail fast: derivation, then whole-pipeline validation, before any
        // external process launches or any artifact is written.
        resolve_derived_params(spec);
        ValidationEngine::with_defaults()
            .validate(spec, self.registry)
            .into_result()?;

        let run_dir = RunDirectory::create(&config.working_dir)?;
        info!(
            run_dir = %run_dir.root().display(),
            stages = spec.len(),
            "starting pipeline run"
        );

        // Normalize the user's network once; every stage sees canonical
        // artifacts from here on.
        let canonical_input = run_dir.input_network();
        convert_to_canonical(input_network, &canonical_input, ArtifactKind::Network)?;

        let mut current_network = NetworkArtifact::new(canonical_input);
        let mut current_clustering: Option<ClusteringArtifact> = None;

        for (stage_index, stage) in spec.iter() {
            self.state = PipelineState::Running { stage: stage_index };
            self.observer.on_stage_start(stage_index, &stage.method);
            let clock = StageClock::start(stage_index, &stage.method);

            // Validation already guarantees membership; guard anyway so a
            // registry/spec mismatch cannot panic.
            let adapter =
                self.registry
                    .get(&stage.method)
                    .ok_or_else(|| PipelineError::UnknownMethod {
                        method: stage.method.clone(),
                    })?;

            let ctx = InvokeContext {
                network: &current_network,
                clustering: current_clustering.as_ref(),
                params: &stage.params,
                run_dir: &run_dir,
                stage_index,
                runner: self.process_runner,
                timeout: config.stage_timeout,
            };
            let result = adapter.invoke(&ctx)?;

            // Every clustering threaded to the next stage must satisfy the
            // canonical schema, whatever the adapter did to produce it.
            validate_canonical(result.clustering.path(), ArtifactKind::Clustering)?;

            current_network = result.network;
            current_clustering = Some(result.clustering);
            self.observer.on_stage_complete(&clock.finish());
        }

        // Non-empty spec, so the last stage produced a clustering.
        let final_clustering =
            current_clustering.ok_or_else(|| PipelineError::spec_parse("no stage produced a clustering"))?;

        if let Some(parent) = config.output_file.parent() {
            fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }
        fs::copy(final_clustering.path(), &config.output_file)
            .map_err(|e| PipelineError::io(&config.output_file, e))?;
        info!(output = %config.output_file.display(), "final clustering written");

        Ok(ClusteringArtifact::new(&config.output_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::testing::{recording_runner, FailingRunner};
    use crate::pipeline::spec::StageSpec;
    use serde_json::json;
    use std::fs;

    fn write_network(dir: &std::path::Path) -> std::path::PathBuf {
        let path = dir.join("net.csv");
        fs::write(&path, "source,target\n1,2\n2,3\n3,1\n").unwrap();
        path
    }

    fn config_for(dir: &std::path::Path) -> RunConfig {
        RunConfig::new(
            Some(dir.join("work")),
            Some(dir.join("final_clustering.tsv")),
        )
    }

    #[test]
    fn test_three_stage_pipeline_threads_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let network = write_network(dir.path());
        let config = config_for(dir.path());
        let registry = MethodRegistry::with_defaults(&config);
        let (process_runner, calls) = recording_runner();

        let spec = PipelineSpec::new(vec![
            StageSpec::new("leiden-mod"),
            StageSpec::new("wcc"),
            StageSpec::new("cc"),
        ]);

        let mut runner = PipelineRunner::new(&registry, &process_runner);
        let final_clustering = runner.run(spec, &network, &config).unwrap();

        assert_eq!(runner.state(), PipelineState::Completed);
        assert_eq!(final_clustering.path(), config.output_file);
        assert_eq!(calls.lock().unwrap().len(), 3);

        // The fake tool tags rows with the call ordinal; the final output
        // must be exactly stage 3's canonicalized clustering: the
        // orchestrator adds nothing of its own.
        let content = fs::read_to_string(&config.output_file).unwrap();
        assert_eq!(content, "node_id\tcluster_id\n1\t2\n2\t2\n3\t2\n");
    }

    #[test]
    fn test_failure_in_middle_stage_skips_rest() {
        struct FailSecond {
            inner: crate::methods::testing::FakeToolRunner,
            calls: std::sync::atomic::AtomicUsize,
        }
        impl crate::exec::ProcessRunner for FailSecond {
            fn run(
                &self,
                request: &crate::exec::ProcessRequest,
            ) -> Result<crate::exec::ProcessOutput> {
                let n = self
                    .calls
                    .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                if n == 1 {
                    return Ok(crate::exec::ProcessOutput {
                        status: 1,
                        stdout: String::new(),
                        stderr: "boom".into(),
                        elapsed: std::time::Duration::ZERO,
                    });
                }
                self.inner.run(request)
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let network = write_network(dir.path());
        let config = config_for(dir.path());
        let registry = MethodRegistry::with_defaults(&config);
        let (inner, _) = recording_runner();
        let process_runner = FailSecond {
            inner,
            calls: std::sync::atomic::AtomicUsize::new(0),
        };

        let spec = PipelineSpec::new(vec![
            StageSpec::new("leiden-mod"),
            StageSpec::new("wcc"),
            StageSpec::new("cc"),
        ]);

        let mut runner = PipelineRunner::new(&registry, &process_runner);
        let err = runner.run(spec, &network, &config).unwrap_err();

        assert!(matches!(err, PipelineError::ExternalTool { .. }));
        assert_eq!(runner.state(), PipelineState::Failed);
        // Stage 3 never launched.
        assert_eq!(
            process_runner.calls.load(std::sync::atomic::Ordering::SeqCst),
            2
        );
        assert!(!config.output_file.exists());
    }

    #[test]
    fn test_validation_failure_precedes_any_launch() {
        let dir = tempfile::tempdir().unwrap();
        let network = write_network(dir.path());
        let config = config_for(dir.path());
        let registry = MethodRegistry::with_defaults(&config);
        let (process_runner, calls) = recording_runner();

        // aoc with no ikc anywhere before it.
        let spec = PipelineSpec::new(vec![
            StageSpec::new("leiden-mod"),
            StageSpec::new("aoc").with_param("k", json!(5)),
        ]);

        let mut runner = PipelineRunner::new(&registry, &process_runner);
        let err = runner.run(spec, &network, &config).unwrap_err();

        assert!(matches!(err, PipelineError::Dependency { .. }));
        assert_eq!(runner.state(), PipelineState::Failed);
        assert_eq!(calls.lock().unwrap().len(), 0);
        // The working directory was never populated either.
        assert!(!config.working_dir.join("input_network.tsv").exists());
    }

    #[test]
    fn test_derived_k_flows_to_adapter() {
        let dir = tempfile::tempdir().unwrap();
        let network = write_network(dir.path());
        let config = config_for(dir.path());
        let registry = MethodRegistry::with_defaults(&config);
        let (process_runner, calls) = recording_runner();

        let spec = PipelineSpec::new(vec![
            StageSpec::new("ikc").with_param("k", json!(5)),
            StageSpec::new("aoc"),
        ]);

        let mut runner = PipelineRunner::new(&registry, &process_runner);
        runner.run(spec, &network, &config).unwrap();

        let calls = calls.lock().unwrap();
        let aoc_args = &calls[1].args;
        let pos = aoc_args.iter().position(|a| a == "--k").unwrap();
        assert_eq!(aoc_args[pos + 1], "5");
    }

    #[test]
    fn test_non_canonical_stage_output_rejected() {
        use crate::methods::{InvokeContext, MethodAdapter, MethodDescriptor};
        use crate::pipeline::artifacts::StageResult;

        // An adapter that skips canonicalization and hands back a raw
        // comma-delimited, headerless file.
        struct SloppyAdapter;
        impl MethodAdapter for SloppyAdapter {
            fn descriptor(&self) -> &'static MethodDescriptor {
                static DESC: MethodDescriptor = MethodDescriptor {
                    name: "sloppy",
                    required_params: &[],
                    optional_params: &[],
                    needs_existing_clustering: false,
                };
                &DESC
            }

            fn invoke(&self, ctx: &InvokeContext<'_>) -> super::Result<StageResult> {
                let path = ctx.run_dir.stage_output(ctx.stage_index, "sloppy");
                fs::write(&path, "1,0\n2,0\n").unwrap();
                Ok(StageResult {
                    network: ctx.network.clone(),
                    clustering: ClusteringArtifact::new(path),
                })
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let network = write_network(dir.path());
        let config = config_for(dir.path());
        let mut registry = MethodRegistry::with_defaults(&config);
        registry.register(Box::new(SloppyAdapter));
        let (process_runner, _) = recording_runner();

        let spec = PipelineSpec::new(vec![StageSpec::new("sloppy")]);
        let mut runner = PipelineRunner::new(&registry, &process_runner);
        let err = runner.run(spec, &network, &config).unwrap_err();

        assert!(matches!(err, PipelineError::SchemaValidation { .. }));
        assert_eq!(runner.state(), PipelineState::Failed);
    }

    #[test]
    fn test_empty_spec_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let network = write_network(dir.path());
        let config = config_for(dir.path());
        let registry = MethodRegistry::with_defaults(&config);
        let (process_runner, _) = recording_runner();

        let mut runner = PipelineRunner::new(&registry, &process_runner);
        let err = runner
            .run(PipelineSpec::default(), &network, &config)
            .unwrap_err();
        assert!(matches!(err, PipelineError::SpecParse { .. }));
    }

    #[test]
    fn test_tool_failure_on_first_stage() {
        let dir = tempfile::tempdir().unwrap();
        let network = write_network(dir.path());
        let config = config_for(dir.path());
        let registry = MethodRegistry::with_defaults(&config);
        let process_runner = FailingRunner::with_status(2);

        let spec = PipelineSpec::new(vec![StageSpec::new("leiden-mod")]);
        let mut runner = PipelineRunner::new(&registry, &process_runner);
        let err = runner.run(spec, &network, &config).unwrap_err();
        assert!(matches!(err, PipelineError::ExternalTool { status: 2, .. }));
        assert_eq!(runner.state(), PipelineState::Failed);
    }

    #[test]
    fn test_observer_sees_stage_boundaries() {
        #[derive(Default)]
        struct Recorder {
            events: Vec<String>,
        }
        impl PipelineObserver for &mut Recorder {
            fn on_stage_start(&mut self, stage_index: usize, method: &str) {
                self.events.push(format!("start {stage_index} {method}"));
            }
            fn on_stage_complete(&mut self, report: &super::super::observer::StageReport) {
                self.events
                    .push(format!("done {} {}", report.stage_index, report.method));
            }
            fn on_pipeline_complete(&mut self, stages: usize, _elapsed: std::time::Duration) {
                self.events.push(format!("complete {stages}"));
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let network = write_network(dir.path());
        let config = config_for(dir.path());
        let registry = MethodRegistry::with_defaults(&config);
        let (process_runner, _) = recording_runner();

        let spec = PipelineSpec::new(vec![
            StageSpec::new("leiden-mod"),
            StageSpec::new("infomap"),
        ]);

        let mut recorder = Recorder::default();
        let mut runner =
            PipelineRunner::new(&registry, &process_runner).with_observer(&mut recorder);
        runner.run(spec, &network, &config).unwrap();
        drop(runner);

        assert_eq!(
            recorder.events,
            vec![
                "start 0 leiden-mod",
                "done 0 leiden-mod",
                "start 1 infomap",
                "done 1 infomap",
                "complete 2",
            ]
        );
    }
}
