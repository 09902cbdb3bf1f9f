//! Observation hooks for pipeline execution.
//!
//! The orchestrator notifies a [`PipelineObserver`] at stage boundaries.
//! The default [`TracingObserver`] emits structured log events with elapsed
//! times; tests install recording observers to assert on stage ordering.

use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::pipeline::errors::PipelineError;

/// Timing summary for one completed stage.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage_index: usize,
    pub method: String,
    pub elapsed: Duration,
}

/// Wall-clock timer for one stage.
#[derive(Debug)]
pub struct StageClock {
    stage_index: usize,
    method: String,
    start: Instant,
}

impl StageClock {
    pub fn start(stage_index: usize, method: impl Into<String>) -> Self {
        Self {
            stage_index,
            method: method.into(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) -> StageReport {
        StageReport {
            stage_index: self.stage_index,
            method: self.method,
            elapsed: self.start.elapsed(),
        }
    }
}

/// Hooks invoked by the orchestrator at run and stage boundaries.
pub trait PipelineObserver {
    fn on_stage_start(&mut self, _stage_index: usize, _method: &str) {}
    fn on_stage_complete(&mut self, _report: &StageReport) {}
    fn on_pipeline_complete(&mut self, _stages: usize, _elapsed: Duration) {}
    fn on_pipeline_failed(&mut self, _error: &PipelineError) {}
}

/// Observer that logs through `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_stage_start(&mut self, stage_index: usize, method: &str) {
        info!(stage = stage_index, method, "stage starting");
    }

    fn on_stage_complete(&mut self, report: &StageReport) {
        info!(
            stage = report.stage_index,
            method = %report.method,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "stage completed"
        );
    }

    fn on_pipeline_complete(&mut self, stages: usize, elapsed: Duration) {
        info!(
            stages,
            elapsed_ms = elapsed.as_millis() as u64,
            "pipeline completed"
        );
    }

    fn on_pipeline_failed(&mut self, error: &PipelineError) {
        error!(code = %error.code(), %error, "pipeline failed");
    }
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}
