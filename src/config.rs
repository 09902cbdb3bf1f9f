//! Per-run configuration.
//!
//! There is deliberately no process-wide mutable configuration: a
//! [`RunConfig`] is constructed once per run (usually from CLI arguments)
//! and passed by reference to the orchestrator, the registry, and the
//! validator. Defaults derive a unique run-scoped working directory so two
//! concurrent invocations never collide on intermediate artifacts.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;

/// Where the external clustering programs live.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    /// Directory holding the in-tree wrapper scripts (`run_leiden.py`, ...).
    pub modules_dir: PathBuf,
    /// Directory holding downloaded external binaries
    /// (`constrained_clustering`, `aoc`, ...).
    pub external_dir: PathBuf,
    /// Interpreter used for the wrapper scripts.
    pub python: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            modules_dir: PathBuf::from("./modules"),
            external_dir: PathBuf::from("./downloaded_programs"),
            python: "python3".to_string(),
        }
    }
}

impl ToolPaths {
    /// Path to a wrapper script under the modules directory.
    pub fn module_script(&self, name: &str) -> PathBuf {
        self.modules_dir.join(name)
    }

    /// Path to a downloaded external binary.
    pub fn external_binary(&self, name: &str) -> PathBuf {
        self.external_dir.join(name)
    }
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Run-scoped directory for intermediate artifacts.
    pub working_dir: PathBuf,
    /// Destination of the final clustering.
    pub output_file: PathBuf,
    /// External program locations.
    pub tools: ToolPaths,
    /// Per-stage wall-clock limit for external tools. `None` means no limit:
    /// a hung tool hangs the run.
    pub stage_timeout: Option<Duration>,
}

impl RunConfig {
    /// Build a config, deriving defaults for any omitted path.
    ///
    /// A missing working directory becomes `./output/run-<timestamp>-<pid>`;
    /// a missing output file lands inside the working directory.
    pub fn new(working_dir: Option<PathBuf>, output_file: Option<PathBuf>) -> Self {
        let working_dir = working_dir.unwrap_or_else(default_run_dir);
        let output_file = output_file.unwrap_or_else(|| working_dir.join("final_clustering.tsv"));
        Self {
            working_dir,
            output_file,
            tools: ToolPaths::default(),
            stage_timeout: None,
        }
    }

    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stage_timeout = timeout;
        self
    }
}

/// Timestamped, pid-suffixed run directory under `./output`.
fn default_run_dir() -> PathBuf {
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    Path::new("./output").join(format!("run-{stamp}-{}", std::process::id()))
}
