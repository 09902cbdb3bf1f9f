//! First-class pipeline artifacts.
//!
//! Networks and clusterings flow between stages as files on disk; these
//! newtypes keep the two kinds apart at the type level. The artifact-naming
//! contract lives here too: intermediate filenames embed the stage index so
//! names never collide across stages, and every run writes into its own
//! [`RunDirectory`] so concurrent runs never collide with each other.

use std::fs;
use std::path::{Path, PathBuf};

use crate::format::ArtifactKind;
use crate::pipeline::errors::{PipelineError, Result};

/// A network artifact: a canonical edge-list file (`source`/`target`,
/// tab-delimited, headered) once inside the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkArtifact {
    path: PathBuf,
}

impl NetworkArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind() -> ArtifactKind {
        ArtifactKind::Network
    }
}

/// A clustering artifact: a canonical `node_id`/`cluster_id` file.
///
/// Unclustered nodes may be omitted; the pipeline performs no reconciliation
/// against the input node set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusteringArtifact {
    path: PathBuf,
}

impl ClusteringArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind() -> ArtifactKind {
        ArtifactKind::Clustering
    }
}

/// The pair threaded from one orchestrator iteration to the next.
///
/// Most methods only refine the partition, so the network component is
/// usually passed through unchanged.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub network: NetworkArtifact,
    pub clustering: ClusteringArtifact,
}

// ─── Run directory and artifact naming ──────────────────────────────────────

/// The run-scoped working directory.
///
/// All intermediate artifacts for one pipeline run live under this
/// directory. The naming scheme is a contract shared by the orchestrator
/// and every adapter: an adapter's output path is deterministic given
/// `(run directory, stage index, method name)`, so the orchestrator never
/// discovers filenames dynamically.
#[derive(Debug, Clone)]
pub struct RunDirectory {
    root: PathBuf,
}

impl RunDirectory {
    /// Create the directory (and parents) if needed.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| PipelineError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical clustering output path for a stage:
    /// `{index:02}_{method}.tsv`.
    pub fn stage_output(&self, stage_index: usize, method: &str) -> PathBuf {
        self.root.join(format!("{stage_index:02}_{method}.tsv"))
    }

    /// Log file path for a stage's external tool.
    pub fn stage_log(&self, stage_index: usize, method: &str) -> PathBuf {
        self.root.join(format!("{stage_index:02}_{method}.log"))
    }

    /// Scratch path for a stage-owned temporary artifact (e.g. a format
    /// conversion an external tool requires).
    pub fn scratch(&self, stage_index: usize, name: &str) -> PathBuf {
        self.root.join(format!("{stage_index:02}_tmp_{name}"))
    }

    /// Path of the canonicalized input network.
    pub fn input_network(&self) -> PathBuf {
        self.root.join("input_network.tsv")
    }
}

// ─── Temporary artifact guard ───────────────────────────────────────────────

/// A temporary file or directory removed on drop.
///
/// Adapters that must convert inputs into a tool's native format own the
/// converted files through this guard, so cleanup happens whether or not
/// the external invocation succeeds. Directories are removed recursively,
/// for tools that write into a scratch directory rather than a single file.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        // Removal failure is not actionable during unwinding.
        let _ = if self.path.is_dir() {
            fs::remove_dir_all(&self.path)
        } else {
            fs::remove_file(&self.path)
        };
    }
}
