//! External process execution.
//!
//! Every clustering method runs as an opaque external program. The
//! capability is an explicit [`ProcessRunner`] trait whose result carries
//! exit status, captured output, and elapsed time, so adapters convert
//! failure into a typed error instead of silently continuing. Tests
//! substitute doubles for the runner.
//!
//! Execution is strictly sequential: one external process at a time, each
//! call blocking until the child exits or the optional timeout expires.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::pipeline::errors::{PipelineError, Result};

/// A fully-specified external invocation.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    /// Program to execute (absolute path or `PATH`-resolved name).
    pub program: String,
    /// Arguments, already split (no shell interpretation).
    pub args: Vec<String>,
    /// Kill the child and fail if it runs longer than this.
    pub timeout: Option<Duration>,
}

impl ProcessRequest {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Result of one completed external invocation.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit status code; `-1` when the child was killed by a signal.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Capability for running external clustering tools.
///
/// Implementations must block until the child exits (or the timeout fires).
/// `Send + Sync` so a runner can be shared by reference across components.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, request: &ProcessRequest) -> Result<ProcessOutput>;
}

/// [`ProcessRunner`] backed by `std::process::Command`.
///
/// Stdout and stderr are drained on background threads while the parent
/// polls `try_wait`, so a child that fills its pipes cannot deadlock the
/// timeout loop.
#[derive(Debug, Default)]
pub struct SystemProcessRunner;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, request: &ProcessRequest) -> Result<ProcessOutput> {
        info!(
            program = %request.program,
            args = ?request.args,
            "launching external tool"
        );
        let start = Instant::now();

        let mut child = Command::new(&request.program)
            .args(&request.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PipelineError::io(&request.program, e))?;

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let stdout_handle = thread::spawn(move || drain(stdout_pipe));
        let stderr_handle = thread::spawn(move || drain(stderr_pipe));

        let status = loop {
            match child
                .try_wait()
                .map_err(|e| PipelineError::io(&request.program, e))?
            {
                Some(status) => break status,
                None => {
                    if let Some(timeout) = request.timeout {
                        if start.elapsed() > timeout {
                            // Best-effort kill; the child may already be gone.
                            let _ = child.kill();
                            let _ = child.wait();
                            return Err(PipelineError::ExternalToolTimeout {
                                program: request.program.clone(),
                                timeout_secs: timeout.as_secs(),
                            });
                        }
                    }
                    thread::sleep(POLL_INTERVAL);
                }
            }
        };

        let stdout = stdout_handle.join().unwrap_or_default();
        let stderr = stderr_handle.join().unwrap_or_default();
        let elapsed = start.elapsed();

        debug!(
            program = %request.program,
            status = status.code().unwrap_or(-1),
            elapsed_ms = elapsed.as_millis() as u64,
            "external tool finished"
        );

        Ok(ProcessOutput {
            status: status.code().unwrap_or(-1),
            stdout,
            stderr,
            elapsed,
        })
    }
}

fn drain(pipe: Option<impl Read>) -> String {
    let mut buf = String::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_string(&mut buf);
    }
    buf
}

/// Convert a non-zero exit status into [`PipelineError::ExternalTool`].
pub fn ensure_success(program: &str, output: &ProcessOutput) -> Result<()> {
    if output.success() {
        Ok(())
    } else {
        Err(PipelineError::ExternalTool {
            program: program.to_string(),
            status: output.status,
            stderr: output.stderr.trim().to_string(),
        })
    }
}
