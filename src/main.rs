//! Command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use graph_cluster_pipeline::format::{self, HeaderSpec};
use graph_cluster_pipeline::{
    Delimiter, MethodRegistry, PipelineRunner, PipelineSpec, RunConfig, SystemProcessRunner,
    ToolPaths, ValidationEngine,
};

#[derive(Parser)]
#[command(name = "graph-cluster-pipeline")]
#[command(version)]
#[command(about = "Multi-stage graph-clustering pipeline orchestrator", long_about = None)]
struct Cli {
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a pipeline specification over an input network
    Run {
        /// Pipeline specification (JSON list of {method, params})
        pipeline_spec: PathBuf,

        /// Input network edge list (comma, space, or tab delimited)
        input_network: PathBuf,

        /// Directory for intermediate stage artifacts
        /// (default: timestamped run directory under ./output)
        #[arg(long, value_name = "PATH")]
        working_dir: Option<PathBuf>,

        /// Destination of the final clustering
        /// (default: final_clustering.tsv inside the working directory)
        #[arg(long, value_name = "PATH")]
        output_file: Option<PathBuf>,

        /// Per-stage wall-clock limit in seconds for external tools
        #[arg(long, value_name = "SECS")]
        stage_timeout: Option<u64>,

        /// Directory holding the method wrapper scripts
        #[arg(long, value_name = "PATH", default_value = "./modules")]
        modules_dir: PathBuf,

        /// Directory holding downloaded external binaries
        #[arg(long, value_name = "PATH", default_value = "./downloaded_programs")]
        external_dir: PathBuf,
    },

    /// Validate a pipeline specification without executing it
    Validate {
        /// Pipeline specification (JSON)
        pipeline_spec: PathBuf,
    },

    /// Re-serialize a tabular file, changing delimiter and/or header
    Convert {
        /// Input character-delimited file
        input: PathBuf,

        /// Output path
        output: PathBuf,

        /// Target delimiter
        #[arg(long, value_parser = parse_delimiter, default_value = "tab")]
        delimiter: Delimiter,

        /// Remove the header row
        #[arg(long, conflicts_with = "header")]
        remove_header: bool,

        /// Replace the header with comma-separated column names
        #[arg(long, value_delimiter = ',')]
        header: Option<Vec<String>>,
    },
}

fn parse_delimiter(value: &str) -> Result<Delimiter, String> {
    match value {
        "comma" => Ok(Delimiter::Comma),
        "space" => Ok(Delimiter::Space),
        "tab" => Ok(Delimiter::Tab),
        other => Err(format!(
            "unknown delimiter '{other}' (expected comma, space, or tab)"
        )),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match dispatch(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run {
            pipeline_spec,
            input_network,
            working_dir,
            output_file,
            stage_timeout,
            modules_dir,
            external_dir,
        } => {
            let spec = PipelineSpec::from_path(&pipeline_spec)
                .with_context(|| format!("loading {}", pipeline_spec.display()))?;

            let tools = ToolPaths {
                modules_dir,
                external_dir,
                ..ToolPaths::default()
            };
            let config = RunConfig::new(working_dir, output_file)
                .with_tools(tools)
                .with_stage_timeout(stage_timeout.map(Duration::from_secs));

            let registry = MethodRegistry::with_defaults(&config);
            let process_runner = SystemProcessRunner;
            let mut runner = PipelineRunner::new(&registry, &process_runner);
            let clustering = runner.run(spec, &input_network, &config)?;
            info!(
                "final clustering: {}",
                clustering.path().display()
            );
            Ok(())
        }

        Commands::Validate { pipeline_spec } => {
            let mut spec = PipelineSpec::from_path(&pipeline_spec)
                .with_context(|| format!("loading {}", pipeline_spec.display()))?;
            let config = RunConfig::new(None, None);
            let registry = MethodRegistry::with_defaults(&config);

            graph_cluster_pipeline::pipeline::resolve_derived_params(&mut spec);
            let report = ValidationEngine::with_defaults().validate(&spec, &registry);
            if report.is_valid() {
                info!("pipeline specification is valid ({} stages)", spec.len());
                Ok(())
            } else {
                for diagnostic in report.errors() {
                    error!(stage = diagnostic.stage_index, "{}", diagnostic.error);
                }
                anyhow::bail!("pipeline specification is invalid")
            }
        }

        Commands::Convert {
            input,
            output,
            delimiter,
            remove_header,
            header,
        } => {
            let header_spec = if remove_header {
                HeaderSpec::Strip
            } else if let Some(names) = header {
                HeaderSpec::Set(names)
            } else {
                HeaderSpec::Keep
            };
            format::convert(&input, &output, delimiter, header_spec)?;
            info!("wrote {}", output.display());
            Ok(())
        }
    }
}
