use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use aliaslens::core::{DiagnosticLevel, IndexerConfig, ModuleIndexer, ResolutionOutcome};
use aliaslens::formatters::JsonReviewFormatter;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "aliaslens",
    version = "0.1.0",
    author = "aliaslens developers",
    about = "Go API surface extractor with cross-module alias resolution"
)]
struct Cli {
    /// Module directory to review (must contain go.mod)
    #[arg(short, long, value_name = "PATH")]
    input: PathBuf,

    /// Output file path; the review is printed to stdout when omitted
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Index testdata directories too
    #[arg(long)]
    index_testdata: bool,

    /// Directory name shared by all sibling modules
    #[arg(long, value_name = "NAME", default_value = aliaslens::core::module::DEFAULT_WORKSPACE_DIR)]
    workspace_dir: String,

    /// Import path marker mapping imports onto the workspace directory
    #[arg(long, value_name = "MARKER", default_value = aliaslens::core::module::DEFAULT_WORKSPACE_IMPORT_MARKER)]
    workspace_import_marker: String,

    /// Include token structure in the review
    #[arg(long)]
    detailed: bool,

    /// Pretty-print the JSON review
    #[arg(long)]
    pretty: bool,

    /// Log indexing progress
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        input,
        output,
        index_testdata,
        workspace_dir,
        workspace_import_marker,
        detailed,
        pretty,
        verbose: _,
    } = cli;

    let start_time = Instant::now();

    let config = IndexerConfig {
        index_testdata,
        workspace_dir_name: workspace_dir,
        workspace_import_marker,
    };
    let module = ModuleIndexer::new().with_config(config).build(&input)?;

    for event in module.resolution_events() {
        if !matches!(event.outcome, ResolutionOutcome::Resolved) {
            tracing::warn!("{}", event);
        }
    }

    let formatter = JsonReviewFormatter::new()
        .with_detail(detailed)
        .with_pretty(pretty);

    match &output {
        Some(path) => formatter.format_to_file(&module, path)?,
        None => println!("{}", formatter.format_module(&module)?),
    }

    let warnings = module
        .packages()
        .values()
        .flat_map(|pkg| pkg.diagnostics())
        .filter(|diagnostic| diagnostic.level == DiagnosticLevel::Warning)
        .count();

    eprintln!(
        "Reviewed {} ({}): {} packages, {} aliases, {} cross-module warnings",
        module.name(),
        module.module_path(),
        module.packages().len(),
        module.resolution_events().len(),
        warnings
    );
    if let Some(path) = &output {
        eprintln!("Review written to {}", path.display());
    }
    eprintln!("Total execution time: {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}
