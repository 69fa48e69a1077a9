use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use unexport::analysis::Project;
use unexport::config::{Config, Overrides};
use unexport::prune::{FileEdits, LogTracker, PruneOptions, Pruner, RecordingTracker, RunSummary};
use unexport::report::{render, Report, ReportFormat};
use unexport::store::{DiskStore, FileStore, MemoryStore};

#[derive(Parser)]
#[command(name = "unexport")]
#[command(author = "Zachary Woods <143150513+zach-fau@users.noreply.github.com>")]
#[command(version)]
#[command(about = "Remove exports that nothing outside their own file uses", long_about = None)]
struct Cli {
    /// Project root (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    project: PathBuf,

    /// Config file (defaults to unexport.toml in the project root)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Regex on root-relative paths of files to leave alone (repeatable)
    #[arg(long, value_name = "REGEX")]
    skip: Vec<String>,

    /// Also prune .d.ts files
    #[arg(long)]
    include_d_ts: bool,

    /// Delete files whose exports are all unused
    #[arg(long)]
    delete_files: bool,

    /// Remove declarations and imports left unused after pruning
    #[arg(long)]
    cleanup: bool,

    /// Repeat the run until nothing changes
    #[arg(short, long)]
    recursive: bool,

    /// Maximum rounds with --recursive
    #[arg(long, value_name = "N")]
    max_rounds: Option<usize>,

    /// Report what would change without writing anything
    #[arg(long)]
    check: bool,

    /// Report format: human or json
    #[arg(short, long, default_value_t = ReportFormat::Human)]
    format: ReportFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let root = cli
        .project
        .canonicalize()
        .with_context(|| format!("Project root not found: {}", cli.project.display()))?;

    let mut config = Config::load(&root, cli.config.as_deref()).context("Failed to load config")?;
    config.apply(Overrides {
        skip: cli.skip,
        include_d_ts: cli.include_d_ts,
        delete_files: cli.delete_files,
        cleanup: cli.cleanup,
        recursive: cli.recursive,
        max_rounds: cli.max_rounds,
    });
    let filter = config.target_filter().context("Invalid skip pattern")?;
    let options = config.prune_options();

    let (summary, files) = if cli.check {
        let store = MemoryStore::snapshot(&root)
            .with_context(|| format!("Failed to read project at {}", root.display()))?;
        let targets = filter.targets(&root, store.files());
        prune(store, &targets, options)
    } else {
        let store = DiskStore::open(&root)
            .with_context(|| format!("Failed to open project at {}", root.display()))?;
        let targets = filter.targets(&root, store.files());
        prune(store, &targets, options)
    };

    let report = Report::new(&root, cli.check, &summary, files);
    let mut stdout = std::io::stdout().lock();
    render(cli.format, &report, &mut stdout).context("Failed to write report")?;

    let failed = !report.failures.is_empty();
    let would_change = cli.check && report.has_changes();
    Ok(if failed || would_change {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn prune<S: FileStore>(
    store: S,
    targets: &[PathBuf],
    options: PruneOptions,
) -> (RunSummary, Vec<FileEdits>) {
    info!(targets = targets.len(), "pruning");
    for target in targets {
        debug!(file = %target.display(), "target");
    }

    let tracker = (RecordingTracker::new(), LogTracker);
    let mut pruner = Pruner::new(Project::new(), store, tracker, options);
    let summary = pruner.run(targets);
    let (_, _, (recording, _)) = pruner.into_parts();
    (summary, recording.into_files())
}
