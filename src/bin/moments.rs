//! Moments CLI - Command-line interface for the moment engine
//!
//! Commands:
//! - analyze: Load a dataset registry and print the ranked analysis report
//! - timeline: Print per-dataset timeline lanes of ranked moments
//! - patterns: Assess an interaction-pattern corpus
//! - validate: Check a dataset registry and the files it points at
//! - schema: Describe the accepted input shapes

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use moment_engine::loader::fetch_all;
use moment_engine::logging::{init_tracing, DEFAULT_FILTER};
use moment_engine::ranking::{by_category, by_dataset, top};
use moment_engine::timeline::cross_dataset;
use moment_engine::{
    normalize_source, AnalysisReport, DatasetRegistry, Moment, MomentCategory, MomentEngine,
    ENGINE_VERSION,
};

/// Moments - detect and rank significant events in trust/ATP simulation logs
#[derive(Parser)]
#[command(name = "moments")]
#[command(author = "Web4 Trust Lab")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Detect, rank and summarize moments in simulation logs", long_about = None)]
struct Cli {
    /// Tracing filter directive (e.g. "info", "moment_engine=debug")
    #[arg(long, global = true, default_value = DEFAULT_FILTER)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every dataset in a registry
    Analyze {
        /// Registry JSON file
        #[arg(short, long)]
        registry: PathBuf,

        /// Directory dataset filenames resolve against (defaults to the registry's directory)
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Only keep moments of this category
        #[arg(long)]
        category: Option<String>,

        /// Only keep moments of this dataset
        #[arg(long)]
        dataset: Option<String>,

        /// Keep at most this many moments (after filtering)
        #[arg(long)]
        limit: Option<usize>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,
    },

    /// Print per-dataset timeline lanes
    Timeline {
        /// Registry JSON file
        #[arg(short, long)]
        registry: PathBuf,

        /// Directory dataset filenames resolve against
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Show at most this many lives per dataset
        #[arg(long)]
        max_lives: Option<usize>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,
    },

    /// Assess an interaction-pattern corpus
    Patterns {
        /// Pattern corpus file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Number of key patterns to include
        #[arg(long, default_value = "5")]
        key_patterns: usize,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,
    },

    /// Check a registry and try to normalize every dataset it names
    Validate {
        /// Registry JSON file
        #[arg(short, long)]
        registry: PathBuf,

        /// Directory dataset filenames resolve against
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Output validation report as JSON (default when stdout is not a terminal)
        #[arg(long)]
        json: bool,
    },

    /// Describe the registry format and the accepted dataset shapes
    Schema,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), MomentsCliError> {
    match command {
        Commands::Analyze {
            registry,
            base_dir,
            category,
            dataset,
            limit,
            format,
        } => cmd_analyze(
            &registry,
            base_dir.as_deref(),
            category.as_deref(),
            dataset.as_deref(),
            limit,
            format,
        ),

        Commands::Timeline {
            registry,
            base_dir,
            max_lives,
            format,
        } => cmd_timeline(&registry, base_dir.as_deref(), max_lives, format),

        Commands::Patterns {
            input,
            key_patterns,
            format,
        } => cmd_patterns(&input, key_patterns, format),

        Commands::Validate {
            registry,
            base_dir,
            json,
        } => cmd_validate(&registry, base_dir.as_deref(), json),

        Commands::Schema => cmd_schema(),
    }
}

fn cmd_analyze(
    registry_path: &Path,
    base_dir: Option<&Path>,
    category: Option<&str>,
    dataset: Option<&str>,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<(), MomentsCliError> {
    let category = category
        .map(|c| MomentCategory::parse(c).ok_or_else(|| MomentsCliError::UnknownCategory(c.to_string())))
        .transpose()?;

    let registry = load_registry(registry_path)?;
    let base_dir = resolve_base_dir(registry_path, base_dir);

    let engine = MomentEngine::new();
    let runtime = runtime()?;
    let mut report = runtime.block_on(engine.run(&registry, &base_dir));

    report.moments = filter_moments(&report.moments, category, dataset, limit);
    print_json(&report, &format)
}

fn cmd_timeline(
    registry_path: &Path,
    base_dir: Option<&Path>,
    max_lives: Option<usize>,
    format: OutputFormat,
) -> Result<(), MomentsCliError> {
    let registry = load_registry(registry_path)?;
    let base_dir = resolve_base_dir(registry_path, base_dir);

    let engine = MomentEngine::new();
    let runtime = runtime()?;
    let fetched = runtime.block_on(fetch_all(&registry, &base_dir));
    let batch = engine.normalize_all(&fetched);
    let report: AnalysisReport = engine.report(&batch);

    let lanes = cross_dataset(&batch.datasets, &report.moments, max_lives);
    print_json(&lanes, &format)
}

fn cmd_patterns(input: &Path, key_patterns: usize, format: OutputFormat) -> Result<(), MomentsCliError> {
    let corpus = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(MomentsCliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let engine = MomentEngine::new().with_key_patterns(key_patterns);
    let report = engine.assess_patterns(&corpus)?;
    print_json(&report, &format)
}

fn cmd_validate(registry_path: &Path, base_dir: Option<&Path>, json: bool) -> Result<(), MomentsCliError> {
    let registry = load_registry(registry_path)?;
    let base_dir = resolve_base_dir(registry_path, base_dir);

    let runtime = runtime()?;
    let fetched = runtime.block_on(fetch_all(&registry, &base_dir));

    let checks: Vec<DatasetCheck> = fetched
        .iter()
        .map(|item| {
            let descriptor = &item.descriptor;
            let (status, message) = match &item.raw {
                None => (CheckStatus::Error, format!("cannot read {}", descriptor.filename)),
                Some(raw) => match normalize_source(raw, descriptor) {
                    Some(_) => (CheckStatus::Ok, format!("normalizes as {}", descriptor.schema.as_str())),
                    None => (
                        CheckStatus::Error,
                        format!("does not match schema {}", descriptor.schema.as_str()),
                    ),
                },
            };
            DatasetCheck {
                id: descriptor.id.clone(),
                filename: descriptor.filename.clone(),
                status,
                message,
            }
        })
        .collect();

    let failed = checks
        .iter()
        .filter(|c| matches!(c.status, CheckStatus::Error))
        .count();
    let report = ValidationReport {
        total_datasets: checks.len(),
        valid_datasets: checks.len() - failed,
        invalid_datasets: failed,
        checks,
    };

    if json || !atty::is(atty::Stream::Stdout) {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Registry Validation Report");
        println!("==========================");
        println!("Total datasets:   {}", report.total_datasets);
        println!("Valid datasets:   {}", report.valid_datasets);
        println!("Invalid datasets: {}", report.invalid_datasets);
        println!("\nChecks:");
        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.id, check.message);
        }
    }

    if report.invalid_datasets > 0 {
        Err(MomentsCliError::ValidationFailed(report.invalid_datasets))
    } else {
        Ok(())
    }
}

fn cmd_schema() -> Result<(), MomentsCliError> {
    println!("Registry: {{ \"datasets\": [ {{ id, filename, label, narrative_id?, schema }} ] }}");
    println!();
    println!("Schema kinds:");
    println!();
    println!("1. {{ \"kind\": \"multi_life\" }}");
    println!("   {{ lives: [ {{ t3_history | trust_history, atp_history, start_tick?, end_tick?,");
    println!("              termination_reason?, life_state? }} ] }}");
    println!();
    println!("2. {{ \"kind\": \"nested_multi_life\", \"key\": \"<key>\" }}");
    println!("   {{ <key>: {{ lives: [...] }} }}");
    println!();
    println!("3. {{ \"kind\": \"life_summary\" }}");
    println!("   {{ life_summary: {{ initial_trust, final_trust, initial_atp, final_atp,");
    println!("                     ticks_survived, termination_reason }} }}");
    println!();
    println!("4. {{ \"kind\": \"network_log\" }}");
    println!("   {{ num_agents, num_ticks, events: [ {{ tick, type, agents }} ],");
    println!("     snapshots: [ {{ tick, avg_trust, num_edges, num_coalitions, num_alive }} ] }}");
    println!();
    println!("Moment categories: {}", category_list());
    Ok(())
}

// Helper functions

fn load_registry(path: &Path) -> Result<DatasetRegistry, MomentsCliError> {
    let json = fs::read_to_string(path)?;
    Ok(DatasetRegistry::from_json(&json)?)
}

fn resolve_base_dir(registry_path: &Path, base_dir: Option<&Path>) -> PathBuf {
    match base_dir {
        Some(dir) => dir.to_path_buf(),
        None => registry_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, MomentsCliError> {
    Ok(tokio::runtime::Builder::new_multi_thread().enable_all().build()?)
}

/// Category, then dataset, then limit; each step keeps rank order
fn filter_moments(
    ranked: &[Moment],
    category: Option<MomentCategory>,
    dataset: Option<&str>,
    limit: Option<usize>,
) -> Vec<Moment> {
    let mut kept: Vec<Moment> = match category {
        Some(category) => by_category(ranked, category).into_iter().cloned().collect(),
        None => ranked.to_vec(),
    };
    if let Some(dataset) = dataset {
        kept = by_dataset(&kept, dataset).into_iter().cloned().collect();
    }
    match limit {
        Some(n) => top(&kept, n).to_vec(),
        None => kept,
    }
}

fn category_list() -> String {
    MomentCategory::ALL
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_json<T: serde::Serialize>(value: &T, format: &OutputFormat) -> Result<(), MomentsCliError> {
    let output = match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
    };
    println!("{}", output);
    Ok(())
}

// Error types

#[derive(Debug)]
enum MomentsCliError {
    Io(io::Error),
    Engine(moment_engine::EngineError),
    Json(serde_json::Error),
    UnknownCategory(String),
    NoInput,
    ValidationFailed(usize),
}

impl From<io::Error> for MomentsCliError {
    fn from(e: io::Error) -> Self {
        MomentsCliError::Io(e)
    }
}

impl From<moment_engine::EngineError> for MomentsCliError {
    fn from(e: moment_engine::EngineError) -> Self {
        MomentsCliError::Engine(e)
    }
}

impl From<serde_json::Error> for MomentsCliError {
    fn from(e: serde_json::Error) -> Self {
        MomentsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MomentsCliError> for CliError {
    fn from(e: MomentsCliError) -> Self {
        match e {
            MomentsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MomentsCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'moments schema' for the accepted formats".to_string()),
            },
            MomentsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            MomentsCliError::UnknownCategory(category) => CliError {
                code: "UNKNOWN_CATEGORY".to_string(),
                message: format!("Unknown moment category: {}", category),
                hint: Some(format!("Use one of: {}", category_list())),
            },
            MomentsCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "stdin is a terminal, nothing to read".to_string(),
                hint: Some("Pipe a pattern corpus in or pass --input <file>".to_string()),
            },
            MomentsCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} datasets failed validation", count),
                hint: Some("Fix the listed datasets and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_datasets: usize,
    valid_datasets: usize,
    invalid_datasets: usize,
    checks: Vec<DatasetCheck>,
}

#[derive(serde::Serialize)]
struct DatasetCheck {
    id: String,
    filename: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Error,
}
