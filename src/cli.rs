//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{CsvAdapter, DEFAULT_DELIMITER};
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{parse_delimiter, validate_run_config, validate_screen_config};
use crate::domain::error::FractileError;
use crate::domain::pipeline::{PipelineConfig, PipelineOutcome, run_pipeline};
use crate::domain::portfolio::{DEFAULT_FRACTILES, Leg, PortfolioResult};
use crate::domain::universe::{ColumnSchema, DEFAULT_MIN_ESG_SCORE, FilterConfig};
use crate::domain::weighting::WeightingScheme;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_OUTPUT_DIR: &str = "Output";

#[derive(Parser, Debug)]
#[command(name = "esgfractile", about = "ESG-screened long/short fractile portfolios")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Screen the universe and build long/short portfolios
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Target factor; repeat for several portfolios
        #[arg(short, long = "target")]
        targets: Vec<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Screen and score the universe without building portfolios
    Screen {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            input,
            output,
            targets,
            dry_run,
        } => run_portfolios(&config, input.as_deref(), output.as_deref(), &targets, dry_run),
        Command::Screen {
            config,
            input,
            output,
        } => run_screen(&config, input.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(err: &FractileError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn build_schema(config: &dyn ConfigPort) -> ColumnSchema {
    let defaults = ColumnSchema::default();
    ColumnSchema {
        identity: config.get_list("schema", "identity").unwrap_or(defaults.identity),
        industry_group: config
            .get_string("schema", "industry_group")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.industry_group),
        esg_pillars: config.get_list("schema", "esg").unwrap_or(defaults.esg_pillars),
        thematic: config.get_list("schema", "thematic").unwrap_or(defaults.thematic),
        financial: config.get_list("schema", "financial").unwrap_or(defaults.financial),
        risk: config.get_list("schema", "risk").unwrap_or(defaults.risk),
    }
}

pub fn build_pipeline_config(config: &dyn ConfigPort) -> Result<PipelineConfig, FractileError> {
    let fractiles = config.get_int("portfolio", "fractiles", DEFAULT_FRACTILES as i64);
    if fractiles < 2 {
        return Err(FractileError::ConfigInvalid {
            section: "portfolio".into(),
            key: "fractiles".into(),
            reason: "fractiles must be at least 2".into(),
        });
    }

    let weighting = match config.get_string("portfolio", "weighting") {
        Some(code) => code
            .parse::<WeightingScheme>()
            .map_err(|reason| FractileError::ConfigInvalid {
                section: "portfolio".into(),
                key: "weighting".into(),
                reason,
            })?,
        None => WeightingScheme::default(),
    };

    let filter = FilterConfig {
        excluded_industry_groups: config
            .get_list("universe", "excluded_industry_groups")
            .unwrap_or_else(|| FilterConfig::default().excluded_industry_groups),
        min_esg_score: config.get_double("universe", "min_esg_score", DEFAULT_MIN_ESG_SCORE),
    };

    Ok(PipelineConfig {
        schema: build_schema(config),
        filter,
        target_factors: config
            .get_list("portfolio", "target_factors")
            .unwrap_or_default(),
        sensitivity_factors: config
            .get_list("portfolio", "sensitivity_factors")
            .filter(|f| !f.is_empty()),
        fractiles: fractiles as usize,
        weighting,
        write_universe: config.get_bool("output", "write_universe", true),
    })
}

pub fn resolve_input(
    input_override: Option<&Path>,
    config: &dyn ConfigPort,
) -> Result<(PathBuf, u8), FractileError> {
    let path = match input_override {
        Some(p) => p.to_path_buf(),
        None => config
            .get_string("input", "path")
            .map(PathBuf::from)
            .ok_or_else(|| FractileError::ConfigMissing {
                section: "input".into(),
                key: "path".into(),
            })?,
    };
    let delimiter = match config.get_string("input", "delimiter") {
        Some(raw) => parse_delimiter(&raw).ok_or_else(|| FractileError::ConfigInvalid {
            section: "input".into(),
            key: "delimiter".into(),
            reason: format!("unrecognised delimiter {raw:?}"),
        })?,
        None => DEFAULT_DELIMITER,
    };
    Ok((path, delimiter))
}

pub fn resolve_output_dir(output_override: Option<&Path>, config: &dyn ConfigPort) -> PathBuf {
    output_override
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("output", "directory").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

fn run_portfolios(
    config_path: &Path,
    input: Option<&Path>,
    output: Option<&Path>,
    target_overrides: &[String],
    dry_run: bool,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let validation = if target_overrides.is_empty() {
        validate_run_config(&adapter)
    } else {
        validate_screen_config(&adapter)
    };
    if let Err(e) = validation {
        return fail(&e);
    }

    // Stage 2: Resolve pipeline settings
    let mut pipeline = match build_pipeline_config(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    if !target_overrides.is_empty() {
        pipeline.target_factors = target_overrides.to_vec();
    }
    let (input_path, delimiter) = match resolve_input(input, &adapter) {
        Ok(i) => i,
        Err(e) => return fail(&e),
    };
    let output_dir = resolve_output_dir(output, &adapter);

    if dry_run {
        print_plan(&pipeline, &input_path, &output_dir);
        eprintln!("\nDry run complete: configuration is valid");
        return ExitCode::SUCCESS;
    }

    // Stage 3: Run
    execute(&pipeline, &input_path, delimiter, &output_dir)
}

fn run_screen(config_path: &Path, input: Option<&Path>, output: Option<&Path>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_screen_config(&adapter) {
        return fail(&e);
    }

    let mut pipeline = match build_pipeline_config(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    pipeline.target_factors.clear();
    pipeline.write_universe = true;

    let (input_path, delimiter) = match resolve_input(input, &adapter) {
        Ok(i) => i,
        Err(e) => return fail(&e),
    };
    let output_dir = resolve_output_dir(output, &adapter);
    execute(&pipeline, &input_path, delimiter, &output_dir)
}

pub fn execute(
    pipeline: &PipelineConfig,
    input_path: &Path,
    delimiter: u8,
    output_dir: &Path,
) -> ExitCode {
    eprintln!("Reading universe from {}", input_path.display());
    let source = CsvAdapter::new(input_path.to_path_buf()).with_delimiter(delimiter);
    let report = CsvReportAdapter::new(output_dir.to_path_buf());

    match run_pipeline(&source, Some(&report), pipeline) {
        Ok(outcome) => {
            print_summary(&outcome);
            eprintln!("\nReports written to: {}", output_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_run_config(&adapter) {
        return fail(&e);
    }
    let pipeline = match build_pipeline_config(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    if let Err(e) = pipeline.schema.validate() {
        return fail(&e);
    }
    let (input_path, _) = match resolve_input(None, &adapter) {
        Ok(i) => i,
        Err(e) => return fail(&e),
    };
    print_plan(&pipeline, &input_path, &resolve_output_dir(None, &adapter));
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn print_plan(pipeline: &PipelineConfig, input: &Path, output: &Path) {
    eprintln!("\nInput:    {}", input.display());
    eprintln!("Output:   {}", output.display());
    eprintln!("\nUniverse:");
    eprintln!("  columns:         {}", pipeline.schema.columns().len());
    eprintln!("  min ESG score:   {}", pipeline.filter.min_esg_score);
    eprintln!(
        "  excluded groups: {}",
        pipeline.filter.excluded_industry_groups.join(", ")
    );
    eprintln!("\nPortfolios:");
    eprintln!("  targets:   {}", pipeline.target_factors.join(", "));
    eprintln!("  fractiles: {}", pipeline.fractiles);
    eprintln!("  weighting: {}", pipeline.weighting);
    if let Some(factors) = &pipeline.sensitivity_factors {
        eprintln!("  tracked:   {}", factors.join(", "));
    }
}

fn print_summary(outcome: &PipelineOutcome) {
    let r = &outcome.filter_report;
    eprintln!("\n=== Universe ===");
    eprintln!("Loaded:            {}", r.loaded);
    eprintln!("After exclusions:  {}", r.after_sector_exclusion);
    eprintln!("After ESG filter:  {}", r.after_esg_threshold);
    eprintln!("Complete rows:     {}", r.after_completeness);

    for result in &outcome.portfolios {
        print_portfolio(result);
    }
}

fn print_portfolio(result: &PortfolioResult) {
    eprintln!(
        "\n=== {} ({} fractiles, {}) ===",
        result.target_factor, result.fractiles, result.weighting
    );
    eprintln!(
        "Long:  {} positions, {:+.4}",
        result.count(Leg::Long),
        result.gross_weight(Leg::Long)
    );
    eprintln!(
        "Short: {} positions, {:+.4}",
        result.count(Leg::Short),
        result.gross_weight(Leg::Short)
    );
    eprintln!("Exposures:");
    for e in &result.exposures {
        eprintln!("  {:<24} {:+.4}", e.factor, e.exposure);
    }
}
