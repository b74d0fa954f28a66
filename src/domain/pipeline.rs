//! End-to-end run: load, filter, score, build portfolios, export.
//!
//! Nothing is written until every portfolio has been built, so a failing
//! target leaves no partial output behind.

use crate::domain::error::{Stage, StageError};
use crate::domain::fractile::{ScoredUniverse, score_universe};
use crate::domain::portfolio::{DEFAULT_FRACTILES, FractilePortfolio, PortfolioConfig, PortfolioResult};
use crate::domain::universe::{ColumnSchema, FilterConfig, FilterReport, filter_universe};
use crate::domain::weighting::WeightingScheme;
use crate::ports::data_port::UniversePort;
use crate::ports::report_port::ReportPort;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub schema: ColumnSchema,
    pub filter: FilterConfig,
    pub target_factors: Vec<String>,
    pub sensitivity_factors: Option<Vec<String>>,
    pub fractiles: usize,
    pub weighting: WeightingScheme,
    pub write_universe: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            schema: ColumnSchema::default(),
            filter: FilterConfig::default(),
            target_factors: Vec::new(),
            sensitivity_factors: None,
            fractiles: DEFAULT_FRACTILES,
            weighting: WeightingScheme::default(),
            write_universe: true,
        }
    }
}

impl PipelineConfig {
    pub fn portfolio_config(&self, target: &str) -> PortfolioConfig {
        PortfolioConfig {
            target_factor: target.to_string(),
            sensitivity_factors: self.sensitivity_factors.clone(),
            fractiles: self.fractiles,
            weighting: self.weighting,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub filter_report: FilterReport,
    pub universe: ScoredUniverse,
    pub portfolios: Vec<PortfolioResult>,
}

pub fn run_pipeline(
    source: &dyn UniversePort,
    report: Option<&dyn ReportPort>,
    config: &PipelineConfig,
) -> Result<PipelineOutcome, StageError> {
    let raw = source.load_universe().map_err(StageError::at(Stage::Load))?;

    let filtered = filter_universe(&raw, &config.schema, &config.filter)
        .map_err(StageError::at(Stage::UniverseFilter))?;

    let universe = score_universe(
        &filtered.table,
        &config.schema.identity,
        &config.schema.factor_columns(),
        config.fractiles,
    )
    .map_err(StageError::at(Stage::UniverseScoring))?;

    let portfolios = config
        .target_factors
        .iter()
        .map(|target| {
            FractilePortfolio::new(
                &filtered.table,
                &config.schema.identity,
                &config.portfolio_config(target),
            )?
            .process()
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(StageError::at(Stage::PortfolioBuild))?;

    if let Some(report) = report {
        if config.write_universe {
            report
                .write_universe(&universe)
                .map_err(StageError::at(Stage::Export))?;
        }
        report
            .write_portfolios(&portfolios)
            .map_err(StageError::at(Stage::Export))?;
    }

    info!(
        universe = universe.table.len(),
        portfolios = portfolios.len(),
        "pipeline complete"
    );
    Ok(PipelineOutcome {
        filter_report: filtered.report,
        universe,
        portfolios,
    })
}
