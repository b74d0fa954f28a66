//! Universe filter: sector exclusions, ESG pillar thresholds and completeness.
//!
//! Steps run in a fixed order so the row counts in [`FilterReport`] line up
//! with the diagnostics of earlier runs:
//! project, exclude industry groups, apply pillar minimums (E, S, G), drop
//! incomplete rows.

use crate::domain::error::FractileError;
use crate::domain::table::UniverseTable;
use polars::prelude::*;
use std::collections::HashSet;
use tracing::info;

pub const DEFAULT_MIN_ESG_SCORE: f64 = 3.0;
pub const DEFAULT_EXCLUDED_INDUSTRY_GROUPS: [&str; 3] = ["Oil&Gas", "Oil&Gas Services", "Gas"];

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Named column groups of the input file.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    pub identity: Vec<String>,
    pub industry_group: String,
    pub esg_pillars: Vec<String>,
    pub thematic: Vec<String>,
    pub financial: Vec<String>,
    pub risk: Vec<String>,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            identity: owned(&["name", "isin", "country", "gics_sector_name", "industry_group"]),
            industry_group: "industry_group".to_string(),
            esg_pillars: owned(&["E_SCORE", "S_SCORE", "G_SCORE"]),
            thematic: owned(&["ODD_13", "ODD_14", "ODD_15"]),
            financial: owned(&["ROIC", "PB ratio", "FCF yield"]),
            risk: owned(&[
                "VaR 95% 5Y",
                "CVaR 95% 5Y",
                "Max drawdown 5Y",
                "Sharpe 5Y",
                "Volatility 5Y",
                "Annualized return 5Y",
            ]),
        }
    }
}

impl ColumnSchema {
    /// Every retained column, in output order.
    pub fn columns(&self) -> Vec<String> {
        self.identity
            .iter()
            .chain(&self.esg_pillars)
            .chain(&self.thematic)
            .chain(&self.financial)
            .chain(&self.risk)
            .cloned()
            .collect()
    }

    /// Columns standardized and bucketed in the universe export.
    pub fn factor_columns(&self) -> Vec<String> {
        self.esg_pillars
            .iter()
            .chain(&self.thematic)
            .chain(&self.financial)
            .cloned()
            .collect()
    }

    pub fn validate(&self) -> Result<(), FractileError> {
        if self.esg_pillars.is_empty() {
            return Err(FractileError::Schema {
                reason: "at least one ESG pillar column is required".into(),
            });
        }
        if !self.identity.contains(&self.industry_group) {
            return Err(FractileError::Schema {
                reason: format!(
                    "industry group column {:?} must be one of the identity columns",
                    self.industry_group
                ),
            });
        }
        let mut seen = HashSet::new();
        for column in self.columns() {
            if !seen.insert(column.clone()) {
                return Err(FractileError::Schema {
                    reason: format!("column {column:?} listed more than once"),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub excluded_industry_groups: Vec<String>,
    pub min_esg_score: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            excluded_industry_groups: owned(&DEFAULT_EXCLUDED_INDUSTRY_GROUPS),
            min_esg_score: DEFAULT_MIN_ESG_SCORE,
        }
    }
}

/// Row counts after each filter step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterReport {
    pub loaded: usize,
    pub after_sector_exclusion: usize,
    pub after_esg_threshold: usize,
    pub after_completeness: usize,
}

#[derive(Debug, Clone)]
pub struct FilteredUniverse {
    pub table: UniverseTable,
    pub report: FilterReport,
}

pub fn filter_universe(
    raw: &UniverseTable,
    schema: &ColumnSchema,
    config: &FilterConfig,
) -> Result<FilteredUniverse, FractileError> {
    schema.validate()?;

    let mut report = FilterReport {
        loaded: raw.len(),
        ..FilterReport::default()
    };
    info!(rows = report.loaded, "universe loaded");

    let mut table = raw.project(&schema.columns())?;

    let group = schema.industry_group.as_str();
    let excluded = Series::new("excluded".into(), &config.excluded_industry_groups);
    table = table.filter(col(group).is_null().or(col(group).is_in(lit(excluded)).not()))?;
    report.after_sector_exclusion = table.len();
    info!(rows = report.after_sector_exclusion, "sector exclusions applied");

    for pillar in &schema.esg_pillars {
        // Text in a surviving row is fatal; rows already dropped are not checked.
        table.numeric_column(pillar)?;
        table = table.filter(
            col(pillar.as_str())
                .cast(DataType::Float64)
                .gt_eq(lit(config.min_esg_score)),
        )?;
    }
    report.after_esg_threshold = table.len();
    info!(
        rows = report.after_esg_threshold,
        min_score = config.min_esg_score,
        "ESG thresholds applied"
    );

    table = table.drop_missing()?;
    report.after_completeness = table.len();
    info!(rows = report.after_completeness, "incomplete rows dropped");

    Ok(FilteredUniverse { table, report })
}
