//! Long/short fractile portfolio construction.
//!
//! Longs the highest fractile of the target factor, shorts the lowest, and
//! reports the resulting exposure to every sensitivity factor.

use crate::domain::error::FractileError;
use crate::domain::exposure::{FactorExposure, compute_exposures, exposure_of};
use crate::domain::fractile::{FactorScores, ScoredUniverse, check_fractile_count, score_universe};
use crate::domain::table::UniverseTable;
use crate::domain::weighting::WeightingScheme;
use tracing::info;

pub const DEFAULT_FRACTILES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Long,
    Short,
}

/// A weighted holding; `row` indexes the scored universe table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub row: usize,
    pub leg: Leg,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioConfig {
    pub target_factor: String,
    /// `None` tracks every non-identity column.
    pub sensitivity_factors: Option<Vec<String>>,
    pub fractiles: usize,
    pub weighting: WeightingScheme,
}

impl PortfolioConfig {
    pub fn new(target_factor: impl Into<String>) -> Self {
        Self {
            target_factor: target_factor.into(),
            sensitivity_factors: None,
            fractiles: DEFAULT_FRACTILES,
            weighting: WeightingScheme::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FractilePortfolio {
    universe: UniverseTable,
    identity_columns: Vec<String>,
    target_factor: String,
    sensitivity_factors: Vec<String>,
    fractiles: usize,
    weighting: WeightingScheme,
}

#[derive(Debug, Clone)]
pub struct PortfolioResult {
    pub target_factor: String,
    pub fractiles: usize,
    pub weighting: WeightingScheme,
    pub scored: ScoredUniverse,
    pub positions: Vec<Position>,
    pub exposures: Vec<FactorExposure>,
}

impl FractilePortfolio {
    pub fn new(
        universe: &UniverseTable,
        identity_columns: &[String],
        config: &PortfolioConfig,
    ) -> Result<Self, FractileError> {
        check_fractile_count(config.fractiles)?;

        let (identity_columns, sensitivity_factors) = match &config.sensitivity_factors {
            Some(factors) => {
                for column in identity_columns.iter().chain(factors) {
                    universe.require_column(column)?;
                }
                (identity_columns.to_vec(), factors.clone())
            }
            None => {
                let present: Vec<String> = identity_columns
                    .iter()
                    .filter(|c| universe.has_column(c))
                    .cloned()
                    .collect();
                let factors = universe
                    .columns()
                    .into_iter()
                    .filter(|c| !identity_columns.contains(c))
                    .collect();
                (present, factors)
            }
        };

        if !sensitivity_factors.contains(&config.target_factor) {
            return Err(FractileError::Schema {
                reason: format!(
                    "target factor {:?} is not among the sensitivity factors",
                    config.target_factor
                ),
            });
        }

        Ok(Self {
            universe: universe.clone(),
            identity_columns,
            target_factor: config.target_factor.clone(),
            sensitivity_factors,
            fractiles: config.fractiles,
            weighting: config.weighting,
        })
    }

    pub fn target_factor(&self) -> &str {
        &self.target_factor
    }

    pub fn sensitivity_factors(&self) -> &[String] {
        &self.sensitivity_factors
    }

    /// Z-scores and fractile labels for every sensitivity factor.
    pub fn compute_scores(&self) -> Result<ScoredUniverse, FractileError> {
        score_universe(
            &self.universe,
            &self.identity_columns,
            &self.sensitivity_factors,
            self.fractiles,
        )
    }

    fn target_scores<'a>(&self, scored: &'a ScoredUniverse) -> Result<&'a FactorScores, FractileError> {
        scored
            .factor(&self.target_factor)
            .ok_or_else(|| FractileError::missing_column(&self.target_factor))
    }

    /// Weighted positions in the lowest (short) and highest (long) target fractiles.
    pub fn build_leg(&self, scored: &ScoredUniverse) -> Result<Vec<Position>, FractileError> {
        let target = self.target_scores(scored)?;
        let num_short = target.fractiles.count(1);
        let num_long = target.fractiles.count(self.fractiles);
        let weights = self
            .weighting
            .leg_weights(&self.target_factor, num_long, num_short)?;

        let positions = target
            .fractiles
            .labels
            .iter()
            .enumerate()
            .filter_map(|(row, &label)| {
                if label == self.fractiles {
                    Some(Position {
                        row,
                        leg: Leg::Long,
                        weight: weights.long,
                    })
                } else if label == 1 {
                    Some(Position {
                        row,
                        leg: Leg::Short,
                        weight: weights.short,
                    })
                } else {
                    None
                }
            })
            .collect();
        Ok(positions)
    }

    /// Scores the universe, weights the extreme fractiles and computes exposures.
    pub fn process(&self) -> Result<PortfolioResult, FractileError> {
        let scored = self.compute_scores()?;
        let positions = self.build_leg(&scored)?;
        let exposures = compute_exposures(&scored, &positions);

        let result = PortfolioResult {
            target_factor: self.target_factor.clone(),
            fractiles: self.fractiles,
            weighting: self.weighting,
            scored,
            positions,
            exposures,
        };
        info!(
            factor = %result.target_factor,
            fractiles = result.fractiles,
            long = result.count(Leg::Long),
            short = result.count(Leg::Short),
            exposure = result.target_exposure(),
            "portfolio built"
        );
        Ok(result)
    }
}

impl PortfolioResult {
    pub fn count(&self, leg: Leg) -> usize {
        self.positions.iter().filter(|p| p.leg == leg).count()
    }

    pub fn gross_weight(&self, leg: Leg) -> f64 {
        self.positions
            .iter()
            .filter(|p| p.leg == leg)
            .map(|p| p.weight)
            .sum()
    }

    pub fn net_weight(&self) -> f64 {
        self.positions.iter().map(|p| p.weight).sum()
    }

    pub fn target_exposure(&self) -> f64 {
        exposure_of(&self.exposures, &self.target_factor).map_or(0.0, |e| e.exposure)
    }

    pub fn target_scores(&self) -> Option<&FactorScores> {
        self.scored.factor(&self.target_factor)
    }
}
