//! Net factor exposure of a weighted portfolio.

use crate::domain::fractile::ScoredUniverse;
use crate::domain::portfolio::Position;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FactorExposure {
    pub factor: String,
    pub exposure: f64,
}

/// Sum of weight times z-score over `positions`, for every scored factor.
pub fn compute_exposures(scored: &ScoredUniverse, positions: &[Position]) -> Vec<FactorExposure> {
    scored
        .factors
        .iter()
        .map(|f| FactorExposure {
            factor: f.factor.clone(),
            exposure: positions.iter().map(|p| p.weight * f.zscores[p.row]).sum(),
        })
        .collect()
}

pub fn exposure_of<'a>(exposures: &'a [FactorExposure], factor: &str) -> Option<&'a FactorExposure> {
    exposures.iter().find(|e| e.factor == factor)
}
