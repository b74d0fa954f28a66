//! Weighting schemes for the long and short legs.

use crate::domain::error::FractileError;
use std::fmt;
use std::str::FromStr;

/// How weight is spread inside each leg.
///
/// Only [`WeightingScheme::EqualWeight`] is implemented; the other variants
/// are accepted in configuration and fail with
/// [`FractileError::NotImplemented`] when a portfolio is weighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightingScheme {
    #[default]
    EqualWeight,
    ScoreWeighted,
    InverseVolatility,
}

/// Per-position weight of each leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegWeights {
    pub long: f64,
    pub short: f64,
}

impl WeightingScheme {
    pub fn code(&self) -> &'static str {
        match self {
            WeightingScheme::EqualWeight => "EW",
            WeightingScheme::ScoreWeighted => "SW",
            WeightingScheme::InverseVolatility => "IV",
        }
    }

    /// Weights for a leg of `num_long` longs and `num_short` shorts.
    pub fn leg_weights(
        &self,
        target: &str,
        num_long: usize,
        num_short: usize,
    ) -> Result<LegWeights, FractileError> {
        match self {
            WeightingScheme::EqualWeight => {
                if num_long == 0 || num_short == 0 {
                    return Err(FractileError::Build {
                        target: target.to_string(),
                        reason: format!(
                            "equal weighting needs both legs populated (long {num_long}, short {num_short})"
                        ),
                    });
                }
                Ok(LegWeights {
                    long: 1.0 / num_long as f64,
                    short: -1.0 / num_short as f64,
                })
            }
            WeightingScheme::ScoreWeighted | WeightingScheme::InverseVolatility => {
                Err(FractileError::NotImplemented {
                    scheme: self.to_string(),
                })
            }
        }
    }
}

impl fmt::Display for WeightingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for WeightingScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ew" | "equal" | "equal_weight" => Ok(WeightingScheme::EqualWeight),
            "sw" | "score" | "score_weighted" => Ok(WeightingScheme::ScoreWeighted),
            "iv" | "inverse_vol" | "inverse_volatility" => Ok(WeightingScheme::InverseVolatility),
            other => Err(format!("unknown weighting scheme {other:?} (expected EW, SW or IV)")),
        }
    }
}
