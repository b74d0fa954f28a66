//! Report output port trait.

use crate::domain::error::FractileError;
use crate::domain::fractile::ScoredUniverse;
use crate::domain::portfolio::PortfolioResult;

/// Port for persisting the scored universe and built portfolios.
pub trait ReportPort {
    fn write_universe(&self, scored: &ScoredUniverse) -> Result<(), FractileError>;

    fn write_portfolio(&self, result: &PortfolioResult) -> Result<(), FractileError>;

    /// Default implementation: writes each portfolio in turn.
    fn write_portfolios(&self, results: &[PortfolioResult]) -> Result<(), FractileError> {
        results.iter().try_for_each(|r| self.write_portfolio(r))
    }
}
