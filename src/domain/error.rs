//! Domain error types.

use std::fmt;

/// Top-level error type for esgfractile.
#[derive(Debug, thiserror::Error)]
pub enum FractileError {
    #[error("parse error in column {column:?} at row {row}: {value:?} is not a number")]
    Parse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("schema error: {reason}")]
    Schema { reason: String },

    #[error("weighting scheme {scheme} is not implemented")]
    NotImplemented { scheme: String },

    #[error("cannot build {target} portfolio: {reason}")]
    Build { target: String, reason: String },

    #[error("input error in {file}: {reason}")]
    Input { file: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),
}

impl FractileError {
    pub fn missing_column(column: &str) -> Self {
        FractileError::Schema {
            reason: format!("column {column:?} not found"),
        }
    }
}

impl From<&FractileError> for std::process::ExitCode {
    fn from(err: &FractileError) -> Self {
        let code: u8 = match err {
            FractileError::Input { .. }
            | FractileError::Csv(_)
            | FractileError::Io(_)
            | FractileError::Polars(_) => 1,
            FractileError::ConfigParse { .. }
            | FractileError::ConfigMissing { .. }
            | FractileError::ConfigInvalid { .. } => 2,
            FractileError::Parse { .. } => 3,
            FractileError::Schema { .. } => 4,
            FractileError::NotImplemented { .. } => 5,
            FractileError::Build { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

/// Pipeline stage in which an error surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    UniverseFilter,
    UniverseScoring,
    PortfolioBuild,
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::UniverseFilter => "universe filter",
            Stage::UniverseScoring => "universe scoring",
            Stage::PortfolioBuild => "portfolio build",
            Stage::Export => "export",
        };
        f.write_str(name)
    }
}

/// A [`FractileError`] tagged with the stage that raised it.
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: FractileError,
}

impl StageError {
    pub fn at(stage: Stage) -> impl FnOnce(FractileError) -> Self {
        move |source| StageError { stage, source }
    }
}

impl From<&StageError> for std::process::ExitCode {
    fn from(err: &StageError) -> Self {
        (&err.source).into()
    }
}
