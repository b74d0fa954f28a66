//! Configuration validation.
//!
//! Checks every config field a run depends on before any data is read.

use crate::domain::error::FractileError;
use crate::domain::weighting::WeightingScheme;
use crate::ports::config_port::ConfigPort;

/// Resolves a configured delimiter: a single ASCII symbol or one of
/// `semicolon`, `comma`, `tab`, `pipe`.
pub fn parse_delimiter(value: &str) -> Option<u8> {
    match value.trim().to_ascii_lowercase().as_str() {
        "semicolon" => Some(b';'),
        "comma" => Some(b','),
        "tab" | "\\t" => Some(b'\t'),
        "pipe" => Some(b'|'),
        other => match other.as_bytes() {
            [b] if b.is_ascii_punctuation() => Some(*b),
            _ => None,
        },
    }
}

/// Checks shared by every command that reads the universe. Targets given on
/// the command line skip only the `target_factors` check.
pub fn validate_screen_config(config: &dyn ConfigPort) -> Result<(), FractileError> {
    validate_input_path(config)?;
    validate_delimiter(config)?;
    validate_min_esg_score(config)?;
    validate_fractiles(config)?;
    validate_weighting(config)?;
    Ok(())
}

pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), FractileError> {
    validate_screen_config(config)?;
    validate_target_factors(config)?;
    Ok(())
}

fn validate_input_path(config: &dyn ConfigPort) -> Result<(), FractileError> {
    match config.get_string("input", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(FractileError::ConfigMissing {
            section: "input".to_string(),
            key: "path".to_string(),
        }),
    }
}

fn validate_delimiter(config: &dyn ConfigPort) -> Result<(), FractileError> {
    match config.get_string("input", "delimiter") {
        Some(s) if parse_delimiter(&s).is_none() => Err(FractileError::ConfigInvalid {
            section: "input".to_string(),
            key: "delimiter".to_string(),
            reason: format!("unrecognised delimiter {s:?}"),
        }),
        _ => Ok(()),
    }
}

fn validate_min_esg_score(config: &dyn ConfigPort) -> Result<(), FractileError> {
    let Some(raw) = config.get_string("universe", "min_esg_score") else {
        return Ok(());
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(()),
        _ => Err(FractileError::ConfigInvalid {
            section: "universe".to_string(),
            key: "min_esg_score".to_string(),
            reason: "min_esg_score must be a number".to_string(),
        }),
    }
}

fn validate_fractiles(config: &dyn ConfigPort) -> Result<(), FractileError> {
    let Some(raw) = config.get_string("portfolio", "fractiles") else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(v) if v >= 2 => Ok(()),
        _ => Err(FractileError::ConfigInvalid {
            section: "portfolio".to_string(),
            key: "fractiles".to_string(),
            reason: "fractiles must be an integer of at least 2".to_string(),
        }),
    }
}

fn validate_weighting(config: &dyn ConfigPort) -> Result<(), FractileError> {
    match config.get_string("portfolio", "weighting") {
        Some(s) => s
            .parse::<WeightingScheme>()
            .map(|_| ())
            .map_err(|reason| FractileError::ConfigInvalid {
                section: "portfolio".to_string(),
                key: "weighting".to_string(),
                reason,
            }),
        None => Ok(()),
    }
}

fn validate_target_factors(config: &dyn ConfigPort) -> Result<(), FractileError> {
    match config.get_list("portfolio", "target_factors") {
        Some(targets) if !targets.is_empty() => Ok(()),
        _ => Err(FractileError::ConfigMissing {
            section: "portfolio".to_string(),
            key: "target_factors".to_string(),
        }),
    }
}
