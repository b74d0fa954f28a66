//! Core domain types and logic.

pub mod table;
pub mod universe;
pub mod fractile;
pub mod weighting;
pub mod portfolio;
pub mod exposure;
pub mod pipeline;
pub mod config_validation;
pub mod error;
