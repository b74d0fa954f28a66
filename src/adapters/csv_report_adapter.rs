//! CSV report adapter implementing ReportPort.
//!
//! File names are derived from the target factor and fractile count:
//! `Universe_{N}F.csv`, `Portfolio_{target}_{N}F.csv`, `Sensi_{target}_{N}F.csv`
//! and `Buckets_{target}_{N}F.csv`.

use crate::domain::error::FractileError;
use crate::domain::fractile::{ScoredUniverse, fractile_column, zscore_column};
use crate::domain::portfolio::PortfolioResult;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

fn file_stem_safe(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

pub fn universe_file_name(fractiles: usize) -> String {
    format!("Universe_{fractiles}F.csv")
}

pub fn portfolio_file_name(target: &str, fractiles: usize) -> String {
    format!("Portfolio_{}_{fractiles}F.csv", file_stem_safe(target))
}

pub fn sensitivity_file_name(target: &str, fractiles: usize) -> String {
    format!("Sensi_{}_{fractiles}F.csv", file_stem_safe(target))
}

pub fn buckets_file_name(target: &str, fractiles: usize) -> String {
    format!("Buckets_{}_{fractiles}F.csv", file_stem_safe(target))
}

fn scored_header(scored: &ScoredUniverse) -> Vec<String> {
    let mut header = scored.table.columns();
    for f in &scored.factors {
        header.push(zscore_column(&f.factor));
        header.push(fractile_column(&f.factor));
    }
    header
}

fn scored_row(scored: &ScoredUniverse, row: usize) -> Vec<String> {
    let mut fields: Vec<String> = (0..scored.table.frame().width())
        .map(|c| scored.table.value(row, c).unwrap_or_default().to_string())
        .collect();
    for f in &scored.factors {
        fields.push(f.zscores[row].to_string());
        fields.push(f.fractiles.labels[row].to_string());
    }
    fields
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn create(&self, file_name: &str) -> Result<csv::Writer<fs::File>, FractileError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(file_name);
        info!(path = %path.display(), "writing report");
        Ok(csv::Writer::from_path(path)?)
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_universe(&self, scored: &ScoredUniverse) -> Result<(), FractileError> {
        let mut wtr = self.create(&universe_file_name(scored.fractile_count))?;
        wtr.write_record(scored_header(scored))?;
        for row in 0..scored.table.len() {
            wtr.write_record(scored_row(scored, row))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_portfolio(&self, result: &PortfolioResult) -> Result<(), FractileError> {
        let target = &result.target_factor;
        let n = result.fractiles;

        let mut wtr = self.create(&portfolio_file_name(target, n))?;
        let mut header = scored_header(&result.scored);
        header.push("Weight".to_string());
        wtr.write_record(&header)?;
        for position in &result.positions {
            let mut fields = scored_row(&result.scored, position.row);
            fields.push(position.weight.to_string());
            wtr.write_record(&fields)?;
        }
        wtr.flush()?;

        let mut wtr = self.create(&sensitivity_file_name(target, n))?;
        for exposure in &result.exposures {
            wtr.serialize(exposure)?;
        }
        wtr.flush()?;

        if let Some(scores) = result.target_scores() {
            let mut wtr = self.create(&buckets_file_name(target, n))?;
            for bucket in &scores.fractiles.buckets {
                wtr.serialize(bucket)?;
            }
            wtr.flush()?;
        }
        Ok(())
    }
}
