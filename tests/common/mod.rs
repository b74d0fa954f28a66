#![allow(dead_code)]

use esgfractile::domain::error::FractileError;
use esgfractile::domain::table::UniverseTable;
use esgfractile::domain::universe::ColumnSchema;
use esgfractile::ports::data_port::UniversePort;
use std::path::{Path, PathBuf};

pub struct MockUniversePort {
    pub table: Option<UniverseTable>,
    pub error: Option<String>,
}

impl MockUniversePort {
    pub fn new(table: UniverseTable) -> Self {
        Self {
            table: Some(table),
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            table: None,
            error: Some(reason.to_string()),
        }
    }
}

impl UniversePort for MockUniversePort {
    fn load_universe(&self) -> Result<UniverseTable, FractileError> {
        if let Some(reason) = &self.error {
            return Err(FractileError::Input {
                file: "mock".into(),
                reason: reason.clone(),
            });
        }
        Ok(self.table.clone().unwrap_or_default())
    }
}

/// One security in the default column layout.
#[derive(Debug, Clone)]
pub struct Security {
    pub name: String,
    pub industry_group: String,
    pub esg: [String; 3],
    pub roic: String,
    pub pb: String,
    pub fcf: String,
    pub sharpe: String,
}

impl Security {
    pub fn new(name: &str, roic: f64) -> Self {
        Self {
            name: name.to_string(),
            industry_group: "Software".to_string(),
            esg: ["4".into(), "4".into(), "4".into()],
            roic: roic.to_string(),
            pb: (10.0 - roic).to_string(),
            fcf: (roic / 2.0).to_string(),
            sharpe: "0.8".to_string(),
        }
    }

    pub fn group(mut self, group: &str) -> Self {
        self.industry_group = group.to_string();
        self
    }

    pub fn esg(mut self, e: &str, s: &str, g: &str) -> Self {
        self.esg = [e.into(), s.into(), g.into()];
        self
    }

    pub fn sharpe(mut self, value: &str) -> Self {
        self.sharpe = value.to_string();
        self
    }

    pub fn cells(&self) -> Vec<String> {
        let isin = format!("XX{:0>10}", self.name.len());
        vec![
            self.name.clone(),
            isin,
            "FR".into(),
            "Information Technology".into(),
            self.industry_group.clone(),
            self.esg[0].clone(),
            self.esg[1].clone(),
            self.esg[2].clone(),
            "1".into(),
            "0".into(),
            "1".into(),
            self.roic.clone(),
            self.pb.clone(),
            self.fcf.clone(),
            "-0.05".into(),
            "-0.08".into(),
            "-0.3".into(),
            self.sharpe.clone(),
            "0.2".into(),
            "0.07".into(),
        ]
    }
}

pub fn default_columns() -> Vec<String> {
    ColumnSchema::default().columns()
}

pub fn universe_table(securities: &[Security]) -> UniverseTable {
    let columns = default_columns();
    let names: Vec<&str> = columns.iter().map(String::as_str).collect();
    let rows: Vec<Vec<String>> = securities.iter().map(Security::cells).collect();
    UniverseTable::from_cells(&names, &rows).unwrap()
}

/// Semicolon-delimited file content in the default column layout.
pub fn universe_csv(securities: &[Security]) -> String {
    let mut out = default_columns().join(";");
    out.push('\n');
    for s in securities {
        out.push_str(&s.cells().join(";"));
        out.push('\n');
    }
    out
}

pub fn write_universe_csv(dir: &Path, securities: &[Security]) -> PathBuf {
    let path = dir.join("all_data.csv");
    std::fs::write(&path, universe_csv(securities)).unwrap();
    path
}

/// Twelve eligible securities with ROIC 1..=12 plus four that the filter drops.
pub fn sample_securities() -> Vec<Security> {
    let mut securities: Vec<Security> = (1..=12)
        .map(|i| Security::new(&format!("Eligible{i:02}"), f64::from(i)))
        .collect();
    securities.push(Security::new("Driller", 20.0).group("Oil&Gas"));
    securities.push(Security::new("Pipeline", 21.0).group("Gas"));
    securities.push(Security::new("Laggard", 22.0).esg("4", "2", "5"));
    securities.push(Security::new("Incomplete", 23.0).sharpe(""));
    securities
}
