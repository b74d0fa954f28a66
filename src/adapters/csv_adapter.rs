//! Delimited file universe adapter.

use crate::domain::error::FractileError;
use crate::domain::table::{MISSING_MARKERS, UniverseTable};
use crate::ports::data_port::UniversePort;
use polars::prelude::*;
use std::path::PathBuf;

pub const DEFAULT_DELIMITER: u8 = b';';

pub struct CsvAdapter {
    path: PathBuf,
    delimiter: u8,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            delimiter: DEFAULT_DELIMITER,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn input_error(&self, reason: String) -> FractileError {
        FractileError::Input {
            file: self.path.display().to_string(),
            reason,
        }
    }
}

impl UniversePort for CsvAdapter {
    fn load_universe(&self) -> Result<UniverseTable, FractileError> {
        let markers = MISSING_MARKERS.iter().map(|m| PlSmallStr::from(*m)).collect();
        let parse_options = CsvParseOptions::default()
            .with_separator(self.delimiter)
            .with_null_values(Some(NullValues::AllColumns(markers)));
        // No schema inference: every column loads as text.
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_parse_options(parse_options)
            .try_into_reader_with_file_path(Some(self.path.clone()))
            .and_then(|reader| reader.finish())
            .map_err(|e| self.input_error(format!("CSV parse error: {e}")))?;

        if frame
            .get_column_names()
            .iter()
            .all(|name| name.trim().is_empty())
        {
            return Err(self.input_error("empty header row".into()));
        }

        UniverseTable::from_frame(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all_data.csv");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn load_universe_reads_semicolon_file() {
        let (_dir, path) = write_file(
            "name;industry_group;E_SCORE;PB ratio\n\
             Alpha;Software;4.5;1.2\n\
             Beta;Gas;;NaN\n",
        );
        let table = CsvAdapter::new(path).load_universe().unwrap();

        assert_eq!(table.columns(), ["name", "industry_group", "E_SCORE", "PB ratio"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, 2), Some("4.5"));
        assert_eq!(table.value(1, 2), None);
        assert_eq!(table.value(1, 3), None);
    }

    #[test]
    fn load_universe_honours_delimiter() {
        let (_dir, path) = write_file("name,ROIC\nAlpha,0.1\n");
        let table = CsvAdapter::new(path)
            .with_delimiter(b',')
            .load_universe()
            .unwrap();
        assert_eq!(table.columns(), ["name", "ROIC"]);
        assert_eq!(table.value(0, 1), Some("0.1"));
    }

    #[test]
    fn ragged_row_is_input_error() {
        let (_dir, path) = write_file("name;ROIC\nAlpha;0.1;extra\n");
        let err = CsvAdapter::new(path).load_universe().unwrap_err();
        assert!(matches!(err, FractileError::Input { .. }));
    }

    #[test]
    fn padded_cells_and_headers_are_trimmed() {
        let (_dir, path) = write_file("name ; ROIC\n Alpha ; N/A \n");
        let table = CsvAdapter::new(path).load_universe().unwrap();
        assert_eq!(table.columns(), ["name", "ROIC"]);
        assert_eq!(table.value(0, 0), Some("Alpha"));
        assert_eq!(table.value(0, 1), None);
    }

    #[test]
    fn numbers_load_as_text() {
        let (_dir, path) = write_file("name;ROIC\nAlpha;0.10\nBeta;high\n");
        let table = CsvAdapter::new(path).load_universe().unwrap();
        assert_eq!(table.value(0, 1), Some("0.10"));
        assert_eq!(table.value(1, 1), Some("high"));
    }

    #[test]
    fn missing_file_is_input_error() {
        let err = CsvAdapter::new(PathBuf::from("/nonexistent/all_data.csv"))
            .load_universe()
            .unwrap_err();
        assert!(matches!(err, FractileError::Input { .. }));
    }
}
