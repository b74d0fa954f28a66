//! Universe table: a polars [`DataFrame`] of text columns.
//!
//! Every column is held as `String` with nulls for missing values. Numeric
//! columns are cast on demand so that a malformed value surfaces as a
//! [`FractileError::Parse`] naming the column and row.

use crate::domain::error::FractileError;
use polars::prelude::*;

/// Input markers treated as a missing value.
pub const MISSING_MARKERS: [&str; 9] = ["NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A", "-nan"];

/// Normalizes a raw cell: trims it and maps blanks and missing markers to `None`.
pub fn parse_cell(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed) {
        None
    } else {
        Some(trimmed)
    }
}

/// Ordered rows sharing a fixed column schema. Rows are dropped, never edited.
#[derive(Debug, Clone)]
pub struct UniverseTable {
    frame: DataFrame,
}

impl Default for UniverseTable {
    fn default() -> Self {
        Self {
            frame: DataFrame::empty(),
        }
    }
}

impl PartialEq for UniverseTable {
    fn eq(&self, other: &Self) -> bool {
        self.columns() == other.columns() && self.frame.equals_missing(&other.frame)
    }
}

impl UniverseTable {
    /// Wraps a frame, casting every column to text and normalizing names and
    /// cells the same way as [`parse_cell`].
    pub fn from_frame(frame: DataFrame) -> Result<Self, FractileError> {
        let columns = frame
            .get_columns()
            .iter()
            .map(|c| {
                let text = c.cast(&DataType::String)?;
                let values: Vec<Option<&str>> =
                    text.str()?.iter().map(|v| v.and_then(parse_cell)).collect();
                Ok(Column::new(c.name().trim().into(), values))
            })
            .collect::<PolarsResult<Vec<_>>>()?;
        Ok(Self {
            frame: DataFrame::new(columns)?,
        })
    }

    /// Builds a table from raw cells, normalizing missing markers.
    pub fn from_cells<S: AsRef<str>>(
        columns: &[&str],
        cells: &[Vec<S>],
    ) -> Result<Self, FractileError> {
        if let Some((row, record)) = cells
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(FractileError::Schema {
                reason: format!(
                    "row {row} has {} fields, expected {}",
                    record.len(),
                    columns.len()
                ),
            });
        }

        let frame_columns = columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let values: Vec<Option<&str>> =
                    cells.iter().map(|r| parse_cell(r[i].as_ref())).collect();
                Column::new((*name).into(), values)
            })
            .collect();
        Ok(Self {
            frame: DataFrame::new(frame_columns)?,
        })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn columns(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|c| c.to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.frame.get_column_index(name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn require_column(&self, name: &str) -> Result<usize, FractileError> {
        self.column_index(name)
            .ok_or_else(|| FractileError::missing_column(name))
    }

    pub fn require_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>, FractileError> {
        names
            .iter()
            .map(|n| self.require_column(n.as_ref()))
            .collect()
    }

    pub fn value(&self, row: usize, column: usize) -> Option<&str> {
        if row >= self.len() {
            return None;
        }
        self.frame.get_columns().get(column)?.str().ok()?.get(row)
    }

    /// Cells of one column in row order.
    pub fn text_column(&self, name: &str) -> Result<Vec<Option<&str>>, FractileError> {
        let idx = self.require_column(name)?;
        Ok(self.frame.get_columns()[idx].str()?.iter().collect())
    }

    /// Restricts the table to `names`, in that order.
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, FractileError> {
        self.require_columns(names)?;
        Ok(Self {
            frame: self.frame.select(names.iter().map(|n| n.as_ref()))?,
        })
    }

    /// Keeps the rows where `predicate` holds; a null predicate drops the row.
    pub fn filter(&self, predicate: Expr) -> Result<Self, FractileError> {
        Ok(Self {
            frame: self.frame.clone().lazy().filter(predicate).collect()?,
        })
    }

    /// Drops rows with a missing value in any column.
    pub fn drop_missing(&self) -> Result<Self, FractileError> {
        Ok(Self {
            frame: self.frame.clone().lazy().drop_nulls(None).collect()?,
        })
    }

    /// Drops rows with a missing value in any of `names`.
    pub fn drop_missing_in<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, FractileError> {
        self.require_columns(names)?;
        let complete = names
            .iter()
            .map(|n| col(n.as_ref()).is_not_null())
            .reduce(|a, b| a.and(b));
        match complete {
            Some(predicate) => self.filter(predicate),
            None => Ok(self.clone()),
        }
    }

    /// Casts a column to `f64`. Missing cells stay null; a present cell that
    /// is not a finite number is a parse error.
    pub fn numeric_column(&self, name: &str) -> Result<Float64Chunked, FractileError> {
        let idx = self.require_column(name)?;
        let text = self.frame.get_columns()[idx].str()?;
        let parsed = text.cast(&DataType::Float64)?;
        let parsed = parsed.f64()?;

        let bad = text
            .iter()
            .zip(parsed.iter())
            .enumerate()
            .find_map(|(row, (raw, value))| match (raw, value) {
                (Some(raw), value) if !value.is_some_and(f64::is_finite) => Some((row, raw)),
                _ => None,
            });
        if let Some((row, raw)) = bad {
            return Err(FractileError::Parse {
                column: name.to_string(),
                row,
                value: raw.to_string(),
            });
        }
        Ok(parsed.clone())
    }
}
