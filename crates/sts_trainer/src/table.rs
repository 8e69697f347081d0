//! In-memory tabular data indexed by a row identifier
//!
//! A `Table` keeps every cell as text, the way it came out of the CSV file.
//! Typed access (`numeric_column`) parses on demand and reports the offending
//! row id on failure.

use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::Path;

use crate::deterministic::LcgRng;
use crate::errors::TrainerError;

/// Cells longer than this are shortened in previews
const PREVIEW_CELL_CHARS: usize = 40;

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    index_name: String,
    columns: Vec<String>,
    ids: Vec<String>,
    rows: Vec<Vec<String>>,
    id_set: HashSet<String>,
}

impl Table {
    /// Create an empty table with the given index and data columns
    pub fn new<S: Into<String>>(index_name: S, columns: Vec<String>) -> Result<Self, TrainerError> {
        let index_name = index_name.into();
        let mut seen = HashSet::new();
        for name in std::iter::once(&index_name).chain(columns.iter()) {
            if !seen.insert(name.as_str()) {
                return Err(TrainerError::DuplicateColumn(name.clone()));
            }
        }

        Ok(Self {
            index_name,
            columns,
            ids: Vec::new(),
            rows: Vec::new(),
            id_set: HashSet::new(),
        })
    }

    /// Load a CSV file with a header row, using `index_column` as the row id
    pub fn from_csv<P: AsRef<Path>>(path: P, index_column: &str) -> Result<Self, TrainerError> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(file, index_column)
    }

    /// Parse CSV from any reader (header row required, RFC 4180 quoting)
    pub fn from_reader<R: Read>(reader: R, index_column: &str) -> Result<Self, TrainerError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(TrainerError::Dataset("CSV header row is empty".to_string()));
        }

        let index_pos = headers
            .iter()
            .position(|h| h == index_column)
            .ok_or_else(|| TrainerError::MissingColumn(index_column.to_string()))?;

        let columns: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index_pos)
            .map(|(_, h)| h.clone())
            .collect();

        let mut table = Self::new(index_column, columns)?;

        for record in reader.records() {
            let record = record?;
            let id = record.get(index_pos).unwrap_or_default().to_string();
            let cells = record
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index_pos)
                .map(|(_, cell)| cell.to_string())
                .collect();
            table.push_row(id, cells)?;
        }

        Ok(table)
    }

    /// Append a row; the id must be new and the cell count must match
    pub fn push_row<S: Into<String>>(&mut self, id: S, cells: Vec<String>) -> Result<(), TrainerError> {
        let id = id.into();
        if cells.len() != self.columns.len() {
            return Err(TrainerError::Dataset(format!(
                "row {id}: expected {} cells, got {}",
                self.columns.len(),
                cells.len()
            )));
        }
        if !self.id_set.insert(id.clone()) {
            return Err(TrainerError::DuplicateId(id));
        }

        self.ids.push(id);
        self.rows.push(cells);
        Ok(())
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn require_column(&self, name: &str) -> Result<usize, TrainerError> {
        self.column_index(name)
            .ok_or_else(|| TrainerError::MissingColumn(name.to_string()))
    }

    /// Cell at (row position, column name)
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|cells| cells[col].as_str())
    }

    /// All cells of one column, in row order
    pub fn column(&self, name: &str) -> Result<Vec<&str>, TrainerError> {
        let col = self.require_column(name)?;
        Ok(self.rows.iter().map(|cells| cells[col].as_str()).collect())
    }

    /// Parse one column as finite floats
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, TrainerError> {
        let col = self.require_column(name)?;
        self.ids
            .iter()
            .zip(&self.rows)
            .map(|(id, cells)| {
                let raw = cells[col].trim();
                match raw.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(v),
                    _ => Err(TrainerError::InvalidValue {
                        row_id: id.clone(),
                        column: name.to_string(),
                        value: cells[col].clone(),
                    }),
                }
            })
            .collect()
    }

    /// Remove the named columns that exist; returns how many were removed
    pub fn drop_columns(&mut self, names: &[&str]) -> usize {
        let keep: Vec<bool> = self
            .columns
            .iter()
            .map(|c| !names.contains(&c.as_str()))
            .collect();
        let dropped = keep.iter().filter(|k| !**k).count();
        if dropped == 0 {
            return 0;
        }

        let retain = |cells: &mut Vec<String>| {
            let mut flags = keep.iter();
            cells.retain(|_| *flags.next().unwrap_or(&true));
        };
        retain(&mut self.columns);
        for row in &mut self.rows {
            retain(row);
        }
        dropped
    }

    /// Rename columns `(from, to)`.
    ///
    /// All renames are checked before any is applied: a missing source or a
    /// target that collides with another column leaves the table unchanged.
    pub fn rename_columns(&mut self, renames: &[(&str, &str)]) -> Result<(), TrainerError> {
        let mut renamed = self.columns.clone();
        for (from, to) in renames {
            let pos = renamed
                .iter()
                .position(|c| c == from)
                .ok_or_else(|| TrainerError::MissingColumn((*from).to_string()))?;
            renamed[pos] = (*to).to_string();
        }

        let mut seen = HashSet::new();
        for name in std::iter::once(&self.index_name).chain(renamed.iter()) {
            if !seen.insert(name.as_str()) {
                return Err(TrainerError::DuplicateColumn(name.clone()));
            }
        }

        self.columns = renamed;
        Ok(())
    }

    /// Rows at the given positions, in that order
    pub fn select_rows(&self, positions: &[usize]) -> Result<Self, TrainerError> {
        let mut out = Self::new(self.index_name.clone(), self.columns.clone())?;
        for &pos in positions {
            let cells = self.rows.get(pos).ok_or_else(|| {
                TrainerError::Dataset(format!("row position {pos} out of range ({} rows)", self.len()))
            })?;
            out.push_row(self.ids[pos].clone(), cells.clone())?;
        }
        Ok(out)
    }

    /// Random sample of `amount` distinct rows (without replacement)
    pub fn sample(&self, amount: usize, rng: &mut LcgRng) -> Result<Self, TrainerError> {
        if amount > self.len() {
            return Err(TrainerError::SampleTooLarge {
                requested: amount,
                available: self.len(),
            });
        }
        self.select_rows(&rng.sample_indices(self.len(), amount))
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Self {
        let mut out = self.clone();
        out.ids.truncate(n);
        out.rows.truncate(n);
        out.id_set = out.ids.iter().cloned().collect();
        out
    }
}

fn preview_cell(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CELL_CHARS {
        return text.to_string();
    }
    let mut short: String = text.chars().take(PREVIEW_CELL_CHARS - 3).collect();
    short.push_str("...");
    short
}

impl fmt::Display for Table {
    /// Aligned text rendering: index column left-aligned, data right-aligned
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.ids.iter().map(|s| preview_cell(s)).collect();
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|cells| cells.iter().map(|c| preview_cell(c)).collect())
            .collect();

        let index_width = ids
            .iter()
            .map(|s| s.chars().count())
            .chain(std::iter::once(self.index_name.chars().count()))
            .max()
            .unwrap_or(0);

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(c, name)| {
                rows.iter()
                    .map(|r| r[c].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:<index_width$}", self.index_name)?;
        for (name, width) in self.columns.iter().zip(&widths) {
            write!(f, "  {name:>width$}")?;
        }
        writeln!(f)?;

        for (id, row) in ids.iter().zip(&rows) {
            write!(f, "{id:<index_width$}")?;
            for (cell, width) in row.iter().zip(&widths) {
                write!(f, "  {cell:>width$}")?;
            }
            writeln!(f)?;
        }

        write!(f, "[{} rows x {} columns]", self.len(), self.columns.len())
    }
}
