//! STS dataset schema: column normalization and typed sentence pairs
//!
//! Raw files name the text columns `anchor` / `target` and carry an unused
//! `context` column. Normalization maps them onto the canonical
//! `sentence1` / `sentence2` names the predictor expects.

use std::path::Path;

use crate::errors::TrainerError;
use crate::table::Table;

/// Canonical name of the first text column
pub const SENTENCE1: &str = "sentence1";
/// Canonical name of the second text column
pub const SENTENCE2: &str = "sentence2";
/// Default regression label column
pub const DEFAULT_LABEL: &str = "score";
/// Default row identifier column
pub const DEFAULT_ID_COLUMN: &str = "id";

/// Drops unused columns and renames source columns to canonical names
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnNormalizer {
    drop: Vec<String>,
    renames: Vec<(String, String)>,
}

impl Default for ColumnNormalizer {
    fn default() -> Self {
        Self {
            drop: vec!["context".to_string()],
            renames: vec![
                ("anchor".to_string(), SENTENCE1.to_string()),
                ("target".to_string(), SENTENCE2.to_string()),
            ],
        }
    }
}

impl ColumnNormalizer {
    pub fn new(drop: Vec<String>, renames: Vec<(String, String)>) -> Self {
        Self { drop, renames }
    }

    /// Drop the configured columns (when present), then apply the renames.
    ///
    /// Fails with `MissingColumn` when a rename source is absent, so running
    /// it twice on the same table is an error.
    pub fn normalize(&self, mut table: Table) -> Result<Table, TrainerError> {
        let drop: Vec<&str> = self.drop.iter().map(String::as_str).collect();
        let dropped = table.drop_columns(&drop);

        let renames: Vec<(&str, &str)> = self
            .renames
            .iter()
            .map(|(from, to)| (from.as_str(), to.as_str()))
            .collect();
        table.rename_columns(&renames)?;

        tracing::debug!(
            dropped,
            columns = ?table.columns(),
            "Normalized table columns"
        );
        Ok(table)
    }
}

/// Load a CSV file and normalize its columns in one step
pub fn load_normalized<P: AsRef<Path>>(
    path: P,
    id_column: &str,
    normalizer: &ColumnNormalizer,
) -> Result<Table, TrainerError> {
    let path = path.as_ref();
    tracing::info!("Loading dataset from: {}", path.display());
    let table = Table::from_csv(path, id_column)?;
    normalizer.normalize(table)
}

/// Check that a table carries the canonical text columns (and the label, if given)
pub fn validate_schema(table: &Table, label: Option<&str>) -> Result<(), TrainerError> {
    let mut missing: Vec<&str> = [SENTENCE1, SENTENCE2]
        .into_iter()
        .filter(|c| !table.has_column(c))
        .collect();
    if let Some(label) = label {
        if !table.has_column(label) {
            missing.push(label);
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(TrainerError::Schema(format!(
            "missing column(s) {:?}; table has {:?}",
            missing,
            table.columns()
        )))
    }
}

/// Typed view of a normalized table
#[derive(Clone, Debug, PartialEq)]
pub struct SentencePairs {
    pub ids: Vec<String>,
    pub first: Vec<String>,
    pub second: Vec<String>,
    /// Present when the table was read with a label column
    pub scores: Option<Vec<f64>>,
}

impl SentencePairs {
    /// Extract sentence pairs; with `label = Some(..)` the label must parse as finite floats
    pub fn from_table(table: &Table, label: Option<&str>) -> Result<Self, TrainerError> {
        validate_schema(table, label)?;

        let first = table.column(SENTENCE1)?.into_iter().map(str::to_string).collect();
        let second = table.column(SENTENCE2)?.into_iter().map(str::to_string).collect();
        let scores = label.map(|l| table.numeric_column(l)).transpose()?;

        Ok(Self {
            ids: table.ids().to_vec(),
            first,
            second,
            scores,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate (sentence1, sentence2) pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.first
            .iter()
            .zip(&self.second)
            .map(|(a, b)| (a.as_str(), b.as_str()))
    }
}

/// (min, max) of a slice of floats, `None` when empty
pub fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_table() -> Table {
        let csv = "id,anchor,target,context,score\n1,a,b,c,3.5\n2,x,y,z,1.0\n";
        Table::from_reader(csv.as_bytes(), DEFAULT_ID_COLUMN).unwrap()
    }

    #[test]
    fn test_normalize_canonical_columns() {
        let table = ColumnNormalizer::default().normalize(raw_table()).unwrap();
        assert_eq!(table.index_name(), "id");
        assert_eq!(table.columns(), [SENTENCE1, SENTENCE2, DEFAULT_LABEL]);
        assert!(!table.has_column("context"));

        assert_eq!(table.ids()[0], "1");
        assert_eq!(table.cell(0, SENTENCE1), Some("a"));
        assert_eq!(table.cell(0, SENTENCE2), Some("b"));
        assert_eq!(table.cell(0, DEFAULT_LABEL), Some("3.5"));
    }

    #[test]
    fn test_normalize_twice_fails() {
        let normalizer = ColumnNormalizer::default();
        let once = normalizer.normalize(raw_table()).unwrap();
        let err = normalizer.normalize(once).unwrap_err();
        assert!(matches!(err, TrainerError::MissingColumn(c) if c == "anchor"));
    }

    #[test]
    fn test_normalize_without_context_column() {
        let csv = "id,anchor,target,score\n1,a,b,0.25\n";
        let table = Table::from_reader(csv.as_bytes(), "id").unwrap();
        let table = ColumnNormalizer::default().normalize(table).unwrap();
        assert_eq!(table.columns(), [SENTENCE1, SENTENCE2, DEFAULT_LABEL]);
    }

    #[test]
    fn test_sentence_pairs() {
        let table = ColumnNormalizer::default().normalize(raw_table()).unwrap();
        let pairs = SentencePairs::from_table(&table, Some(DEFAULT_LABEL)).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs.pairs().next(), Some(("a", "b")));
        assert_eq!(pairs.scores, Some(vec![3.5, 1.0]));

        let unlabeled = SentencePairs::from_table(&table, None).unwrap();
        assert!(unlabeled.scores.is_none());
    }

    #[test]
    fn test_schema_error_on_raw_table() {
        let err = SentencePairs::from_table(&raw_table(), Some(DEFAULT_LABEL)).unwrap_err();
        assert!(matches!(err, TrainerError::Schema(_)));
    }

    #[test]
    fn test_value_range() {
        assert_eq!(value_range(&[1.0, 3.5, 5.0]), Some((1.0, 5.0)));
        assert_eq!(value_range(&[]), None);
    }
}
