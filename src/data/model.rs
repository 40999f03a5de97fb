use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::time::{Timestamp, format_timestamp};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// VariableCatalog – the declared columns of a dataset
// ---------------------------------------------------------------------------

/// Ordered list of canonical variable keys discovered at normalization time.
///
/// Keys are unique and non-empty. Record values are stored positionally, so
/// the catalog is the only way to address a value by name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct VariableCatalog {
    keys: Vec<String>,
}

impl VariableCatalog {
    /// Build a catalog, rejecting blank or repeated keys.
    pub fn new<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for key in keys {
            let key: String = key.into();
            if key.trim().is_empty() {
                return Err(Error::SourceFormat("blank column name".into()));
            }
            if !seen.insert(key.clone()) {
                return Err(Error::SourceFormat(format!("duplicate column '{key}'")));
            }
            out.push(key);
        }
        Ok(Self { keys: out })
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index_of(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TimeSeriesRecord – one observed timestamp
// ---------------------------------------------------------------------------

/// A single observation. `values[i]` belongs to `catalog.keys()[i]`;
/// `None` marks a missing or non-numeric cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRecord {
    pub timestamp: Timestamp,
    pub values: Vec<Option<f64>>,
}

impl TimeSeriesRecord {
    pub fn new(timestamp: Timestamp, values: Vec<Option<f64>>) -> Self {
        Self { timestamp, values }
    }

    /// Value at a catalog position; out-of-range reads as missing.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }
}

// ---------------------------------------------------------------------------
// Diagnostics – non-fatal problems found while parsing or filtering
// ---------------------------------------------------------------------------

/// A non-fatal problem reported alongside a result instead of being logged.
///
/// `row` is the 1-based position of the row in its source (header excluded).
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    SkippedRow { row: usize, reason: String },
    NonNumericValue { row: usize, variable: String, raw: String },
    DuplicateTimestamp { row: usize, timestamp: Timestamp },
    UnknownKey { row: usize, key: String },
    MissingVariable { variable: String },
    EmptySheet { sheet: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::SkippedRow { row, reason } => write!(f, "row {row} skipped: {reason}"),
            Diagnostic::NonNumericValue { row, variable, raw } => {
                write!(f, "row {row}: '{raw}' in '{variable}' is not a number, stored as null")
            }
            Diagnostic::DuplicateTimestamp { row, timestamp } => write!(
                f,
                "row {row}: duplicate timestamp {}, keeping the earlier row",
                format_timestamp(timestamp)
            ),
            Diagnostic::UnknownKey { row, key } => write!(f, "row {row}: undeclared key '{key}' dropped"),
            Diagnostic::MissingVariable { variable } => {
                write!(f, "variable '{variable}' not found in dataset, filled with null")
            }
            Diagnostic::EmptySheet { sheet } => write!(f, "sheet '{sheet}' has no usable records"),
        }
    }
}

/// A result paired with the diagnostics produced while computing it.
#[derive(Debug, Clone)]
pub struct Normalized<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Normalized<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Normalized<U> {
        Normalized {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete normalized time series
// ---------------------------------------------------------------------------

/// Timestamp-indexed records, strictly ascending with unique timestamps.
///
/// Immutable once built: filtering produces a new `Dataset`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    time_label: String,
    catalog: VariableCatalog,
    records: Vec<TimeSeriesRecord>,
}

impl Dataset {
    /// Build from records that already satisfy the ordering invariant.
    pub(crate) fn from_ordered(
        time_label: String,
        catalog: VariableCatalog,
        records: Vec<TimeSeriesRecord>,
    ) -> Self {
        debug_assert!(records.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        Self {
            time_label,
            catalog,
            records,
        }
    }

    /// Header of the timestamp column in the source (e.g. `time`, `Date`).
    pub fn time_label(&self) -> &str {
        &self.time_label
    }

    pub fn catalog(&self) -> &VariableCatalog {
        &self.catalog
    }

    pub fn records(&self) -> &[TimeSeriesRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty. Only filtered views can be.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First and last timestamps, if any record exists.
    pub fn time_span(&self) -> Option<(Timestamp, Timestamp)> {
        Some((self.records.first()?.timestamp, self.records.last()?.timestamp))
    }

    /// Full column including nulls, aligned with `records()`.
    pub fn column(&self, key: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.catalog.index_of(key)?;
        Some(self.records.iter().map(|r| r.get(idx)).collect())
    }

    /// Non-null values of one column in record order.
    pub fn values(&self, key: &str) -> Vec<f64> {
        match self.catalog.index_of(key) {
            Some(idx) => self.records.iter().filter_map(|r| r.get(idx)).collect(),
            None => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// DatasetBuilder – collects parsed rows, then enforces the invariants
// ---------------------------------------------------------------------------

/// Accumulates rows during parsing and turns them into a [`Dataset`].
///
/// Handles the row cap, sorting and duplicate-timestamp rejection in one
/// place so every source kind gets the same treatment.
#[derive(Debug)]
pub(crate) struct DatasetBuilder {
    time_label: String,
    catalog: VariableCatalog,
    limit: Option<usize>,
    rows: Vec<(usize, TimeSeriesRecord)>,
    diagnostics: Vec<Diagnostic>,
}

impl DatasetBuilder {
    pub fn new(time_label: String, catalog: VariableCatalog, limit: Option<usize>) -> Self {
        Self {
            time_label,
            catalog,
            limit,
            rows: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// True once the row cap has been reached.
    pub fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.rows.len() >= limit)
    }

    pub fn push(&mut self, row: usize, record: TimeSeriesRecord) {
        debug_assert_eq!(record.values.len(), self.catalog.len());
        if !self.is_full() {
            self.rows.push((row, record));
        }
    }

    pub fn skip(&mut self, row: usize, reason: impl Into<String>) {
        self.diagnostics.push(Diagnostic::SkippedRow {
            row,
            reason: reason.into(),
        });
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Sort, drop duplicate timestamps (first row wins) and build.
    ///
    /// # Errors
    /// [`Error::EmptyDataset`] when no record survived.
    pub fn finish(mut self) -> Result<Normalized<Dataset>> {
        // Stable sort keeps source order among equal timestamps.
        self.rows.sort_by_key(|(_, r)| r.timestamp);

        let mut records: Vec<TimeSeriesRecord> = Vec::with_capacity(self.rows.len());
        for (row, record) in self.rows {
            if records.last().is_some_and(|prev| prev.timestamp == record.timestamp) {
                self.diagnostics.push(Diagnostic::DuplicateTimestamp {
                    row,
                    timestamp: record.timestamp,
                });
                continue;
            }
            records.push(record);
        }

        if records.is_empty() {
            return Err(Error::EmptyDataset);
        }

        Ok(Normalized {
            value: Dataset::from_ordered(self.time_label, self.catalog, records),
            diagnostics: self.diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::time::parse_timestamp;

    fn ts(s: &str) -> Timestamp {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn catalog_rejects_duplicates_and_blanks() {
        assert!(VariableCatalog::new(["a", "b"]).is_ok());
        assert!(matches!(
            VariableCatalog::new(["a", "a"]),
            Err(Error::SourceFormat(_))
        ));
        assert!(matches!(
            VariableCatalog::new(["a", " "]),
            Err(Error::SourceFormat(_))
        ));
    }

    #[test]
    fn builder_sorts_and_drops_duplicates() {
        let catalog = VariableCatalog::new(["v"]).unwrap();
        let mut b = DatasetBuilder::new("time".into(), catalog, None);
        b.push(1, TimeSeriesRecord::new(ts("2024-01-03"), vec![Some(3.0)]));
        b.push(2, TimeSeriesRecord::new(ts("2024-01-01"), vec![Some(1.0)]));
        b.push(3, TimeSeriesRecord::new(ts("2024-01-03"), vec![Some(99.0)]));

        let out = b.finish().unwrap();
        let ds = out.value;
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.values("v"), vec![1.0, 3.0]);
        assert_eq!(
            out.diagnostics,
            vec![Diagnostic::DuplicateTimestamp {
                row: 3,
                timestamp: ts("2024-01-03")
            }]
        );
    }

    #[test]
    fn builder_honours_row_cap() {
        let catalog = VariableCatalog::new(["v"]).unwrap();
        let mut b = DatasetBuilder::new("time".into(), catalog, Some(1));
        b.push(1, TimeSeriesRecord::new(ts("2024-01-01"), vec![None]));
        assert!(b.is_full());
        b.push(2, TimeSeriesRecord::new(ts("2024-01-02"), vec![None]));
        assert_eq!(b.finish().unwrap().value.len(), 1);
    }

    #[test]
    fn empty_builder_fails() {
        let b = DatasetBuilder::new("time".into(), VariableCatalog::default(), None);
        assert!(matches!(b.finish(), Err(Error::EmptyDataset)));
    }

    #[test]
    fn column_access() {
        let catalog = VariableCatalog::new(["a", "b"]).unwrap();
        let ds = Dataset::from_ordered(
            "time".into(),
            catalog,
            vec![
                TimeSeriesRecord::new(ts("2024-01-01"), vec![Some(1.0), None]),
                TimeSeriesRecord::new(ts("2024-01-02"), vec![Some(2.0), Some(5.0)]),
            ],
        );
        assert_eq!(ds.column("b"), Some(vec![None, Some(5.0)]));
        assert_eq!(ds.values("b"), vec![5.0]);
        assert!(ds.column("c").is_none());
        assert_eq!(ds.time_span(), Some((ts("2024-01-01"), ts("2024-01-02"))));
    }
}
