use super::model::{Dataset, Diagnostic, Normalized, TimeSeriesRecord, VariableCatalog};
use super::time::{Timestamp, parse_timestamp};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Filter predicate: inclusive time window plus a variable projection
// ---------------------------------------------------------------------------

/// Inclusive `[start, end]` window. `start > end` is allowed and selects
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Parse both bounds with the same rules as record timestamps.
    ///
    /// # Errors
    /// [`Error::SourceFormat`] naming the bound that did not parse.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |label: &str, text: &str| {
            parse_timestamp(text)
                .ok_or_else(|| Error::SourceFormat(format!("invalid {label} bound '{text}'")))
        };
        Ok(Self::new(parse("start", start)?, parse("end", end)?))
    }

    /// The full span of a dataset; `None` when it has no records.
    pub fn covering(dataset: &Dataset) -> Option<Self> {
        dataset.time_span().map(|(start, end)| Self::new(start, end))
    }

    /// Both bounds inclusive.
    pub fn contains(&self, ts: &Timestamp) -> bool {
        self.start <= *ts && *ts <= self.end
    }
}

/// Project `dataset` onto `range` and the requested variables, in the order
/// requested.
///
/// The output keeps the ascending timestamp order. A requested variable the
/// dataset does not declare becomes an all-null column and is reported as a
/// diagnostic. Repeated keys keep their first position; blank keys are
/// ignored.
pub fn filter_range<S: AsRef<str>>(
    dataset: &Dataset,
    range: &TimeRange,
    variables: &[S],
) -> Result<Normalized<Dataset>> {
    let mut requested: Vec<&str> = Vec::with_capacity(variables.len());
    for key in variables.iter().map(AsRef::as_ref) {
        if key.trim().is_empty() || requested.contains(&key) {
            log::debug!("ignoring repeated or blank variable '{key}'");
            continue;
        }
        requested.push(key);
    }
    let catalog = VariableCatalog::new(requested)?;

    let mut diagnostics = Vec::new();
    let sources: Vec<Option<usize>> = catalog
        .keys()
        .iter()
        .map(|key| {
            let idx = dataset.catalog().index_of(key);
            if idx.is_none() {
                log::warn!("variable '{key}' not found in dataset");
                diagnostics.push(Diagnostic::MissingVariable {
                    variable: key.clone(),
                });
            }
            idx
        })
        .collect();

    let records: Vec<TimeSeriesRecord> = dataset
        .records()
        .iter()
        .filter(|r| range.contains(&r.timestamp))
        .map(|r| {
            let values = sources.iter().map(|src| src.and_then(|i| r.get(i))).collect();
            TimeSeriesRecord::new(r.timestamp, values)
        })
        .collect();

    log::debug!(
        "filtered {} of {} records onto {} variable(s)",
        records.len(),
        dataset.len(),
        catalog.len()
    );

    Ok(Normalized {
        value: Dataset::from_ordered(dataset.time_label().to_string(), catalog, records),
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{NormalizeOptions, normalize_csv};

    fn sample() -> Dataset {
        let text = "time,a,b\n\
                    2024-01-01T00:00,1,10\n\
                    2024-01-01T01:00,2,20\n\
                    2024-01-01T02:00,3,30\n\
                    2024-01-01T03:00,4,40\n";
        normalize_csv(text, &NormalizeOptions::full()).unwrap().value
    }

    #[test]
    fn single_instant_window_is_inclusive() {
        let ds = sample();
        let t = parse_timestamp("2024-01-01T01:00").unwrap();
        let out = filter_range(&ds, &TimeRange::new(t, t), &["a"]).unwrap();
        assert_eq!(out.value.len(), 1);
        assert_eq!(out.value.records()[0].timestamp, t);
        assert_eq!(out.value.values("a"), vec![2.0]);
    }

    #[test]
    fn both_bounds_included_and_order_kept() {
        let ds = sample();
        let range = TimeRange::parse("2024-01-01T01:00", "2024-01-01T03:00").unwrap();
        let out = filter_range(&ds, &range, &["b", "a"]).unwrap().value;
        assert_eq!(out.catalog().keys(), ["b", "a"]);
        assert_eq!(out.values("b"), vec![20.0, 30.0, 40.0]);
        assert_eq!(out.time_label(), "time");
    }

    #[test]
    fn missing_variable_is_null_with_diagnostic() {
        let ds = sample();
        let range = TimeRange::covering(&ds).unwrap();
        let out = filter_range(&ds, &range, &["a", "zzz"]).unwrap();
        assert_eq!(out.value.column("zzz"), Some(vec![None; 4]));
        assert_eq!(
            out.diagnostics,
            vec![Diagnostic::MissingVariable {
                variable: "zzz".into()
            }]
        );
    }

    #[test]
    fn repeated_and_blank_keys_collapse() {
        let ds = sample();
        let range = TimeRange::covering(&ds).unwrap();
        let out = filter_range(&ds, &range, &["b", "a", "b", " ", "a"]).unwrap();
        assert_eq!(out.value.catalog().keys(), ["b", "a"]);
        assert_eq!(out.value.values("b"), vec![10.0, 20.0, 30.0, 40.0]);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn inverted_range_selects_nothing() {
        let ds = sample();
        let range = TimeRange::parse("2024-01-02", "2024-01-01").unwrap();
        let out = filter_range(&ds, &range, &["a"]).unwrap().value;
        assert!(out.is_empty());
    }

    #[test]
    fn bad_bounds_rejected() {
        assert!(matches!(
            TimeRange::parse("soon", "2024-01-01"),
            Err(Error::SourceFormat(_))
        ));
    }

    #[test]
    fn source_is_untouched() {
        let ds = sample();
        let before = ds.clone();
        let t = parse_timestamp("2024-01-01T02:00").unwrap();
        let _ = filter_range(&ds, &TimeRange::new(t, t), &["a"]).unwrap();
        assert_eq!(ds, before);
    }
}
