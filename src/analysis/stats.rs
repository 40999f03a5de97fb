use std::collections::HashMap;

use serde::Serialize;

use crate::data::model::Dataset;
use crate::error::{Error, Result};

/// z-value of the two-sided 95% normal interval.
pub const Z_95: f64 = 1.96;

/// Descriptive statistics for one variable over one record window.
///
/// Every field is computed from the same list of non-null values. Nothing is
/// rounded here; see [`crate::analysis::report`] for display formatting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSummary {
    pub variable: String,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation (divisor N).
    pub stddev: f64,
    /// Population variance (divisor N).
    pub variance: f64,
    pub iqr: f64,
    /// Every value tied at the highest frequency, ascending.
    pub mode: Vec<f64>,
    pub confidence_interval: (f64, f64),
}

impl StatisticsSummary {
    /// Summarize a column, ignoring nulls and non-finite values.
    ///
    /// # Errors
    /// [`Error::InsufficientData`] when fewer than two values remain, since
    /// the confidence interval needs at least two.
    pub fn compute(variable: &str, column: &[Option<f64>]) -> Result<Self> {
        let values: Vec<f64> = column.iter().flatten().copied().filter(|v| v.is_finite()).collect();
        let insufficient = || Error::InsufficientData {
            variable: variable.to_string(),
            available: values.len(),
            required: 2,
        };
        // Two or more values from here on.
        let confidence_interval = confidence_interval(&values).ok_or_else(insufficient)?;
        let variance = population_variance(&values).ok_or_else(insufficient)?;

        Ok(Self {
            variable: variable.to_string(),
            count: values.len(),
            min: min(&values).ok_or_else(insufficient)?,
            max: max(&values).ok_or_else(insufficient)?,
            mean: mean(&values).ok_or_else(insufficient)?,
            median: median(&values).ok_or_else(insufficient)?,
            stddev: variance.sqrt(),
            variance,
            iqr: iqr(&values).ok_or_else(insufficient)?,
            mode: mode(&values),
            confidence_interval,
        })
    }
}

/// Summaries for several variables of one window.
///
/// Each variable succeeds or fails on its own, so one empty column does not
/// hide the others.
pub fn summarize<S: AsRef<str>>(dataset: &Dataset, variables: &[S]) -> Vec<(String, Result<StatisticsSummary>)> {
    variables
        .iter()
        .map(|v| {
            let name = v.as_ref();
            let column = dataset.column(name).unwrap_or_default();
            let summary = StatisticsSummary::compute(name, &column);
            if let Err(e) = &summary {
                log::debug!("no statistics for '{name}': {e}");
            }
            (name.to_string(), summary)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Primitives (`None` on empty input)
// ---------------------------------------------------------------------------

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().min_by(f64::total_cmp)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().max_by(f64::total_cmp)
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Middle value, or the average of the two middle values for even N.
pub fn median(values: &[f64]) -> Option<f64> {
    let sorted = sorted(values)?;
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sum of squared deviations divided by N.
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64)
}

pub fn population_stddev(values: &[f64]) -> Option<f64> {
    population_variance(values).map(f64::sqrt)
}

/// Nearest-rank percentile: `sorted[floor(p * N)]`, no interpolation.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    let sorted = sorted(values)?;
    let idx = ((p * sorted.len() as f64).floor() as usize).min(sorted.len() - 1);
    Some(sorted[idx])
}

/// `q3 - q1` with nearest-rank quartiles.
pub fn iqr(values: &[f64]) -> Option<f64> {
    Some(percentile(values, 0.75)? - percentile(values, 0.25)?)
}

/// All values sharing the highest frequency, ascending.
pub fn mode(values: &[f64]) -> Vec<f64> {
    let mut counts: HashMap<u64, (f64, usize)> = HashMap::new();
    for &v in values {
        // -0.0 and 0.0 are the same value.
        let v = if v == 0.0 { 0.0 } else { v };
        counts.entry(v.to_bits()).or_insert((v, 0)).1 += 1;
    }
    let Some(top) = counts.values().map(|(_, n)| *n).max() else {
        return Vec::new();
    };
    let mut winners: Vec<f64> = counts
        .into_values()
        .filter(|(_, n)| *n == top)
        .map(|(v, _)| v)
        .collect();
    winners.sort_by(f64::total_cmp);
    winners
}

/// 95% interval for the mean: `mean ± 1.96 · σ / √N` with population σ.
/// `None` for fewer than two values.
pub fn confidence_interval(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let margin = Z_95 * population_stddev(values)? / (values.len() as f64).sqrt();
    Some((m - margin, m + margin))
}

/// Ascending copy; `None` when empty.
fn sorted(values: &[f64]) -> Option<Vec<f64>> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(sorted)
}
