use serde::Serialize;

use super::stats::mean;
use crate::data::model::Dataset;
use crate::data::time::Timestamp;
use crate::error::{Error, Result};

/// Pearson correlation and OLS line for one variable pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub variable_x: String,
    pub variable_y: String,
    /// `None` when `y` is constant, which leaves Pearson's r undefined.
    pub coefficient: Option<f64>,
    pub slope: f64,
    pub intercept: f64,
    /// Number of (x, y) pairs with both values present.
    pub sample_size: usize,
    /// Line endpoints at the smallest and largest x.
    pub regression_endpoints: [(f64, f64); 2],
    /// First and last timestamp of the window, for display.
    pub date_range: Option<(Timestamp, Timestamp)>,
}

/// Correlate two columns of one filtered window.
///
/// Records where either value is null are left out of the pairing.
///
/// # Errors
/// * [`Error::IncompatibleVariables`] if a selection is unset, repeated, or
///   not in the dataset.
/// * [`Error::InsufficientData`] with fewer than two complete pairs.
/// * [`Error::DegenerateRegression`] when every x is equal.
pub fn correlate(dataset: &Dataset, x: Option<&str>, y: Option<&str>) -> Result<CorrelationResult> {
    let (x, y) = check_pair(x, y)?;

    let column = |key: &str| {
        dataset
            .column(key)
            .ok_or_else(|| Error::IncompatibleVariables(format!("'{key}' is not in the dataset")))
    };
    let (xs, ys): (Vec<f64>, Vec<f64>) = column(x)?
        .into_iter()
        .zip(column(y)?)
        .filter_map(|pair| match pair {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        })
        .unzip();

    let mut out = regress(&xs, &ys, x, y)?;
    out.date_range = dataset.time_span();
    Ok(out)
}

/// Both selections must be set, non-blank and different.
pub fn check_pair<'a>(x: Option<&'a str>, y: Option<&'a str>) -> Result<(&'a str, &'a str)> {
    let (x, y) = match (x, y) {
        (Some(x), Some(y)) if !x.trim().is_empty() && !y.trim().is_empty() => (x, y),
        _ => {
            return Err(Error::IncompatibleVariables(
                "select two different variables".into(),
            ));
        }
    };
    if x == y {
        return Err(Error::IncompatibleVariables(format!(
            "'{x}' cannot be correlated with itself"
        )));
    }
    Ok((x, y))
}

/// Pearson r and least-squares fit over equal-length paired series.
///
/// `slope = Σ(dx·dy) / Σdx²`, `intercept = ȳ - slope·x̄`.
pub fn regress(xs: &[f64], ys: &[f64], x_name: &str, y_name: &str) -> Result<CorrelationResult> {
    debug_assert_eq!(xs.len(), ys.len());
    let n = xs.len().min(ys.len());
    if n < 2 {
        return Err(Error::InsufficientData {
            variable: format!("{x_name} × {y_name}"),
            available: n,
            required: 2,
        });
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);

    let x_mean = mean(xs).unwrap_or_default();
    let y_mean = mean(ys).unwrap_or_default();

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (xi, yi) in xs.iter().zip(ys) {
        let (dx, dy) = (xi - x_mean, yi - y_mean);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 {
        return Err(Error::DegenerateRegression(x_name.to_string()));
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let coefficient = (syy > 0.0).then(|| sxy / (sxx * syy).sqrt());

    let min_x = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let max_x = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(CorrelationResult {
        variable_x: x_name.to_string(),
        variable_y: y_name.to_string(),
        coefficient,
        slope,
        intercept,
        sample_size: n,
        regression_endpoints: [
            (min_x, slope * min_x + intercept),
            (max_x, slope * max_x + intercept),
        ],
        date_range: None,
    })
}
