use std::fmt::Write;

use super::correlation::CorrelationResult;
use super::stats::StatisticsSummary;
use crate::error::Result;

/// Column headings of the statistics table.
pub const SUMMARY_HEADINGS: [&str; 10] = [
    "Variable", "Min", "Mean", "Max", "Median", "Std Dev", "Variance", "IQR", "Mode", "95% CI",
];

/// One display row: every number at two decimals.
pub fn summary_row(s: &StatisticsSummary) -> [String; 10] {
    let mode = if s.mode.is_empty() {
        "No mode".to_string()
    } else {
        s.mode.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
    };
    let (lo, hi) = s.confidence_interval;
    [
        s.variable.clone(),
        format!("{:.2}", s.min),
        format!("{:.2}", s.mean),
        format!("{:.2}", s.max),
        format!("{:.2}", s.median),
        format!("{:.2}", s.stddev),
        format!("{:.2}", s.variance),
        format!("{:.2}", s.iqr),
        mode,
        format!("[{lo:.2}, {hi:.2}]"),
    ]
}

/// Plain-text table of per-variable results. Failed variables get an
/// explicit "no data" row instead of numbers.
pub fn summary_table(rows: &[(String, Result<StatisticsSummary>)]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|(name, summary)| match summary {
            Ok(s) => summary_row(s).to_vec(),
            Err(e) => vec![name.clone(), format!("no data ({e})")],
        })
        .collect();

    let mut widths: Vec<usize> = SUMMARY_HEADINGS.iter().map(|h| h.len()).collect();
    let columns = widths.len();
    for row in cells.iter().filter(|r| r.len() == columns) {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let heading: Vec<String> = SUMMARY_HEADINGS.iter().map(|h| h.to_string()).collect();
    push_line(&mut out, &heading, &widths);
    for row in &cells {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(c, &w)| format!("{c:<w$}"))
        .collect();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}

/// Human-readable correlation summary.
pub fn correlation_text(r: &CorrelationResult) -> String {
    let range = match r.date_range {
        Some((start, end)) => format!("{} - {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d")),
        None => "N/A".to_string(),
    };
    let coefficient = match r.coefficient {
        Some(c) => format!("{c:.3}"),
        None => "undefined (constant series)".to_string(),
    };
    let [(x0, y0), (x1, y1)] = r.regression_endpoints;
    format!(
        "Date Range: {range}\n\
         Sample Size: {}\n\
         Correlation between {} and {}: {coefficient}\n\
         Regression: y = {:.4}x + {:.4} (from ({x0:.2}, {y0:.2}) to ({x1:.2}, {y1:.2}))",
        r.sample_size, r.variable_x, r.variable_y, r.slope, r.intercept
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::correlation::regress;
    use crate::error::Error;

    #[test]
    fn two_decimal_row() {
        let s = StatisticsSummary::compute("CO2", &[Some(1.0), Some(2.0), Some(2.0), Some(4.0)]).unwrap();
        let row = summary_row(&s);
        assert_eq!(row[0], "CO2");
        assert_eq!(row[1], "1.00");
        assert_eq!(row[2], "2.25");
        assert_eq!(row[8], "2");
        assert!(row[9].starts_with('[') && row[9].ends_with(']'));
    }

    #[test]
    fn failed_variable_renders_no_data() {
        let rows = vec![
            ("a".to_string(), StatisticsSummary::compute("a", &[Some(1.0), Some(3.0)])),
            (
                "b".to_string(),
                Err(Error::InsufficientData {
                    variable: "b".into(),
                    available: 0,
                    required: 2,
                }),
            ),
        ];
        let table = summary_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Variable"));
        assert!(lines[1].starts_with("a "));
        assert!(lines[2].starts_with("b ") && lines[2].contains("no data"));
    }

    #[test]
    fn long_names_widen_the_column() {
        let name = "relative_humidity_2m";
        let rows = vec![(name.to_string(), StatisticsSummary::compute(name, &[Some(1.0), Some(3.0)]))];
        let table = summary_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        let column_of = |line: &str, needle: &str| line.find(needle).unwrap();
        assert_eq!(column_of(lines[0], "Min"), name.len() + 2);
        assert_eq!(column_of(lines[1], "1.00"), name.len() + 2);
    }

    #[test]
    fn correlation_three_decimals() {
        let r = regress(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.5], "x", "y").unwrap();
        let text = correlation_text(&r);
        assert!(text.contains("Sample Size: 3"));
        assert!(text.contains("Date Range: N/A"));
        assert!(text.contains(&format!("{:.3}", r.coefficient.unwrap())));
    }
}
