use csv::{QuoteStyle, Terminator, WriterBuilder};

use super::model::Dataset;
use super::time::format_timestamp;
use crate::error::{Error, Result};
use crate::variables::VariableNameMap;

/// Render a dataset as CSV text.
///
/// The first line is the comma-joined header (time column, then each
/// catalog key, or its display label when `labels` knows one). Every data
/// field is quoted; a null renders as `""`. Lines are separated by `\n` with
/// no trailing newline.
pub fn to_csv(dataset: &Dataset, labels: Option<&VariableNameMap>) -> Result<String> {
    let mut header = vec![dataset.time_label().to_string()];
    header.extend(dataset.catalog().keys().iter().map(|key| {
        labels
            .and_then(|map| map.label_for(key))
            .unwrap_or(key)
            .to_string()
    }));

    let mut out = Vec::new();
    {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(&mut out);
        writer.write_record(&header)?;
        writer.flush()?;
    }
    {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(&mut out);
        for record in dataset.records() {
            let mut fields = Vec::with_capacity(record.values.len() + 1);
            fields.push(format_timestamp(&record.timestamp));
            fields.extend(
                record
                    .values
                    .iter()
                    .map(|v| v.map(|x| x.to_string()).unwrap_or_default()),
            );
            writer.write_record(&fields)?;
        }
        writer.flush()?;
    }

    let mut text = String::from_utf8(out).map_err(|e| Error::SourceFormat(e.to_string()))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Download name for an archive export, e.g.
/// `HourlyData_Kaneohe_2024-09-01_to_2024-09-02.csv`.
pub fn export_file_name(prefix: &str, location: &str, start: &str, end: &str) -> String {
    format!("{prefix}_{location}_{start}_to_{end}.csv")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{NormalizeOptions, normalize_csv};

    #[test]
    fn header_plain_fields_quoted() {
        let ds = normalize_csv(
            "time,temperature_2m,precipitation\n2024-09-01T00:00,78.5,\n2024-09-01T01:00,77,0.01\n",
            &NormalizeOptions::full(),
        )
        .unwrap()
        .value;

        let csv = to_csv(&ds, None).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "time,temperature_2m,precipitation");
        assert_eq!(lines[1], r#""2024-09-01T00:00:00Z","78.5","""#);
        assert_eq!(lines[2], r#""2024-09-01T01:00:00Z","77","0.01""#);
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn labels_replace_known_keys() {
        let ds = normalize_csv("time,temperature_2m,mystery\n2024-09-01,1,2\n", &NormalizeOptions::full())
            .unwrap()
            .value;
        let csv = to_csv(&ds, Some(&VariableNameMap::hourly_weather())).unwrap();
        assert!(csv.starts_with("time,Temperature,mystery\n"));
    }

    #[test]
    fn file_name() {
        assert_eq!(
            export_file_name("DailyData", "Kaneohe", "2024-09-01", "2024-09-02"),
            "DailyData_Kaneohe_2024-09-01_to_2024-09-02.csv"
        );
    }
}
