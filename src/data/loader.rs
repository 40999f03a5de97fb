use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde_json::Value as JsonValue;

use super::model::{Dataset, DatasetBuilder, Diagnostic, Normalized, TimeSeriesRecord, VariableCatalog};
use super::time::{Timestamp, from_spreadsheet_serial, parse_timestamp};
use super::workbook::{Cell, Sheet, Workbook};
use crate::error::{Error, Result};

/// Row cap used when previewing an uploaded dataset.
pub const PREVIEW_ROWS: usize = 10;

/// Header names recognised as the timestamp column, in priority order.
const TIME_COLUMN_NAMES: &[&str] = &["time", "date", "timestamp", "datetime"];

/// Serial date column of the fixed sensor-log layout.
pub const SENSOR_TIME_COLUMN: &str = "Date";

// ---------------------------------------------------------------------------
// Source kinds and options
// ---------------------------------------------------------------------------

/// The raw representations the normalizer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    DelimitedText,
    SpreadsheetWorkbook,
    Json,
}

impl SourceKind {
    /// Detect the kind from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "txt" => Ok(SourceKind::DelimitedText),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(SourceKind::SpreadsheetWorkbook),
            "json" => Ok(SourceKind::Json),
            other => Err(Error::SourceFormat(format!("unsupported file extension: .{other}"))),
        }
    }

    /// Detect the kind from an HTTP `Content-Type` value.
    pub fn from_content_type(content_type: &str) -> Result<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "text/csv" => Ok(SourceKind::DelimitedText),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
                Ok(SourceKind::SpreadsheetWorkbook)
            }
            "application/json" => Ok(SourceKind::Json),
            other => Err(Error::SourceFormat(format!("unsupported content type: {other}"))),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::DelimitedText => write!(f, "delimited text"),
            SourceKind::SpreadsheetWorkbook => write!(f, "spreadsheet workbook"),
            SourceKind::Json => write!(f, "JSON"),
        }
    }
}

/// Knobs for one normalization call.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Maximum records kept per dataset (per sheet for workbooks).
    pub row_limit: Option<usize>,
    /// Header of the timestamp column; detected when `None`.
    pub time_column: Option<String>,
    /// Read the source as a sensor log: first sheet only, time in
    /// [`SENSOR_TIME_COLUMN`] unless `time_column` says otherwise.
    pub sensor_log: bool,
}

impl NormalizeOptions {
    /// Uncapped ingestion.
    pub fn full() -> Self {
        Self::default()
    }

    /// First [`PREVIEW_ROWS`] records only.
    pub fn preview() -> Self {
        Self {
            row_limit: Some(PREVIEW_ROWS),
            ..Self::default()
        }
    }

    pub fn with_row_limit(mut self, limit: Option<usize>) -> Self {
        self.row_limit = limit;
        self
    }

    pub fn with_time_column(mut self, column: impl Into<String>) -> Self {
        self.time_column = Some(column.into());
        self
    }

    pub fn as_sensor_log(mut self) -> Self {
        self.sensor_log = true;
        self
    }

    /// Sensor logs fall back to their fixed `Date` column.
    fn effective(&self) -> NormalizeOptions {
        let mut options = self.clone();
        if options.sensor_log && options.time_column.is_none() {
            options.time_column = Some(SENSOR_TIME_COLUMN.to_string());
        }
        options
    }
}

// ---------------------------------------------------------------------------
// Output shapes
// ---------------------------------------------------------------------------

/// Named datasets from a multi-sheet workbook, in declared sheet order.
#[derive(Debug, Clone)]
pub struct SheetSet {
    sheets: Vec<(String, Dataset)>,
}

impl SheetSet {
    /// The default active sheet: the first in declared order.
    pub fn active(&self) -> (&str, &Dataset) {
        let (name, ds) = &self.sheets[0];
        (name, ds)
    }

    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.sheets.iter().find(|(n, _)| n == name).map(|(_, ds)| ds)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dataset)> {
        self.sheets.iter().map(|(n, ds)| (n.as_str(), ds))
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Result of normalizing one source.
#[derive(Debug, Clone)]
pub enum Loaded {
    Single(Dataset),
    Workbook(SheetSet),
}

impl Loaded {
    /// The dataset shown by default.
    pub fn active(&self) -> &Dataset {
        match self {
            Loaded::Single(ds) => ds,
            Loaded::Workbook(set) => set.active().1,
        }
    }

    /// Select a sheet by name; `None` picks the active dataset.
    pub fn select(&self, sheet: Option<&str>) -> Option<&Dataset> {
        match (self, sheet) {
            (_, None) => Some(self.active()),
            (Loaded::Workbook(set), Some(name)) => set.get(name),
            (Loaded::Single(_), Some(_)) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load and normalize a file. Dispatch by extension.
pub fn load_file(path: &Path, options: &NormalizeOptions) -> anyhow::Result<Normalized<Loaded>> {
    let kind = SourceKind::from_path(path)?;
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let out = normalize(&bytes, kind, options)
        .with_context(|| format!("normalizing {} as {kind}", path.display()))?;
    Ok(out)
}

/// Normalize raw bytes of a known source kind.
pub fn normalize(bytes: &[u8], kind: SourceKind, options: &NormalizeOptions) -> Result<Normalized<Loaded>> {
    let options = &options.effective();
    let out = match kind {
        SourceKind::DelimitedText => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| Error::SourceFormat(format!("delimited text is not UTF-8: {e}")))?;
            normalize_csv(text, options)?.map(Loaded::Single)
        }
        SourceKind::Json => {
            let root: JsonValue = serde_json::from_slice(bytes)?;
            normalize_json(&root, options)?.map(Loaded::Single)
        }
        SourceKind::SpreadsheetWorkbook if options.sensor_log => {
            let book = Workbook::from_bytes(bytes)?;
            normalize_sensor_log(&book, options)?.map(Loaded::Single)
        }
        SourceKind::SpreadsheetWorkbook => {
            let book = Workbook::from_bytes(bytes)?;
            normalize_workbook(&book, options)?.map(Loaded::Workbook)
        }
    };
    log::info!(
        "normalized {} records from {kind} ({} diagnostics)",
        out.value.active().len(),
        out.diagnostics.len()
    );
    Ok(out)
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

/// Header row names the columns; later rows map positionally.
/// Blank lines are skipped and short rows read as null.
pub fn normalize_csv(text: &str, options: &NormalizeOptions) -> Result<Normalized<Dataset>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(Error::SourceFormat("delimited text has no header row".into()));
    }
    let time_idx = resolve_time_column(&headers, options)?;
    let columns: Vec<usize> = (0..headers.len()).filter(|&i| i != time_idx).collect();
    let catalog = VariableCatalog::new(columns.iter().map(|&i| headers[i].clone()))?;

    let mut builder = DatasetBuilder::new(headers[time_idx].clone(), catalog, options.row_limit);

    for (i, result) in reader.records().enumerate() {
        if builder.is_full() {
            break;
        }
        let row = i + 1;
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let Some(timestamp) = parse_time_field(record.get(time_idx), row, &mut builder) else {
            continue;
        };

        if record.len() > headers.len() {
            builder.report(Diagnostic::UnknownKey {
                row,
                key: format!("column {}", headers.len() + 1),
            });
        }

        let values = columns
            .iter()
            .map(|&col| parse_text_value(record.get(col), row, &headers[col], &mut builder))
            .collect();
        builder.push(row, TimeSeriesRecord::new(timestamp, values));
    }

    builder.finish()
}

fn parse_time_field(field: Option<&str>, row: usize, builder: &mut DatasetBuilder) -> Option<Timestamp> {
    match field.map(str::trim) {
        None | Some("") => {
            builder.skip(row, "missing timestamp");
            None
        }
        Some(text) => {
            let parsed = parse_timestamp(text);
            if parsed.is_none() {
                builder.skip(row, format!("unparseable timestamp '{text}'"));
            }
            parsed
        }
    }
}

fn parse_text_value(field: Option<&str>, row: usize, variable: &str, builder: &mut DatasetBuilder) -> Option<f64> {
    let text = field.map(str::trim).unwrap_or("");
    if text.is_empty() {
        return None;
    }
    let parsed = parse_number(text);
    if parsed.is_none() {
        builder.report(Diagnostic::NonNumericValue {
            row,
            variable: variable.to_string(),
            raw: text.to_string(),
        });
    }
    parsed
}

/// Finite numbers only; `NaN` and infinities count as non-numeric.
fn parse_number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Accepted shapes:
///
/// ```json
/// [ { "time": "2024-11-07T00:00", "CO2": 412.5, "pH": 8.1 }, ... ]
/// { "time": "2024-11-07T00:00", "CO2": 412.5 }
/// ```
///
/// The first element's keys declare the columns. Later elements missing any
/// of them are rejected; extra keys are dropped.
pub fn normalize_json(root: &JsonValue, options: &NormalizeOptions) -> Result<Normalized<Dataset>> {
    let elements: Vec<&JsonValue> = match root {
        JsonValue::Array(items) => items.iter().collect(),
        JsonValue::Object(_) => vec![root],
        _ => {
            return Err(Error::SourceFormat(
                "expected a JSON array of objects or a single object".into(),
            ));
        }
    };

    let first = elements.first().ok_or(Error::EmptyDataset)?;
    let first = first
        .as_object()
        .ok_or_else(|| Error::SourceFormat("first JSON element is not an object".into()))?;

    let keys: Vec<String> = first.keys().cloned().collect();
    let time_idx = resolve_time_column(&keys, options)?;
    let time_key = keys[time_idx].clone();
    let variables: Vec<String> = keys.iter().filter(|k| **k != time_key).cloned().collect();
    let catalog = VariableCatalog::new(variables.clone())?;

    let mut builder = DatasetBuilder::new(time_key.clone(), catalog, options.row_limit);

    for (i, element) in elements.iter().enumerate() {
        if builder.is_full() {
            break;
        }
        let row = i + 1;
        let Some(obj) = element.as_object() else {
            builder.skip(row, "element is not an object");
            continue;
        };
        if let Some(missing) = keys.iter().find(|k| !obj.contains_key(k.as_str())) {
            builder.skip(row, format!("missing key '{missing}'"));
            continue;
        }
        for key in obj.keys().filter(|k| !keys.contains(k)) {
            builder.report(Diagnostic::UnknownKey {
                row,
                key: key.clone(),
            });
        }

        let timestamp = match &obj[time_key.as_str()] {
            JsonValue::String(s) => parse_time_field(Some(s.as_str()), row, &mut builder),
            JsonValue::Null => parse_time_field(None, row, &mut builder),
            other => {
                builder.skip(row, format!("timestamp {other} is not text"));
                None
            }
        };
        let Some(timestamp) = timestamp else {
            continue;
        };

        let values = variables
            .iter()
            .map(|key| json_to_value(&obj[key.as_str()], row, key, &mut builder))
            .collect();
        builder.push(row, TimeSeriesRecord::new(timestamp, values));
    }

    builder.finish()
}

fn json_to_value(val: &JsonValue, row: usize, variable: &str, builder: &mut DatasetBuilder) -> Option<f64> {
    match val {
        JsonValue::Null => None,
        JsonValue::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        JsonValue::String(s) => parse_text_value(Some(s.as_str()), row, variable, builder),
        other => {
            builder.report(Diagnostic::NonNumericValue {
                row,
                variable: variable.to_string(),
                raw: other.to_string(),
            });
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet workbooks
// ---------------------------------------------------------------------------

/// Normalize every sheet. Sheets without usable records are dropped with a
/// diagnostic; the workbook fails only when none remain.
pub fn normalize_workbook(book: &Workbook, options: &NormalizeOptions) -> Result<Normalized<SheetSet>> {
    let mut sheets = Vec::new();
    let mut diagnostics = Vec::new();

    for sheet in &book.sheets {
        match normalize_sheet(sheet, options) {
            Ok(out) => {
                diagnostics.extend(out.diagnostics);
                sheets.push((sheet.name.clone(), out.value));
            }
            Err(Error::EmptyDataset) => {
                log::warn!("sheet '{}' has no usable records", sheet.name);
                diagnostics.push(Diagnostic::EmptySheet {
                    sheet: sheet.name.clone(),
                });
            }
            Err(Error::SourceFormat(msg)) => {
                return Err(Error::SourceFormat(format!("sheet '{}': {msg}", sheet.name)));
            }
            Err(other) => return Err(other),
        }
    }

    if sheets.is_empty() {
        return Err(Error::EmptyDataset);
    }
    Ok(Normalized {
        value: SheetSet { sheets },
        diagnostics,
    })
}

/// Normalize one sheet: first row is the header, blank header cells are
/// unused columns. Numeric time cells are serial dates.
pub fn normalize_sheet(sheet: &Sheet, options: &NormalizeOptions) -> Result<Normalized<Dataset>> {
    let Some((header_row, body)) = sheet.rows.split_first() else {
        return Err(Error::EmptyDataset);
    };

    let named: Vec<(usize, String)> = header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| (i, cell.raw_text().trim().to_string()))
        .filter(|(_, name)| !name.is_empty())
        .collect();
    let names: Vec<String> = named.iter().map(|(_, n)| n.clone()).collect();
    let time_pos = resolve_time_column(&names, options)?;
    let time_col = named[time_pos].0;
    let columns: Vec<(usize, String)> = named
        .iter()
        .enumerate()
        .filter(|(pos, _)| *pos != time_pos)
        .map(|(_, c)| c.clone())
        .collect();
    let catalog = VariableCatalog::new(columns.iter().map(|(_, n)| n.clone()))?;

    let mut builder = DatasetBuilder::new(names[time_pos].clone(), catalog, options.row_limit);

    for (i, cells) in body.iter().enumerate() {
        if builder.is_full() {
            break;
        }
        let row = i + 1;
        if cells.iter().all(Cell::is_empty) {
            continue;
        }

        let timestamp = match cells.get(time_col) {
            Some(Cell::Number(serial)) | Some(Cell::DateSerial(serial)) => {
                let ts = from_spreadsheet_serial(*serial);
                if ts.is_none() {
                    builder.skip(row, format!("serial date {serial} out of range"));
                }
                ts
            }
            Some(Cell::Text(text)) => parse_time_field(Some(text.as_str()), row, &mut builder),
            Some(Cell::Bool(_)) => {
                builder.skip(row, "boolean in timestamp column");
                None
            }
            Some(Cell::Empty) | None => parse_time_field(None, row, &mut builder),
        };
        let Some(timestamp) = timestamp else {
            continue;
        };

        let values = columns
            .iter()
            .map(|(col, name)| {
                let cell = cells.get(*col).unwrap_or(&Cell::Empty);
                if cell.is_empty() {
                    return None;
                }
                let parsed = cell.as_f64().filter(|v| v.is_finite());
                if parsed.is_none() {
                    builder.report(Diagnostic::NonNumericValue {
                        row,
                        variable: name.clone(),
                        raw: cell.raw_text(),
                    });
                }
                parsed
            })
            .collect();
        builder.push(row, TimeSeriesRecord::new(timestamp, values));
    }

    builder.finish()
}

/// Sensor logs: fixed single-sheet workbook with a serial `Date` column.
/// Later sheets are ignored.
pub fn normalize_sensor_log(book: &Workbook, options: &NormalizeOptions) -> Result<Normalized<Dataset>> {
    let sheet = book
        .sheets
        .first()
        .ok_or_else(|| Error::SourceFormat("sensor log has no sheets".into()))?;
    normalize_sheet(sheet, &options.clone().as_sensor_log().effective())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resolve_time_column(headers: &[String], options: &NormalizeOptions) -> Result<usize> {
    if let Some(wanted) = &options.time_column {
        return headers
            .iter()
            .position(|h| h == wanted)
            .ok_or_else(|| Error::SourceFormat(format!("time column '{wanted}' not found")));
    }
    TIME_COLUMN_NAMES
        .iter()
        .find_map(|candidate| headers.iter().position(|h| h.eq_ignore_ascii_case(candidate)))
        .ok_or_else(|| {
            Error::SourceFormat(format!(
                "no time column among [{}]; expected one of {TIME_COLUMN_NAMES:?}",
                headers.join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::time::format_timestamp;
    use serde_json::json;

    #[test]
    fn csv_basic() {
        let text = "time,temp,hum\n2024-01-01T00:00,10.5,80\n\n2024-01-01T01:00,11,\n";
        let out = normalize_csv(text, &NormalizeOptions::full()).unwrap();
        let ds = out.value;
        assert_eq!(ds.time_label(), "time");
        assert_eq!(ds.catalog().keys(), ["temp", "hum"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column("hum"), Some(vec![Some(80.0), None]));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn csv_short_rows_and_bad_cells() {
        let text = "Date,a,b\n2024-01-02,1\n2024-01-01,x,2\nnot-a-date,3,4\n";
        let out = normalize_csv(text, &NormalizeOptions::full()).unwrap();
        let ds = out.value;
        // Sorted ascending regardless of source order.
        assert_eq!(format_timestamp(&ds.records()[0].timestamp), "2024-01-01T00:00:00Z");
        assert_eq!(ds.column("a"), Some(vec![None, Some(1.0)]));
        assert_eq!(ds.column("b"), Some(vec![Some(2.0), None]));
        assert_eq!(out.diagnostics.len(), 2);
        assert!(matches!(
            out.diagnostics[0],
            Diagnostic::NonNumericValue { row: 2, .. }
        ));
        assert!(matches!(out.diagnostics[1], Diagnostic::SkippedRow { row: 3, .. }));
    }

    #[test]
    fn csv_preview_caps_rows() {
        let mut text = String::from("time,v\n");
        for day in 1..=20 {
            text.push_str(&format!("2024-01-{day:02},{day}\n"));
        }
        let out = normalize_csv(&text, &NormalizeOptions::preview()).unwrap();
        assert_eq!(out.value.len(), PREVIEW_ROWS);
        let out = normalize_csv(&text, &NormalizeOptions::full()).unwrap();
        assert_eq!(out.value.len(), 20);
    }

    #[test]
    fn csv_without_time_column_fails() {
        let err = normalize_csv("a,b\n1,2\n", &NormalizeOptions::full()).unwrap_err();
        assert!(matches!(err, Error::SourceFormat(_)));
    }

    #[test]
    fn csv_header_only_is_empty() {
        let err = normalize_csv("time,a\n", &NormalizeOptions::full()).unwrap_err();
        assert!(matches!(err, Error::EmptyDataset));
    }

    #[test]
    fn json_array_rejects_incomplete_elements() {
        let root = json!([
            {"time": "2024-01-01T00:00", "a": 1.0, "b": 2},
            {"time": "2024-01-01T01:00", "a": 3.0},
            {"time": "2024-01-01T02:00", "a": 5.0, "b": null, "extra": true}
        ]);
        let out = normalize_json(&root, &NormalizeOptions::full()).unwrap();
        let ds = out.value;
        assert_eq!(ds.catalog().keys(), ["a", "b"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column("b"), Some(vec![Some(2.0), None]));
        assert!(out.diagnostics.contains(&Diagnostic::SkippedRow {
            row: 2,
            reason: "missing key 'b'".into()
        }));
        assert!(out.diagnostics.contains(&Diagnostic::UnknownKey {
            row: 3,
            key: "extra".into()
        }));
    }

    #[test]
    fn json_single_object_is_one_record() {
        let root = json!({"Date": "2024-11-07T10:00:00Z", "CO2": 412.5});
        let ds = normalize_json(&root, &NormalizeOptions::full()).unwrap().value;
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.values("CO2"), vec![412.5]);
    }

    #[test]
    fn json_other_shapes_fail() {
        for root in [json!(42), json!("text"), json!(null), json!([1, 2])] {
            let err = normalize_json(&root, &NormalizeOptions::full()).unwrap_err();
            assert!(matches!(err, Error::SourceFormat(_)), "{root}");
        }
        let err = normalize_json(&json!([]), &NormalizeOptions::full()).unwrap_err();
        assert!(matches!(err, Error::EmptyDataset));
    }

    fn sheet(name: &str, rows: Vec<Vec<Cell>>) -> Sheet {
        Sheet {
            name: name.into(),
            rows,
        }
    }

    fn text(s: &str) -> Cell {
        Cell::Text(s.into())
    }

    #[test]
    fn sheet_serial_dates_keep_time_of_day() {
        let s = sheet(
            "Sensors",
            vec![
                vec![text("Date"), text("pH"), Cell::Empty],
                vec![Cell::Number(45000.5), Cell::Number(8.1), Cell::Empty],
                vec![Cell::DateSerial(45000.25), text("8.0"), Cell::Empty],
            ],
        );
        let out = normalize_sheet(&s, &NormalizeOptions::full()).unwrap();
        let ds = out.value;
        assert_eq!(ds.catalog().keys(), ["pH"]);
        let stamps: Vec<String> = ds.records().iter().map(|r| format_timestamp(&r.timestamp)).collect();
        assert_eq!(stamps, ["2023-03-15T06:00:00Z", "2023-03-15T12:00:00Z"]);
        assert_eq!(ds.values("pH"), vec![8.0, 8.1]);
    }

    #[test]
    fn workbook_keeps_sheet_order_and_drops_empty_sheets() {
        let book = Workbook {
            sheets: vec![
                sheet(
                    "First",
                    vec![vec![text("time"), text("v")], vec![text("2024-01-01"), Cell::Number(1.0)]],
                ),
                sheet("Notes", vec![]),
                sheet(
                    "Second",
                    vec![vec![text("time"), text("w")], vec![text("2024-01-02"), Cell::Number(2.0)]],
                ),
            ],
        };
        let out = normalize_workbook(&book, &NormalizeOptions::preview()).unwrap();
        let set = out.value;
        assert_eq!(set.names().collect::<Vec<_>>(), ["First", "Second"]);
        assert_eq!(set.active().0, "First");
        assert_eq!(
            out.diagnostics,
            vec![Diagnostic::EmptySheet {
                sheet: "Notes".into()
            }]
        );
    }

    #[test]
    fn workbook_with_only_empty_sheets_fails() {
        let book = Workbook {
            sheets: vec![sheet("A", vec![vec![text("time")]])],
        };
        assert!(matches!(
            normalize_workbook(&book, &NormalizeOptions::full()),
            Err(Error::EmptyDataset)
        ));
    }

    #[test]
    fn sensor_log_uses_date_column() {
        let book = Workbook {
            sheets: vec![sheet(
                "Log",
                vec![
                    vec![text("Time"), text("Date"), text("CO2")],
                    vec![text("ignored"), Cell::Number(45000.0), Cell::Number(410.0)],
                ],
            )],
        };
        let ds = normalize_sensor_log(&book, &NormalizeOptions::full()).unwrap().value;
        assert_eq!(ds.time_label(), "Date");
        assert_eq!(ds.catalog().keys(), ["Time", "CO2"]);
    }

    #[test]
    fn sensor_log_option_overrides_time_detection() {
        let book = Workbook {
            sheets: vec![
                sheet(
                    "Log",
                    vec![
                        vec![text("Time"), text("Date"), text("CO2")],
                        vec![text("a"), Cell::DateSerial(45000.0), Cell::Number(410.0)],
                        vec![text("b"), Cell::DateSerial(45000.5), Cell::Number(420.0)],
                        vec![text("c"), Cell::DateSerial(45001.0), Cell::Number(430.0)],
                    ],
                ),
                sheet("Notes", vec![vec![text("time")], vec![text("2024-01-01")]]),
            ],
        };
        // Generic detection prefers "Time", whose cells are not timestamps.
        let generic = normalize_workbook(&book, &NormalizeOptions::full()).unwrap();
        assert!(generic.value.get("Log").is_none());
        assert!(generic
            .diagnostics
            .contains(&Diagnostic::EmptySheet { sheet: "Log".into() }));

        let ds = normalize_sensor_log(&book, &NormalizeOptions::full().with_row_limit(Some(2)))
            .unwrap()
            .value;
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.values("CO2"), vec![410.0, 420.0]);
        assert_eq!(
            ds.time_span().map(|(start, _)| format_timestamp(&start)),
            Some("2023-03-15T00:00:00Z".to_string())
        );
    }

    #[test]
    fn sensor_log_csv_reads_date_column() {
        let text = "Time,Date,CO2\nnoon,2024-11-07T12:00,410\n";
        let generic = normalize(text.as_bytes(), SourceKind::DelimitedText, &NormalizeOptions::full());
        assert!(matches!(generic, Err(Error::EmptyDataset)));

        let options = NormalizeOptions::full().as_sensor_log();
        let out = normalize(text.as_bytes(), SourceKind::DelimitedText, &options).unwrap();
        assert_eq!(out.value.active().time_label(), "Date");
        assert_eq!(out.value.active().values("CO2"), vec![410.0]);
    }

    #[test]
    fn source_kind_detection() {
        assert_eq!(SourceKind::from_extension("CSV").unwrap(), SourceKind::DelimitedText);
        assert_eq!(
            SourceKind::from_content_type("application/json; charset=utf-8").unwrap(),
            SourceKind::Json
        );
        assert_eq!(
            SourceKind::from_content_type("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
                .unwrap(),
            SourceKind::SpreadsheetWorkbook
        );
        assert!(matches!(
            SourceKind::from_content_type("image/png"),
            Err(Error::SourceFormat(_))
        ));
        assert!(matches!(SourceKind::from_extension("parquet"), Err(Error::SourceFormat(_))));
    }

    #[test]
    fn load_file_dispatches_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readings.json");
        std::fs::write(&path, r#"[{"time":"2024-01-01","v":1},{"time":"2024-01-02","v":2}]"#).unwrap();
        let out = load_file(&path, &NormalizeOptions::full()).unwrap();
        assert_eq!(out.value.active().values("v"), vec![1.0, 2.0]);
        assert!(out.value.select(Some("Sheet1")).is_none());
    }
}
