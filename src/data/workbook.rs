use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};

use crate::error::{Error, Result};

/// A decoded spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    /// A date-formatted cell, still in serial days.
    DateSerial(f64),
}

impl Cell {
    /// Numeric reading of the cell, used for variable columns.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) | Cell::DateSerial(v) => Some(*v),
            Cell::Text(s) => s.trim().parse().ok(),
            Cell::Empty | Cell::Bool(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text shown in diagnostics.
    pub fn raw_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(v) | Cell::DateSerial(v) => v.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

/// One named sheet: the first row is the header.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

/// A pre-decoded workbook with sheets in declared order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Decode workbook bytes (`.xlsx`, `.xls`, `.ods`).
    ///
    /// # Errors
    /// [`Error::SourceFormat`] when the bytes are not a readable workbook or
    /// it contains no sheets.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut book = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| Error::SourceFormat(format!("workbook: {e}")))?;

        let mut sheets = Vec::new();
        for name in book.sheet_names() {
            let range = book
                .worksheet_range(&name)
                .map_err(|e| Error::SourceFormat(format!("sheet '{name}': {e}")))?;
            let rows = range
                .rows()
                .map(|row| row.iter().map(convert_cell).collect())
                .collect();
            sheets.push(Sheet { name, rows });
        }

        if sheets.is_empty() {
            return Err(Error::SourceFormat("no sheets found in workbook".into()));
        }
        log::debug!("decoded workbook with {} sheet(s)", sheets.len());
        Ok(Self { sheets })
    }
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::DateSerial(dt.as_f64()),
        Data::Error(e) => Cell::Text(format!("#{e:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_reading() {
        assert_eq!(Cell::Number(2.5).as_f64(), Some(2.5));
        assert_eq!(Cell::DateSerial(45000.0).as_f64(), Some(45000.0));
        assert_eq!(Cell::Text(" 7 ".into()).as_f64(), Some(7.0));
        assert_eq!(Cell::Text("n/a".into()).as_f64(), None);
        assert_eq!(Cell::Bool(true).as_f64(), None);
    }

    #[test]
    fn blank_text_is_empty() {
        assert!(Cell::Text("   ".into()).is_empty());
        assert!(Cell::Empty.is_empty());
        assert!(!Cell::Number(0.0).is_empty());
    }

    const SENSOR_LOG: &[u8] = include_bytes!("../../tests/fixtures/sensor_log.xlsx");

    #[test]
    fn decodes_xlsx_in_sheet_order() {
        let book = Workbook::from_bytes(SENSOR_LOG).unwrap();
        let names: Vec<&str> = book.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Readings", "Notes"]);

        let readings = &book.sheets[0];
        assert_eq!(readings.rows[0], [Cell::Text("Date".into()), Cell::Text("CO2".into())]);
        assert_eq!(readings.rows[1], [Cell::DateSerial(45000.5), Cell::Number(410.0)]);
        assert_eq!(readings.rows[2], [Cell::DateSerial(45001.0), Cell::Number(420.0)]);

        let notes = &book.sheets[1];
        assert_eq!(notes.rows[1], [Cell::Text("2024-01-01".into()), Cell::Number(1.0)]);
    }

    #[test]
    fn garbage_bytes_are_a_format_error() {
        let err = Workbook::from_bytes(b"not a workbook").unwrap_err();
        assert!(matches!(err, Error::SourceFormat(_)));
    }
}
