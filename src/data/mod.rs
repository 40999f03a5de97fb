/// Data layer: core types, normalization, filtering and export.
///
/// Architecture:
/// ```text
///  .csv / .json / .xlsx / archive payload
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse source → Dataset (+ diagnostics)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  VariableCatalog, records sorted by timestamp
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  time window + variable projection → new Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  quoted CSV text
///   └──────────┘
/// ```

pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod time;
pub mod workbook;
