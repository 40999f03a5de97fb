use thiserror::Error;

/// Errors produced while normalizing, filtering or analysing a dataset.
///
/// Every variant is data: callers decide how to render it, nothing here is
/// fatal to the host application.
#[derive(Error, Debug)]
pub enum Error {
    /// Unrecognized or malformed input shape.
    #[error("source format error: {0}")]
    SourceFormat(String),

    /// Parsing succeeded but produced zero usable records.
    #[error("dataset contains no usable records")]
    EmptyDataset,

    /// Statistics requested over too few values.
    #[error("insufficient data for '{variable}': {available} value(s), need at least {required}")]
    InsufficientData {
        variable: String,
        available: usize,
        required: usize,
    },

    /// Correlation requested with an unset or repeated variable.
    #[error("incompatible variables: {0}")]
    IncompatibleVariables(String),

    /// The x series has zero variance, so no regression line exists.
    #[error("degenerate regression: '{0}' has zero variance")]
    DegenerateRegression(String),

    /// Non-success response from an external fetch.
    #[error("network error: HTTP {status} from {url}")]
    Network { status: u16, url: String },

    #[error("unknown location: {0}")]
    UnknownLocation(String),

    /// Dataset registry rule violation (upload or delete).
    #[error("registry error: {0}")]
    Registry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::SourceFormat(format!("CSV: {err}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SourceFormat(format!("JSON: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
