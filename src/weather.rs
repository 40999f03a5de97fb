//! Weather archive integration: query construction and payload decoding.
//!
//! The HTTP fetch itself is an external collaborator behind
//! [`ArchiveTransport`]; this module only builds the URL and turns the
//! response body into datasets.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::data::model::{Dataset, DatasetBuilder, Diagnostic, Normalized, TimeSeriesRecord, VariableCatalog};
use crate::data::time::parse_timestamp;
use crate::error::{Error, Result};
use crate::variables::VariableNameMap;

/// Hourly key requested when the caller selects nothing.
pub const DEFAULT_HOURLY: &str = "temperature_2m";
/// Daily key requested when the caller selects nothing.
pub const DEFAULT_DAILY: &str = "temperature_2m_max";

/// A named place the archive can be queried for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// Endpoint and unit parameters appended to every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveSettings {
    pub base_url: String,
    pub temperature_unit: String,
    pub wind_speed_unit: String,
    pub precipitation_unit: String,
    pub timezone: String,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            base_url: "https://archive-api.open-meteo.com/v1/archive".into(),
            temperature_unit: "fahrenheit".into(),
            wind_speed_unit: "mph".into(),
            precipitation_unit: "inch".into(),
            timezone: "auto".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// One archive request in canonical keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hourly: Vec<String>,
    pub daily: Vec<String>,
}

impl ArchiveQuery {
    /// Resolve display labels through the name maps. Unknown labels are
    /// dropped; an empty selection falls back to the default variable.
    pub fn resolve(
        location: &Location,
        start_date: NaiveDate,
        end_date: NaiveDate,
        hourly_labels: &[String],
        daily_labels: &[String],
        hourly_map: &VariableNameMap,
        daily_map: &VariableNameMap,
    ) -> Self {
        Self {
            latitude: location.latitude,
            longitude: location.longitude,
            start_date,
            end_date,
            hourly: hourly_map.keys_for(hourly_labels),
            daily: daily_map.keys_for(daily_labels),
        }
    }

    pub fn url(&self, settings: &ArchiveSettings) -> String {
        let join = |keys: &[String], default: &str| {
            if keys.is_empty() {
                default.to_string()
            } else {
                keys.join(",")
            }
        };
        format!(
            "{}?latitude={}&longitude={}&start_date={}&end_date={}&hourly={}&daily={}\
             &temperature_unit={}&wind_speed_unit={}&precipitation_unit={}&timezone={}",
            settings.base_url,
            self.latitude,
            self.longitude,
            self.start_date.format("%Y-%m-%d"),
            self.end_date.format("%Y-%m-%d"),
            join(&self.hourly, DEFAULT_HOURLY),
            join(&self.daily, DEFAULT_DAILY),
            settings.temperature_unit,
            settings.wind_speed_unit,
            settings.precipitation_unit,
            settings.timezone,
        )
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// One block of the response: a shared `time` array plus one array per
/// variable, aligned by index.
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesBlock {
    pub time: Vec<JsonValue>,
    #[serde(flatten)]
    pub variables: serde_json::Map<String, JsonValue>,
}

/// The parts of an archive response the analysis uses.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchivePayload {
    #[serde(default)]
    pub hourly: Option<SeriesBlock>,
    #[serde(default)]
    pub daily: Option<SeriesBlock>,
}

impl ArchivePayload {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl SeriesBlock {
    /// Zip the variable arrays with `time` into records.
    ///
    /// # Errors
    /// [`Error::SourceFormat`] when a variable is not an array or its length
    /// differs from `time`; [`Error::EmptyDataset`] when no row survives.
    pub fn to_dataset(&self) -> Result<Normalized<Dataset>> {
        let mut columns: Vec<(&str, &Vec<JsonValue>)> = Vec::new();
        for (key, value) in &self.variables {
            let JsonValue::Array(items) = value else {
                return Err(Error::SourceFormat(format!("'{key}' is not an array")));
            };
            if items.len() != self.time.len() {
                return Err(Error::SourceFormat(format!(
                    "'{key}' has {} values but time has {}",
                    items.len(),
                    self.time.len()
                )));
            }
            columns.push((key, items));
        }

        let catalog = VariableCatalog::new(columns.iter().map(|(k, _)| k.to_string()))?;
        let mut builder = DatasetBuilder::new("time".into(), catalog, None);

        for (i, t) in self.time.iter().enumerate() {
            let row = i + 1;
            let Some(timestamp) = t.as_str().and_then(parse_timestamp) else {
                builder.skip(row, format!("unparseable timestamp {t}"));
                continue;
            };
            let values = columns
                .iter()
                .map(|(key, items)| match &items[i] {
                    JsonValue::Null => None,
                    JsonValue::Number(n) => n.as_f64().filter(|v| v.is_finite()),
                    other => {
                        builder.report(Diagnostic::NonNumericValue {
                            row,
                            variable: key.to_string(),
                            raw: other.to_string(),
                        });
                        None
                    }
                })
                .collect();
            builder.push(row, TimeSeriesRecord::new(timestamp, values));
        }

        builder.finish()
    }
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// Minimal response shape returned by a transport.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// The network fetch collaborator. Retries and timeouts belong here, not in
/// the analysis core.
pub trait ArchiveTransport {
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// Datasets decoded from one archive response.
#[derive(Debug, Clone, Default)]
pub struct WeatherData {
    pub hourly: Option<Normalized<Dataset>>,
    pub daily: Option<Normalized<Dataset>>,
}

/// Fetch and decode archive data through a transport.
pub struct WeatherClient<T> {
    transport: T,
    settings: ArchiveSettings,
}

impl<T: ArchiveTransport> WeatherClient<T> {
    pub fn new(transport: T, settings: ArchiveSettings) -> Self {
        Self { transport, settings }
    }

    /// # Errors
    /// [`Error::Network`] on a non-2xx status; decoding errors otherwise.
    pub fn fetch(&self, query: &ArchiveQuery) -> Result<WeatherData> {
        let url = query.url(&self.settings);
        log::info!("fetching weather archive: {url}");

        let response = self.transport.get(&url)?;
        if !(200..300).contains(&response.status) {
            return Err(Error::Network {
                status: response.status,
                url,
            });
        }

        let payload = ArchivePayload::from_slice(&response.body)?;
        Ok(WeatherData {
            hourly: payload.hourly.as_ref().map(SeriesBlock::to_dataset).transpose()?,
            daily: payload.daily.as_ref().map(SeriesBlock::to_dataset).transpose()?,
        })
    }
}
