use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Bidirectional map between display labels and canonical variable keys.
///
/// Owned by the calling domain (weather or sensor); the analysis core only
/// ever sees canonical keys.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<(String, String)>", into = "Vec<(String, String)>")]
pub struct VariableNameMap {
    entries: Vec<(String, String)>,
}

impl VariableNameMap {
    /// Build from `(label, key)` pairs. Labels and keys must both be unique.
    pub fn new<I, L, K>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (L, K)>,
        L: Into<String>,
        K: Into<String>,
    {
        let mut entries: Vec<(String, String)> = Vec::new();
        for (label, key) in pairs {
            let (label, key) = (label.into(), key.into());
            if entries.iter().any(|(l, k)| *l == label || *k == key) {
                return Err(Error::SourceFormat(format!(
                    "variable map entry '{label}' -> '{key}' is not one-to-one"
                )));
            }
            entries.push((label, key));
        }
        Ok(Self { entries })
    }

    /// Labels map to themselves, as sensor logs already use readable headers.
    pub fn identity<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(keys.into_iter().map(|k| {
            let k: String = k.into();
            (k.clone(), k)
        }))
    }

    pub fn key_for(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, k)| k.as_str())
    }

    pub fn label_for(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, k)| k == key)
            .map(|(l, _)| l.as_str())
    }

    /// Translate labels to keys, silently dropping unknown labels.
    pub fn keys_for<S: AsRef<str>>(&self, labels: &[S]) -> Vec<String> {
        labels
            .iter()
            .filter_map(|l| self.key_for(l.as_ref()))
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hourly variables offered by the weather archive.
    pub fn hourly_weather() -> Self {
        Self::from_static(&[
            ("Temperature", "temperature_2m"),
            ("Humidity", "relative_humidity_2m"),
            ("Precipitation", "precipitation"),
            ("Pressure", "pressure_msl"),
            ("Cloud Cover", "cloud_cover"),
            ("Low Cloud Cover", "cloud_cover_low"),
            ("Mid Cloud Cover", "cloud_cover_mid"),
            ("High Cloud Cover", "cloud_cover_high"),
            ("Evapotranspiration", "et0_fao_evapotranspiration"),
            ("Wind Speed", "wind_speed_10m"),
            ("Wind Direction", "wind_direction_10m"),
            ("Wind Gusts", "wind_gusts_10m"),
            ("Shortwave Radiation (Instant)", "shortwave_radiation_instant"),
            ("Diffuse Radiation", "diffuse_radiation_instant"),
        ])
    }

    /// Daily aggregates offered by the weather archive.
    pub fn daily_weather() -> Self {
        Self::from_static(&[
            ("Max Temperature", "temperature_2m_max"),
            ("Min Temperature", "temperature_2m_min"),
            ("Mean Temperature", "temperature_2m_mean"),
            ("Daylight Duration", "daylight_duration"),
            ("Sunshine Duration", "sunshine_duration"),
            ("Precipitation Hours", "precipitation_hours"),
            ("Shortwave Radiation (Sum)", "shortwave_radiation_sum"),
        ])
    }

    /// Columns of the fixed sensor-log workbook.
    pub fn sensor() -> Self {
        Self::from_static(&[
            ("Temperature", "Temperature"),
            ("Ext.Temperature", "Ext.Temperature"),
            ("Humidity", "Humidity"),
            ("Ext.Humidity", "Ext.Humidity"),
            ("CO2", "CO2"),
            ("pH", "pH"),
            ("Salinity", "Salinity"),
        ])
    }

    fn from_static(pairs: &[(&str, &str)]) -> Self {
        Self {
            entries: pairs
                .iter()
                .map(|(l, k)| (l.to_string(), k.to_string()))
                .collect(),
        }
    }
}

impl TryFrom<Vec<(String, String)>> for VariableNameMap {
    type Error = Error;

    fn try_from(pairs: Vec<(String, String)>) -> Result<Self> {
        Self::new(pairs)
    }
}

impl From<VariableNameMap> for Vec<(String, String)> {
    fn from(map: VariableNameMap) -> Self {
        map.entries
    }
}
