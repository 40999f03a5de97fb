use std::fmt::Debug;
use std::ops::RangeBounds;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::data::loader::PREVIEW_ROWS;
use crate::error::Error;
use crate::variables::VariableNameMap;
use crate::weather::{ArchiveSettings, Location};

/// Runtime configuration.
///
/// Every field has a built-in default, so a TOML file only needs the parts
/// it overrides. See [`Config::from_file`] for loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Places the weather archive can be queried for.
    pub locations: Vec<Location>,

    /// Archive endpoint and units.
    pub archive: ArchiveSettings,

    /// Display label ↔ canonical key maps.
    pub hourly_variables: VariableNameMap,
    pub daily_variables: VariableNameMap,
    pub sensor_variables: VariableNameMap,

    /// Row cap used by previews.
    pub preview_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locations: vec![
                Location::new("Pearl Harbor", 21.3448, -157.9774),
                Location::new("Kaneohe", 21.4505, -157.768),
                Location::new("Makapu'u", 21.3108, -157.6492),
            ],
            archive: ArchiveSettings::default(),
            hourly_variables: VariableNameMap::hourly_weather(),
            daily_variables: VariableNameMap::daily_weather(),
            sensor_variables: VariableNameMap::sensor(),
            preview_rows: PREVIEW_ROWS,
        }
    }
}

impl Config {
    /// Load a [`Config`] from a TOML file and validate it.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if a value
    /// is out of range.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let text = std::fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&text).with_context(|| format!("invalid config {file:?}"))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).context("failed to deserialize config")?;
        config.validate().context("failed to validate config")?;
        Ok(config)
    }

    /// Find a location by exact name.
    pub fn location(&self, name: &str) -> crate::error::Result<&Location> {
        self.locations
            .iter()
            .find(|l| l.name == name)
            .ok_or_else(|| Error::UnknownLocation(name.to_string()))
    }

    fn validate(&self) -> Result<()> {
        for loc in &self.locations {
            if loc.name.trim().is_empty() {
                bail!("location with blank name");
            }
            check_num(loc.latitude, -90.0..=90.0)
                .with_context(|| format!("invalid latitude for {}", loc.name))?;
            check_num(loc.longitude, -180.0..=180.0)
                .with_context(|| format!("invalid longitude for {}", loc.name))?;
        }
        check_num(self.preview_rows, 1..=10_000).context("invalid preview row count")?;
        if self.archive.base_url.trim().is_empty() {
            bail!("archive base URL is empty");
        }
        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("{num:?} must be in the range {range:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.locations.len(), 3);
        assert_eq!(config.preview_rows, 10);
    }

    #[test]
    fn overrides_and_maps() {
        let text = r#"
            preview_rows = 5
            sensor_variables = [["Water Temp", "wt"], ["Salinity", "sal"]]

            [[locations]]
            name = "Hilo"
            latitude = 19.7
            longitude = -155.08

            [archive]
            temperature_unit = "celsius"
        "#;
        let config = Config::from_toml(text).unwrap();
        assert_eq!(config.preview_rows, 5);
        assert_eq!(config.location("Hilo").unwrap().latitude, 19.7);
        assert_eq!(config.sensor_variables.key_for("Water Temp"), Some("wt"));
        assert_eq!(config.archive.temperature_unit, "celsius");
        assert_eq!(config.archive.wind_speed_unit, "mph");
        assert!(matches!(config.location("Kaneohe"), Err(Error::UnknownLocation(_))));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::from_toml("[[locations]]\nname = \"X\"\nlatitude = 91.0\nlongitude = 0.0\n").is_err());
        assert!(Config::from_toml("preview_rows = 0").is_err());
        assert!(Config::from_toml("daily_variables = [[\"A\", \"a\"], [\"B\", \"a\"]]").is_err());
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "preview_rows = 3\n").unwrap();
        assert_eq!(Config::from_file(&path).unwrap().preview_rows, 3);
        assert!(Config::from_file(dir.path().join("missing.toml")).is_err());
    }
}
