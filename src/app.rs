use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;

use crate::analysis::correlation::{check_pair, correlate};
use crate::analysis::report::{correlation_text, summary_table};
use crate::analysis::stats::summarize;
use crate::config::Config;
use crate::data::export::to_csv;
use crate::data::filter::TimeRange;
use crate::data::loader::{Loaded, NormalizeOptions, SourceKind, load_file, normalize};
use crate::data::model::{Dataset, Diagnostic, Normalized};
use crate::state::Session;
use crate::weather::ArchiveQuery;

// ---------------------------------------------------------------------------
// Command-line application
// ---------------------------------------------------------------------------

/// Optional window and sheet selection shared by the analysis commands.
#[derive(Debug, Clone, Default)]
pub struct Window {
    pub start: Option<String>,
    pub end: Option<String>,
    pub sheet: Option<String>,
}

/// Drives one dashboard session from the command line.
pub struct App {
    pub config: Config,
    pub state: Session,
    /// Time column and sensor-log choice applied to every load. The row
    /// limit is set per command.
    pub source: NormalizeOptions,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: Session::default(),
            source: NormalizeOptions::full(),
        }
    }

    pub fn with_source(mut self, source: NormalizeOptions) -> Self {
        self.source = source;
        self
    }

    /// Load a file into the session (full ingestion).
    pub fn open(&mut self, path: &Path) -> Result<()> {
        let kind = SourceKind::from_path(path)?;
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;

        let id = self.state.begin_load();
        let result = normalize(&bytes, kind, &self.source.clone().with_row_limit(None));
        self.state.finish_load(id, result);

        if let Some(msg) = &self.state.status_message {
            bail!("failed to load {}: {msg}", path.display());
        }
        report_diagnostics(&self.state.diagnostics);
        Ok(())
    }

    /// First rows of every sheet, as CSV.
    pub fn preview(&self, path: &Path) -> Result<String> {
        let options = self.source.clone().with_row_limit(Some(self.config.preview_rows));
        let out = load_file(path, &options)?;
        report_diagnostics(&out.diagnostics);

        let mut text = String::new();
        match &out.value {
            Loaded::Single(ds) => text.push_str(&to_csv(ds, None)?),
            Loaded::Workbook(set) => {
                for (name, ds) in set.iter() {
                    text.push_str(&format!("# sheet: {name}\n{}\n", to_csv(ds, None)?));
                }
            }
        }
        Ok(text)
    }

    /// Summary statistics table for the selected variables (all when empty).
    pub fn stats(&mut self, path: &Path, variables: &[String], window: &Window) -> Result<String> {
        self.open(path)?;
        let view = self.view(variables, window)?;
        let keys = view.value.catalog().keys().to_vec();
        Ok(summary_table(&summarize(&view.value, &keys)))
    }

    /// Correlation of two variables given as keys or labels. A label and
    /// its own key count as the same variable.
    pub fn correlate(&mut self, path: &Path, x: &str, y: &str, window: &Window) -> Result<String> {
        self.open(path)?;
        let (x, y) = match self.state.dataset() {
            Some(ds) => (self.resolve_variable(ds, x), self.resolve_variable(ds, y)),
            None => (x.to_string(), y.to_string()),
        };
        check_pair(Some(x.as_str()), Some(y.as_str()))?;

        let view = self.view(&[x.clone(), y.clone()], window)?;
        let result = correlate(&view.value, Some(x.as_str()), Some(y.as_str()))?;
        Ok(correlation_text(&result))
    }

    /// CSV text of the filtered window, headed with display labels when the
    /// configured maps know the keys.
    pub fn export(&mut self, path: &Path, variables: &[String], window: &Window, labels: bool) -> Result<String> {
        self.open(path)?;
        let view = self.view(variables, window)?;
        let map = labels.then(|| self.label_map(&view.value));
        Ok(to_csv(&view.value, map)?)
    }

    /// Archive URL for a location, date range and label selections.
    pub fn query_url(
        &self,
        location: &str,
        start: NaiveDate,
        end: NaiveDate,
        hourly: &[String],
        daily: &[String],
    ) -> Result<String> {
        let location = self.config.location(location)?;
        let query = ArchiveQuery::resolve(
            location,
            start,
            end,
            hourly,
            daily,
            &self.config.hourly_variables,
            &self.config.daily_variables,
        );
        Ok(query.url(&self.config.archive))
    }

    /// Apply sheet, window and variable selection to the loaded data.
    fn view(&mut self, variables: &[String], window: &Window) -> Result<Normalized<Dataset>> {
        if let Some(sheet) = &window.sheet {
            if !self.state.select_sheet(sheet) {
                bail!("no sheet named '{sheet}'");
            }
        }
        let ds = self.state.dataset().ok_or_else(|| anyhow!("no dataset loaded"))?;

        let keys: Vec<String> = if variables.is_empty() {
            ds.catalog().keys().to_vec()
        } else {
            variables.iter().map(|v| self.resolve_variable(ds, v)).collect()
        };

        let covering = TimeRange::covering(ds).ok_or_else(|| anyhow!("dataset is empty"))?;
        let start = match &window.start {
            Some(s) => TimeRange::parse(s, s)?.start,
            None => covering.start,
        };
        let end = match &window.end {
            Some(e) => TimeRange::parse(e, e)?.end,
            None => covering.end,
        };
        self.state.range = Some(TimeRange::new(start, end));
        self.state.variables = keys;

        let view = self
            .state
            .filtered()
            .ok_or_else(|| anyhow!("no dataset loaded"))??;
        report_diagnostics(&view.diagnostics);
        log::info!("window holds {} record(s)", view.value.len());
        Ok(view)
    }

    /// Accept either a canonical key or a display label.
    fn resolve_variable(&self, ds: &Dataset, name: &str) -> String {
        if ds.catalog().contains(name) {
            return name.to_string();
        }
        [
            &self.config.hourly_variables,
            &self.config.daily_variables,
            &self.config.sensor_variables,
        ]
        .iter()
        .filter_map(|map| map.key_for(name))
        .find(|key| ds.catalog().contains(key))
        .unwrap_or(name)
        .to_string()
    }

    /// The configured map whose keys cover most of the dataset's columns.
    fn label_map(&self, ds: &Dataset) -> &crate::variables::VariableNameMap {
        let hits = |map: &crate::variables::VariableNameMap| {
            ds.catalog()
                .keys()
                .iter()
                .filter(|k| map.label_for(k).is_some())
                .count()
        };
        [
            &self.config.hourly_variables,
            &self.config.daily_variables,
            &self.config.sensor_variables,
        ]
        .into_iter()
        .max_by_key(|map| hits(*map))
        .unwrap_or(&self.config.sensor_variables)
    }
}

fn report_diagnostics(diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        log::warn!("{d}");
    }
}
