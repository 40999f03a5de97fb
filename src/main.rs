use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use weather_insight::app::{App, Window};
use weather_insight::config::Config;
use weather_insight::data::loader::NormalizeOptions;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML configuration; built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Header of the timestamp column, instead of detecting it.
    #[arg(long, global = true)]
    time_column: Option<String>,

    /// Read input as a sensor log: first sheet only, time in "Date".
    #[arg(long, global = true)]
    sensor_log: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct WindowArgs {
    /// Window start (inclusive), e.g. 2024-09-01 or 2024-09-01T06:00.
    #[arg(long)]
    start: Option<String>,

    /// Window end (inclusive).
    #[arg(long)]
    end: Option<String>,

    /// Worksheet to analyze instead of the first one.
    #[arg(long)]
    sheet: Option<String>,
}

impl From<WindowArgs> for Window {
    fn from(args: WindowArgs) -> Self {
        Self {
            start: args.start,
            end: args.end,
            sheet: args.sheet,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the first rows of every sheet.
    Preview { file: PathBuf },

    /// Summary statistics per variable.
    Stats {
        file: PathBuf,

        /// Variables (keys or labels); all when omitted.
        #[arg(long, value_delimiter = ',')]
        vars: Vec<String>,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Pearson correlation and least-squares fit of two variables.
    Correlate {
        file: PathBuf,

        #[arg(long)]
        x: String,

        #[arg(long)]
        y: String,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Write the filtered window as CSV.
    Export {
        file: PathBuf,

        #[arg(long, value_delimiter = ',')]
        vars: Vec<String>,

        #[command(flatten)]
        window: WindowArgs,

        /// Keep canonical keys in the header instead of display labels.
        #[arg(long)]
        raw_keys: bool,

        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the weather archive URL for a location and date range.
    Query {
        #[arg(long)]
        location: String,

        #[arg(long)]
        start: NaiveDate,

        #[arg(long)]
        end: NaiveDate,

        /// Hourly variable labels.
        #[arg(long, value_delimiter = ',')]
        hourly: Vec<String>,

        /// Daily variable labels.
        #[arg(long, value_delimiter = ',')]
        daily: Vec<String>,
    },
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = Cli::parse();
    log::debug!("{args:#?}");

    let config = match &args.config {
        Some(path) => Config::from_file(path).context("failed to load config")?,
        None => Config::default(),
    };
    let mut source = NormalizeOptions::full();
    if let Some(column) = &args.time_column {
        source = source.with_time_column(column);
    }
    if args.sensor_log {
        source = source.as_sensor_log();
    }
    let mut app = App::new(config).with_source(source);

    let output = match args.command {
        Command::Preview { file } => app.preview(&file)?,
        Command::Stats { file, vars, window } => app.stats(&file, &vars, &window.into())?,
        Command::Correlate { file, x, y, window } => app.correlate(&file, &x, &y, &window.into())?,
        Command::Export {
            file,
            vars,
            window,
            raw_keys,
            out,
        } => {
            let csv = app.export(&file, &vars, &window.into(), !raw_keys)?;
            if let Some(out) = out {
                std::fs::write(&out, csv).with_context(|| format!("failed to write {out:?}"))?;
                log::info!("exported to {out:?}");
                return Ok(());
            }
            csv
        }
        Command::Query {
            location,
            start,
            end,
            hourly,
            daily,
        } => app.query_url(&location, start, end, &hourly, &daily)?,
    };

    println!("{output}");
    Ok(())
}
