//! Write a synthetic sensor log (`sample_sensor.csv`) for trying the CLI.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use weather_insight::data::export::to_csv;
use weather_insight::data::loader::{NormalizeOptions, normalize_csv};

/// Daily cycle: mean + amplitude * sin(2π·hour/24 + phase).
fn diurnal(hour: f64, mean: f64, amplitude: f64, phase: f64) -> f64 {
    mean + amplitude * (2.0 * std::f64::consts::PI * hour / 24.0 + phase).sin()
}

/// Deterministic SplitMix64 stream.
struct Noise(u64);

impl Noise {
    fn unit(&mut self) -> f64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        (z >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Normal deviate by the Marsaglia polar method.
    fn normal(&mut self, sigma: f64) -> f64 {
        loop {
            let u = 2.0 * self.unit() - 1.0;
            let v = 2.0 * self.unit() - 1.0;
            let s = u * u + v * v;
            if s > 0.0 && s < 1.0 {
                return sigma * u * (-2.0 * s.ln() / s).sqrt();
            }
        }
    }
}

const COLUMNS: [&str; 7] = [
    "Temperature",
    "Ext.Temperature",
    "Humidity",
    "Ext.Humidity",
    "CO2",
    "pH",
    "Salinity",
];

fn main() -> Result<()> {
    env_logger::init();
    let mut noise = Noise(42);

    let start = NaiveDate::from_ymd_opt(2024, 11, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid start date")?;
    let days: i64 = 7;

    let mut text = format!("Date,{}\n", COLUMNS.join(","));
    for step in 0..days * 24 * 4 {
        let at = start + Duration::minutes(15 * step);
        let hour = step as f64 / 4.0;

        let temp = diurnal(hour, 24.0, 2.5, 0.0) + noise.normal(0.2);
        let ext_temp = diurnal(hour, 26.0, 4.0, -0.3) + noise.normal(0.4);
        let humidity = diurnal(hour, 70.0, -8.0, 0.0) + noise.normal(1.0);
        let ext_humidity = diurnal(hour, 75.0, -12.0, -0.3) + noise.normal(1.5);
        // Respiration pushes CO2 up at night; pH follows it down.
        let co2 = diurnal(hour, 420.0, -35.0, 0.0) + noise.normal(5.0);
        let ph = 8.1 - (co2 - 420.0) * 0.002 + noise.normal(0.01);
        let salinity = 35.0 + noise.normal(0.05);

        // Drop the odd reading like a real logger does.
        let fields: Vec<String> = [temp, ext_temp, humidity, ext_humidity, co2, ph, salinity]
            .iter()
            .map(|v| {
                if noise.unit() < 0.01 {
                    String::new()
                } else {
                    format!("{v:.3}")
                }
            })
            .collect();
        text.push_str(&format!("{},{}\n", at.format("%Y-%m-%d %H:%M:%S"), fields.join(",")));
    }

    let dataset = normalize_csv(&text, &NormalizeOptions::full())?.value;
    let output_path = "sample_sensor.csv";
    std::fs::write(output_path, to_csv(&dataset, None)?)
        .with_context(|| format!("failed to write {output_path}"))?;

    println!(
        "Wrote {} readings of {} variables to {output_path}",
        dataset.len(),
        dataset.catalog().len()
    );
    Ok(())
}
