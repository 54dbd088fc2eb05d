use std::f64::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Duration, NaiveDate};
use clap::Parser;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Write a synthetic hourly bike-rental table as CSV and Parquet.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of days to generate, starting 2011-01-01
    #[arg(long, default_value_t = 90)]
    days: u32,

    /// RNG seed; the same seed gives the same table
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Directory receiving bike_sample.csv and bike_sample.parquet
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

/// One generated row, with the public dataset's column names.
#[derive(Debug, Serialize)]
struct Row {
    dteday: String,
    season: i64,
    weathersit: i64,
    hr: i64,
    temp: f64,
    hum: f64,
    windspeed: f64,
    cnt: i64,
}

/// Winter = 1 … autumn = 4, by month.
fn season_of(date: NaiveDate) -> i64 {
    i64::from(date.month() % 12 / 3) + 1
}

/// Relative demand by hour: two commute peaks over a daytime plateau.
fn hourly_demand(hour: u32) -> f64 {
    let h = f64::from(hour);
    let bump = |centre: f64, width: f64| (-(h - centre).powi(2) / (2.0 * width * width)).exp();
    0.05 + 0.35 * bump(13.0, 4.0) + 0.9 * bump(8.0, 1.2) + bump(17.5, 1.5)
}

fn generate(days: u32, rng: &mut StdRng) -> Result<Vec<Row>> {
    let start = NaiveDate::from_ymd_opt(2011, 1, 1).context("start date")?;
    let mut rows = Vec::with_capacity(days as usize * 24);

    for offset in 0..days {
        let date = start + Duration::days(i64::from(offset));
        // Coldest mid-January, warmest mid-July.
        let yearly = -(2.0 * PI * (f64::from(date.ordinal()) - 15.0) / 365.0).cos();
        let daily_base = 15.0 + 12.0 * yearly + rng.gen_range(-3.0..3.0);
        let weather: i64 = match rng.gen_range(0..100) {
            0..=64 => 1,
            65..=89 => 2,
            90..=98 => 3,
            _ => 4,
        };
        let weather_factor = [1.0, 0.8, 0.45, 0.15][(weather - 1) as usize];

        for hour in 0..24u32 {
            let diurnal = -4.0 * (2.0 * PI * f64::from(hour) / 24.0).cos();
            let temp = daily_base + diurnal + rng.gen_range(-1.0..1.0);
            let hum = (60.0 + 10.0 * (weather as f64 - 1.0) + rng.gen_range(-25.0..25.0))
                .clamp(0.0, 100.0);
            let windspeed = (rng.gen_range(0.0..1.0_f64).powi(2) * 35.0).min(57.0);
            let comfort = 1.0 - ((temp - 24.0).abs() / 30.0).min(0.8);
            let mean = 600.0 * hourly_demand(hour) * weather_factor * comfort;
            let cnt = (mean * rng.gen_range(0.7..1.3)).round().max(0.0) as i64;

            rows.push(Row {
                dteday: date.format("%Y-%m-%d").to_string(),
                season: season_of(date),
                weathersit: weather,
                hr: i64::from(hour),
                temp: (temp * 100.0).round() / 100.0,
                hum: hum.round(),
                windspeed: (windspeed * 10_000.0).round() / 10_000.0,
                cnt,
            });
        }
    }
    Ok(rows)
}

fn write_csv(rows: &[Row], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(rows: &[Row], path: &Path) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("dteday", DataType::Utf8, false),
        Field::new("season", DataType::Int64, false),
        Field::new("weathersit", DataType::Int64, false),
        Field::new("hr", DataType::Int64, false),
        Field::new("temp", DataType::Float64, false),
        Field::new("hum", DataType::Float64, false),
        Field::new("windspeed", DataType::Float64, false),
        Field::new("cnt", DataType::Int64, false),
    ]));

    let ints = |f: fn(&Row) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from_iter_values(rows.iter().map(f)))
    };
    let floats = |f: fn(&Row) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from_iter_values(rows.iter().map(f)))
    };
    let dates: ArrayRef = Arc::new(StringArray::from_iter_values(
        rows.iter().map(|r| r.dteday.as_str()),
    ));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            dates,
            ints(|r| r.season),
            ints(|r| r.weathersit),
            ints(|r| r.hr),
            floats(|r| r.temp),
            floats(|r| r.hum),
            floats(|r| r.windspeed),
            ints(|r| r.cnt),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut rng = StdRng::seed_from_u64(args.seed);
    let rows = generate(args.days, &mut rng)?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    let csv_path = args.out_dir.join("bike_sample.csv");
    let parquet_path = args.out_dir.join("bike_sample.parquet");
    write_csv(&rows, &csv_path)?;
    write_parquet(&rows, &parquet_path)?;

    log::info!(
        "Wrote {} hourly rows ({} days) to {} and {}",
        rows.len(),
        args.days,
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
