use std::fmt;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

use super::model::{Column, Dataset, Record};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the rental table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row; `date` (or `dteday`), `season`, `weathersit`,
///   `hr`, `temp`, `hum`, `windspeed`, `cnt`. Other columns are ignored.
/// * `.json`    – `[{ "dteday": "2011-01-01", "season": 1, ... }, ...]`
/// * `.parquet` – the same columns, as written by Pandas or Polars
///
/// Any unreadable row aborts the whole load.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    let dataset = Dataset::from_records(records);
    match (dataset.min_date(), dataset.max_date()) {
        (Some(lo), Some(hi)) => {
            log::info!("Loaded {} records spanning {lo} .. {hi}", dataset.len())
        }
        _ => log::warn!("{} contains no records", path.display()),
    }
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Row-oriented formats (CSV, JSON)
// ---------------------------------------------------------------------------

/// One input row before validation.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(alias = "dteday")]
    date: DateCell,
    season: i64,
    #[serde(rename = "weathersit")]
    weather_condition: i64,
    #[serde(rename = "hr")]
    hour_of_day: u8,
    #[serde(rename = "temp")]
    temperature: f64,
    #[serde(rename = "hum")]
    humidity: f64,
    windspeed: f64,
    #[serde(rename = "cnt")]
    rental_count: u64,
}

impl From<RawRecord> for Record {
    fn from(raw: RawRecord) -> Self {
        Record {
            date: raw.date.0,
            season: raw.season,
            weather_condition: raw.weather_condition,
            hour_of_day: raw.hour_of_day,
            temperature: raw.temperature,
            humidity: raw.humidity,
            windspeed: raw.windspeed,
            rental_count: raw.rental_count,
        }
    }
}

/// A date given either as text or, as Pandas writes datetimes to JSON, as
/// epoch milliseconds.
#[derive(Debug)]
struct DateCell(NaiveDate);

impl<'de> Deserialize<'de> for DateCell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct DateVisitor;

        impl Visitor<'_> for DateVisitor {
            type Value = DateCell;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a YYYY-MM-DD date or epoch milliseconds")
            }

            fn visit_str<E: de::Error>(self, s: &str) -> std::result::Result<DateCell, E> {
                parse_date(s)
                    .map(DateCell)
                    .ok_or_else(|| E::custom(format!("unparsable date '{s}'")))
            }

            fn visit_i64<E: de::Error>(self, ms: i64) -> std::result::Result<DateCell, E> {
                DateTime::from_timestamp_millis(ms)
                    .map(|dt| DateCell(dt.date_naive()))
                    .ok_or_else(|| E::custom(format!("timestamp {ms} out of range")))
            }

            fn visit_u64<E: de::Error>(self, ms: u64) -> std::result::Result<DateCell, E> {
                let ms = i64::try_from(ms)
                    .map_err(|_| E::custom(format!("timestamp {ms} out of range")))?;
                self.visit_i64(ms)
            }
        }

        deserializer.deserialize_any(DateVisitor)
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time of day.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn load_csv(path: &Path) -> Result<Vec<Record>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let mut records = Vec::new();
    for (row_no, result) in reader.deserialize::<RawRecord>().enumerate() {
        let raw = result.with_context(|| format!("CSV row {row_no}"))?;
        records.push(raw.into());
    }
    Ok(records)
}

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
fn load_json(path: &Path) -> Result<Vec<Record>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let rows: Vec<RawRecord> = serde_json::from_str(&text).context("parsing JSON")?;
    Ok(rows.into_iter().map(Record::from).collect())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Header names accepted for a column.
fn header_names(column: Column) -> &'static [&'static str] {
    match column {
        Column::Date => &["date", "dteday"],
        Column::Season => &["season"],
        Column::WeatherCondition => &["weathersit"],
        Column::HourOfDay => &["hr"],
        Column::Temperature => &["temp"],
        Column::Humidity => &["hum"],
        Column::Windspeed => &["windspeed"],
        Column::RentalCount => &["cnt"],
    }
}

/// Locate `column` in the batch and cast it to `to`.
/// Values that fail the cast become nulls and are reported per row later.
fn cast_column(batch: &RecordBatch, column: Column, to: &DataType) -> Result<ArrayRef> {
    let schema = batch.schema();
    let idx = header_names(column)
        .iter()
        .find_map(|name| schema.index_of(name).ok())
        .with_context(|| format!("Parquet file missing '{column}' column"))?;
    cast(batch.column(idx), to).with_context(|| format!("column '{column}' as {to}"))
}

/// Load a Parquet file holding the rental table.
///
/// Numeric columns may be any integer or float type; the date may be a
/// string, Date32/Date64 or a timestamp.
fn load_parquet(path: &Path) -> Result<Vec<Record>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let offset = records.len();

        let dates = cast_column(&batch, Column::Date, &DataType::Date32)?;
        let dates = dates
            .as_primitive_opt::<Date32Type>()
            .context("expected Date32 array")?;

        let mut ints = Vec::new();
        for column in [
            Column::Season,
            Column::WeatherCondition,
            Column::HourOfDay,
            Column::RentalCount,
        ] {
            ints.push((column, cast_column(&batch, column, &DataType::Int64)?));
        }
        let mut floats = Vec::new();
        for column in [Column::Temperature, Column::Humidity, Column::Windspeed] {
            floats.push((column, cast_column(&batch, column, &DataType::Float64)?));
        }

        let int_at = |i: usize, row: usize| -> Result<i64> {
            let (column, arr) = &ints[i];
            let arr = arr
                .as_primitive_opt::<Int64Type>()
                .context("expected Int64 array")?;
            if arr.is_null(row) {
                bail!("row {}: missing or invalid '{column}'", offset + row);
            }
            Ok(arr.value(row))
        };
        let float_at = |i: usize, row: usize| -> Result<f64> {
            let (column, arr) = &floats[i];
            let arr = arr
                .as_primitive_opt::<Float64Type>()
                .context("expected Float64 array")?;
            if arr.is_null(row) {
                bail!("row {}: missing or invalid '{column}'", offset + row);
            }
            Ok(arr.value(row))
        };

        for row in 0..batch.num_rows() {
            let date = if dates.is_null(row) {
                None
            } else {
                dates.value_as_date(row)
            };
            let date = date
                .with_context(|| format!("row {}: missing or unparsable date", offset + row))?;

            let hour = int_at(2, row)?;
            let count = int_at(3, row)?;
            records.push(Record {
                date,
                season: int_at(0, row)?,
                weather_condition: int_at(1, row)?,
                hour_of_day: u8::try_from(hour)
                    .with_context(|| format!("row {}: hr {hour} out of range", offset + row))?,
                temperature: float_at(0, row)?,
                humidity: float_at(1, row)?,
                windspeed: float_at(2, row)?,
                rental_count: u64::try_from(count)
                    .with_context(|| format!("row {}: negative cnt {count}", offset + row))?,
            });
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int32Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;
    use tempfile::tempdir;

    use super::*;

    const HEADER: &str = "instant,dteday,season,yr,mnth,hr,holiday,weathersit,temp,hum,windspeed,cnt";

    fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_csv_with_extra_columns() {
        let dir = tempdir().unwrap();
        let body = format!(
            "{HEADER}\n1,2011-01-01,1,0,1,0,0,1,9.84,81,0,16\n2,2011-01-02,1,0,1,1,0,2,9.02,80,6.0032,40\n"
        );
        let ds = load_file(&write(dir.path(), "hour.csv", &body)).unwrap();

        assert_eq!(ds.len(), 2);
        let first = &ds.records()[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2011, 1, 1).unwrap());
        assert_eq!(first.weather_condition, 1);
        assert_eq!(first.temperature, 9.84);
        assert_eq!(first.rental_count, 16);
        assert_eq!(ds.records()[1].windspeed, 6.0032);
        assert_eq!(ds.max_date(), NaiveDate::from_ymd_opt(2011, 1, 2));
    }

    #[test]
    fn accepts_plain_date_header_and_datetime_text() {
        let dir = tempdir().unwrap();
        let body = "date,season,weathersit,hr,temp,hum,windspeed,cnt\n\
                    2012-06-30 00:00:00,3,1,14,30.5,40,12,321\n";
        let ds = load_file(&write(dir.path(), "data.CSV", body)).unwrap();
        assert_eq!(ds.records()[0].date, NaiveDate::from_ymd_opt(2012, 6, 30).unwrap());
        assert_eq!(ds.records()[0].hour_of_day, 14);
    }

    #[test]
    fn bad_date_aborts_the_load() {
        let dir = tempdir().unwrap();
        let body = format!("{HEADER}\n1,2011-01-01,1,0,1,0,0,1,9.84,81,0,16\n2,not-a-date,1,0,1,1,0,1,9.0,80,0,40\n");
        let err = load_file(&write(dir.path(), "hour.csv", &body)).unwrap_err();
        assert!(format!("{err:#}").contains("CSV row 1"), "{err:#}");
    }

    #[test]
    fn missing_column_is_an_error() {
        let dir = tempdir().unwrap();
        let body = "dteday,season,weathersit,hr,temp,hum,windspeed\n2011-01-01,1,1,0,9.84,81,0\n";
        assert!(load_file(&write(dir.path(), "hour.csv", body)).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(load_file(&dir.path().join("absent.csv")).is_err());
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempdir().unwrap();
        let err = load_file(&write(dir.path(), "hour.xlsx", "")).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension"));
    }

    #[test]
    fn loads_json_records_with_epoch_millis() {
        let dir = tempdir().unwrap();
        let body = r#"[
            {"dteday": 1293840000000, "season": 1, "weathersit": 2, "hr": 5,
             "temp": 9.84, "hum": 75, "windspeed": 0.0, "cnt": 1},
            {"dteday": "2011-01-02", "season": 1, "weathersit": 1, "hr": 6,
             "temp": 10.0, "hum": 70.5, "windspeed": 3.5, "cnt": 12}
        ]"#;
        let ds = load_file(&write(dir.path(), "hour.json", body)).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[0].date, NaiveDate::from_ymd_opt(2011, 1, 1).unwrap());
        assert_eq!(ds.records()[0].humidity, 75.0);
        assert_eq!(ds.records()[1].date, NaiveDate::from_ymd_opt(2011, 1, 2).unwrap());
    }

    #[test]
    fn loads_parquet_with_mixed_numeric_types() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hour.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("dteday", DataType::Utf8, false),
            Field::new("season", DataType::Int32, false),
            Field::new("weathersit", DataType::Int64, false),
            Field::new("hr", DataType::Int64, false),
            Field::new("temp", DataType::Float64, false),
            Field::new("hum", DataType::Int64, false),
            Field::new("windspeed", DataType::Float64, false),
            Field::new("cnt", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["2011-01-01", "2011-01-03"])),
                Arc::new(Int32Array::from(vec![1, 1])),
                Arc::new(Int64Array::from(vec![1, 3])),
                Arc::new(Int64Array::from(vec![0, 23])),
                Arc::new(Float64Array::from(vec![9.84, 12.5])),
                Arc::new(Int64Array::from(vec![81, 60])),
                Arc::new(Float64Array::from(vec![0.0, 16.9])),
                Arc::new(Int64Array::from(vec![16, 90])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        let last = &ds.records()[1];
        assert_eq!(last.date, NaiveDate::from_ymd_opt(2011, 1, 3).unwrap());
        assert_eq!(last.hour_of_day, 23);
        assert_eq!(last.weather_condition, 3);
        assert_eq!(last.humidity, 60.0);
        assert_eq!(last.rental_count, 90);
    }

    #[test]
    fn parse_date_variants() {
        let d = NaiveDate::from_ymd_opt(2011, 12, 31);
        assert_eq!(parse_date("2011-12-31"), d);
        assert_eq!(parse_date(" 2011-12-31 "), d);
        assert_eq!(parse_date("2011-12-31T08:00:00"), d);
        assert_eq!(parse_date("31/12/2011"), None);
    }
}
