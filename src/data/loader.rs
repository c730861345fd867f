use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray, StringArray,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{AgeGroup, Observation, SeriesKey, Sex, TransitionDataset};
use crate::config::{MIN_YEAR, OBSERVATION_DAY};

const YEAR: &str = "year";
const MONTH: &str = "month";
const SEX: &str = "sex";
const AGE_GROUP: &str = "age_group";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the transition-rate table from a file.  Dispatch by extension.
///
/// Every format carries the identifying columns `year`, `month`, `sex`,
/// `age_group` plus any number of value columns named `C`, `C_sa`, `rate_C`,
/// `rate_C_sa` for a transition code `C`. Rows before [`MIN_YEAR`] are
/// dropped and the rest sorted by date.
///
/// Supported formats:
/// * `.csv`     – one row per observation
/// * `.json`    – `[{ "year": 1990, "month": 1, "sex": "f", ... }, ...]`
/// * `.parquet` – flat numeric / string columns
pub fn load_file(path: &Path) -> Result<TransitionDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Builds the date and drops rows before the cutoff year.
fn observation(year: i64, month: i64, sex: Sex, age_group: AgeGroup, values: Vec<f64>) -> Result<Option<Observation>> {
    let year = i32::try_from(year).with_context(|| format!("year {year} out of range"))?;
    if year < MIN_YEAR {
        return Ok(None);
    }
    let month = u32::try_from(month).with_context(|| format!("month {month} out of range"))?;
    let date = NaiveDate::from_ymd_opt(year, month, OBSERVATION_DAY)
        .with_context(|| format!("invalid year/month {year}-{month}"))?;
    Ok(Some(Observation {
        date,
        sex,
        age_group,
        values,
    }))
}

fn is_identifier(name: &str) -> bool {
    matches!(name, YEAR | MONTH | SEX | AGE_GROUP)
}

/// Split column names into value columns (by position) and ignored ones.
fn value_columns<'a>(names: impl Iterator<Item = &'a str>) -> Vec<(usize, String)> {
    names
        .enumerate()
        .filter(|(_, name)| {
            if is_identifier(name) {
                return false;
            }
            let known = SeriesKey::parse_column(name).is_some();
            if !known {
                log::debug!("Ignoring column '{name}'");
            }
            known
        })
        .map(|(i, name)| (i, name.to_string()))
        .collect()
}

/// Integers may arrive as `1990` or `1990.0`.
fn parse_whole(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>().ok().or_else(|| {
        let f = s.parse::<f64>().ok()?;
        (f.fract() == 0.0).then_some(f as i64)
    })
}

fn parse_value(s: &str) -> Result<f64> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("na") || s.eq_ignore_ascii_case("null") {
        return Ok(f64::NAN);
    }
    s.parse::<f64>().with_context(|| format!("'{s}' is not a number"))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<TransitionDataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("CSV missing '{name}' column"))
    };
    let year_idx = position(YEAR)?;
    let month_idx = position(MONTH)?;
    let sex_idx = position(SEX)?;
    let age_idx = position(AGE_GROUP)?;
    let value_cols = value_columns(headers.iter().map(String::as_str));

    let mut observations = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let year = parse_whole(field(year_idx)).with_context(|| format!("CSV row {row_no}: bad year"))?;
        let month = parse_whole(field(month_idx)).with_context(|| format!("CSV row {row_no}: bad month"))?;
        let sex: Sex = field(sex_idx).trim().parse().with_context(|| format!("CSV row {row_no}"))?;
        let age_group: AgeGroup = field(age_idx).trim().parse().with_context(|| format!("CSV row {row_no}"))?;
        let values = value_cols
            .iter()
            .map(|(idx, name)| parse_value(field(*idx)).with_context(|| format!("CSV row {row_no}, {name}")))
            .collect::<Result<Vec<f64>>>()?;

        if let Some(obs) =
            observation(year, month, sex, age_group, values).with_context(|| format!("CSV row {row_no}"))?
        {
            observations.push(obs);
        }
    }

    let names = value_cols.into_iter().map(|(_, name)| name).collect();
    Ok(TransitionDataset::from_observations(observations, names))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "year": 1990, "month": 1, "sex": "f", "age_group": "16-64",
///     "EfEp": 0.021, "rate_EfEp": 0.019, ... },
///   ...
/// ]
/// ```
///
/// A value key missing from a record, or `null`, is read as NaN.
fn load_json(path: &Path) -> Result<TransitionDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut keys: BTreeSet<&str> = BTreeSet::new();
    for rec in records {
        if let Some(obj) = rec.as_object() {
            keys.extend(obj.keys().map(String::as_str));
        }
    }
    let names: Vec<String> = value_columns(keys.into_iter()).into_iter().map(|(_, n)| n).collect();

    let mut observations = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let whole = |key: &str| {
            obj.get(key)
                .and_then(|v| {
                    v.as_i64()
                        .or_else(|| v.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                        .or_else(|| v.as_str().and_then(parse_whole))
                })
                .with_context(|| format!("Row {i}: missing or invalid '{key}'"))
        };
        let text = |key: &str| {
            obj.get(key)
                .and_then(JsonValue::as_str)
                .with_context(|| format!("Row {i}: missing or invalid '{key}'"))
        };

        let year = whole(YEAR)?;
        let month = whole(MONTH)?;
        let sex: Sex = text(SEX)?.parse().with_context(|| format!("Row {i}"))?;
        let age_group: AgeGroup = text(AGE_GROUP)?.parse().with_context(|| format!("Row {i}"))?;
        let values = names
            .iter()
            .map(|name| match obj.get(name) {
                None | Some(JsonValue::Null) => Ok(f64::NAN),
                Some(v) => v
                    .as_f64()
                    .with_context(|| format!("Row {i}, {name}: not a number")),
            })
            .collect::<Result<Vec<f64>>>()?;

        if let Some(obs) = observation(year, month, sex, age_group, values).with_context(|| format!("Row {i}"))? {
            observations.push(obs);
        }
    }

    Ok(TransitionDataset::from_observations(observations, names))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns.
///
/// `year`/`month` may be Int32, Int64 or whole Float64 (Pandas writes floats
/// when the CSV had gaps); value columns any float or integer type, nulls
/// read as NaN.
fn load_parquet(path: &Path) -> Result<TransitionDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let names: Vec<String> = value_columns(builder.schema().fields().iter().map(|f| f.name().as_str()))
        .into_iter()
        .map(|(_, n)| n)
        .collect();

    let reader = builder.build().context("building parquet reader")?;
    let mut observations = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let year_col = batch_column(&batch, YEAR)?;
        let month_col = batch_column(&batch, MONTH)?;
        let sex_col = batch_column(&batch, SEX)?;
        let age_col = batch_column(&batch, AGE_GROUP)?;
        let value_cols = names
            .iter()
            .map(|n| batch_column(&batch, n))
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            let year = extract_whole(year_col, row).with_context(|| format!("Row {row}: failed to read 'year'"))?;
            let month = extract_whole(month_col, row).with_context(|| format!("Row {row}: failed to read 'month'"))?;
            let sex: Sex = extract_str(sex_col, row)?.parse().with_context(|| format!("Row {row}"))?;
            let age_group: AgeGroup = extract_str(age_col, row)?.parse().with_context(|| format!("Row {row}"))?;
            let values = value_cols
                .iter()
                .map(|col| extract_f64(col, row))
                .collect::<Result<Vec<f64>>>()
                .with_context(|| format!("Row {row}: failed to read values"))?;

            if let Some(obs) = observation(year, month, sex, age_group, values).with_context(|| format!("Row {row}"))? {
                observations.push(obs);
            }
        }
    }

    Ok(TransitionDataset::from_observations(observations, names))
}

// -- Parquet / Arrow helpers --

fn batch_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Arc<dyn Array>> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
    Ok(batch.column(idx))
}

fn downcast<'a, T: 'static>(col: &'a Arc<dyn Array>) -> Result<&'a T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected column type {:?}", col.data_type()))
}

/// Extract a whole number from an integer or float column.
fn extract_whole(col: &Arc<dyn Array>, row: usize) -> Result<i64> {
    if col.is_null(row) {
        bail!("null value");
    }
    match col.data_type() {
        DataType::Int32 => Ok(downcast::<Int32Array>(col)?.value(row) as i64),
        DataType::Int64 => Ok(downcast::<Int64Array>(col)?.value(row)),
        DataType::Float64 => {
            let v = downcast::<Float64Array>(col)?.value(row);
            if v.fract() != 0.0 {
                bail!("{v} is not a whole number");
            }
            Ok(v as i64)
        }
        other => bail!("Expected integer column, got {other:?}"),
    }
}

fn extract_str(col: &Arc<dyn Array>, row: usize) -> Result<&str> {
    if col.is_null(row) {
        bail!("Row {row}: null label");
    }
    match col.data_type() {
        DataType::Utf8 => Ok(downcast::<StringArray>(col)?.value(row)),
        DataType::LargeUtf8 => Ok(downcast::<LargeStringArray>(col)?.value(row)),
        other => bail!("Row {row}: expected string column, got {other:?}"),
    }
}

fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        return Ok(f64::NAN);
    }
    match col.data_type() {
        DataType::Float64 => Ok(downcast::<Float64Array>(col)?.value(row)),
        DataType::Float32 => Ok(downcast::<Float32Array>(col)?.value(row) as f64),
        DataType::Int64 => Ok(downcast::<Int64Array>(col)?.value(row) as f64),
        DataType::Int32 => Ok(downcast::<Int32Array>(col)?.value(row) as f64),
        other => bail!("Expected float column, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_temp(ext: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(ext).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn csv_drops_early_years_and_sorts_by_date() {
        let file = write_temp(
            ".csv",
            "year,month,sex,age_group,EfEp,rate_EfEp,note\n\
             1990,2,f,16-64,0.2,0.02,x\n\
             1985,1,f,16-64,0.9,0.09,x\n\
             1990.0,1,m,16-64,,0.01,x\n",
        );
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.value_columns, vec!["EfEp", "rate_EfEp"]);
        assert_eq!(ds.len(), 2);
        let first = &ds.observations[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(1990, 1, 12).unwrap());
        assert_eq!(first.sex, Sex::Male);
        assert!(first.values[0].is_nan());
        assert_eq!(first.values[1], 0.01);
        assert_eq!(ds.catalog.len(), 2);
    }

    #[test]
    fn csv_missing_identifier_is_an_error() {
        let file = write_temp(".csv", "year,month,sex,EfEp\n1990,1,f,0.1\n");
        let err = load_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("age_group"));
    }

    #[test]
    fn csv_unknown_sex_is_an_error() {
        let file = write_temp(".csv", "year,month,sex,age_group,EfEp\n1990,1,x,16-64,0.1\n");
        let err = load_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("unknown sex 'x'"));
    }

    #[test]
    fn csv_null_and_na_cells_are_gaps() {
        let file = write_temp(
            ".csv",
            "year,month,sex,age_group,EfEp,rate_EfEp\n1990,1,f,16-64,null,NA\n1990,2,f,16-64,NULL,0.3\n",
        );
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert!(ds.observations.iter().all(|o| o.values[0].is_nan()));
        assert!(ds.observations[0].values[1].is_nan());
        assert_eq!(ds.observations[1].values[1], 0.3);
    }

    #[test]
    fn parquet_with_int32_columns_loads() {
        use arrow::array::ArrayRef;
        use arrow::datatypes::{Field, Schema};
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("year", DataType::Int32, false),
            Field::new("month", DataType::Int32, false),
            Field::new("sex", DataType::Utf8, false),
            Field::new("age_group", DataType::Utf8, false),
            Field::new("rate_EfEp", DataType::Float64, true),
            Field::new("EfEp", DataType::Int32, true),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int32Array::from(vec![1987, 1990, 1990])),
            Arc::new(Int32Array::from(vec![1, 2, 1])),
            Arc::new(StringArray::from(vec!["f", "f", "m"])),
            Arc::new(StringArray::from(vec!["16-64", "16-64", "16-64"])),
            Arc::new(Float64Array::from(vec![Some(0.5), Some(0.2), None])),
            Arc::new(Int32Array::from(vec![1, 2, 3])),
        ];
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.as_file().try_clone().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.value_columns, vec!["rate_EfEp", "EfEp"]);
        assert_eq!(ds.len(), 2);
        let first = &ds.observations[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(1990, 1, 12).unwrap());
        assert_eq!(first.sex, Sex::Male);
        assert!(first.values[0].is_nan());
        assert_eq!(first.values[1], 3.0);
        assert_eq!(ds.observations[1].values, vec![0.2, 2.0]);
    }

    #[test]
    fn json_records_load() {
        let file = write_temp(
            ".json",
            r#"[
                {"year": 2001, "month": 3, "sex": "t", "age_group": "20-24", "UU_sa": 0.5, "rate_UU_sa": null},
                {"year": 1987, "month": 3, "sex": "t", "age_group": "20-24", "UU_sa": 0.4}
            ]"#,
        );
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.value_columns, vec!["UU_sa", "rate_UU_sa"]);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.observations[0].values[0], 0.5);
        assert!(ds.observations[0].values[1].is_nan());
    }

    #[test]
    fn unsupported_extension() {
        let file = write_temp(".xlsx", "");
        assert!(load_file(file.path()).is_err());
    }
}
