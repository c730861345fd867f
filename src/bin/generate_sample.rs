//! Writes a synthetic transition-rate table for trying out the viewer.
//!
//! Usage: `generate_sample [OUTPUT]` where OUTPUT ends in `.csv` (default
//! `dta.csv`) or `.parquet`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const SEXES: [&str; 3] = ["f", "m", "t"];
const AGE_GROUPS: [&str; 10] = [
    "16-64", "16-19", "20-24", "25-29", "30-34", "35-39", "40-44", "45-49", "50-54", "55-64",
];
/// Transition code and its typical monthly gross rate.
const CODES: [(&str, f64); 16] = [
    ("EfEf", 0.93),
    ("EfEp", 0.03),
    ("EfU", 0.01),
    ("EfN", 0.03),
    ("EpEf", 0.20),
    ("EpEp", 0.60),
    ("EpU", 0.03),
    ("EpN", 0.17),
    ("UEf", 0.18),
    ("UEp", 0.08),
    ("UU", 0.50),
    ("UN", 0.24),
    ("NEf", 0.02),
    ("NEp", 0.03),
    ("NU", 0.03),
    ("NN", 0.92),
];
/// Starts before the viewer's 1988 cutoff on purpose.
const YEARS: std::ops::RangeInclusive<i64> = 1985..=2023;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Column-oriented output table.
struct Table {
    year: Vec<i64>,
    month: Vec<i64>,
    sex: Vec<&'static str>,
    age_group: Vec<&'static str>,
    /// `(column name, values)` in output order.
    values: Vec<(String, Vec<f64>)>,
}

fn value_column_names() -> Vec<String> {
    CODES
        .iter()
        .flat_map(|(code, _)| {
            [
                code.to_string(),
                format!("{code}_sa"),
                format!("rate_{code}"),
                format!("rate_{code}_sa"),
            ]
        })
        .collect()
}

fn generate(rng: &mut SimpleRng) -> Table {
    let mut table = Table {
        year: Vec::new(),
        month: Vec::new(),
        sex: Vec::new(),
        age_group: Vec::new(),
        values: value_column_names().into_iter().map(|n| (n, Vec::new())).collect(),
    };

    for year in YEARS {
        for month in 1..=12i64 {
            let season = (2.0 * std::f64::consts::PI * month as f64 / 12.0).sin();
            for sex in SEXES {
                for (age_idx, age_group) in AGE_GROUPS.into_iter().enumerate() {
                    table.year.push(year);
                    table.month.push(month);
                    table.sex.push(sex);
                    table.age_group.push(age_group);

                    let age_scale = 1.0 + 0.03 * age_idx as f64;
                    for (code_idx, (_, base)) in CODES.iter().enumerate() {
                        let adjusted = (base * age_scale * (1.0 + rng.gauss(0.0, 0.02))).clamp(1e-4, 0.999);
                        let gross = (adjusted * (1.0 + 0.05 * season)).clamp(1e-4, 0.999);
                        // Continuous-time rate implied by a monthly probability.
                        let instant = |p: f64| -(1.0 - p).ln();
                        let row = [instant(gross), instant(adjusted), gross, adjusted];
                        for (offset, v) in row.into_iter().enumerate() {
                            table.values[code_idx * 4 + offset].1.push(v);
                        }
                    }
                }
            }
        }
    }
    table
}

fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    let mut header = vec!["year".to_string(), "month".into(), "sex".into(), "age_group".into()];
    header.extend(table.values.iter().map(|(name, _)| name.clone()));
    writer.write_record(&header)?;

    for row in 0..table.year.len() {
        let mut record = vec![
            table.year[row].to_string(),
            table.month[row].to_string(),
            table.sex[row].to_string(),
            table.age_group[row].to_string(),
        ];
        record.extend(table.values.iter().map(|(_, col)| format!("{:.6}", col[row])));
        writer.write_record(&record)?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(table: &Table, path: &Path) -> Result<()> {
    let mut fields = vec![
        Field::new("year", DataType::Int64, false),
        Field::new("month", DataType::Int64, false),
        Field::new("sex", DataType::Utf8, false),
        Field::new("age_group", DataType::Utf8, false),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(table.year.clone())),
        Arc::new(Int64Array::from(table.month.clone())),
        Arc::new(StringArray::from(table.sex.clone())),
        Arc::new(StringArray::from(table.age_group.clone())),
    ];
    for (name, values) in &table.values {
        fields.push(Field::new(name, DataType::Float64, true));
        columns.push(Arc::new(Float64Array::from(values.clone())));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let output = std::env::args().nth(1).unwrap_or_else(|| "dta.csv".to_string());
    let path = Path::new(&output);

    let mut rng = SimpleRng::new(42);
    let table = generate(&mut rng);

    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => write_csv(&table, path)?,
        Some("parquet") | Some("pq") => write_parquet(&table, path)?,
        other => bail!("Unsupported output extension: {other:?}"),
    }

    println!(
        "Wrote {} rows ({} value columns) to {output}",
        table.year.len(),
        table.values.len()
    );
    Ok(())
}
