// src/process/export.rs

use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Date32Array, Float64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{fs::File, path::Path, sync::Arc};
use tracing::info;

use super::types::{Metric, SeriesTable};

fn series_schema() -> Schema {
    let mut fields = vec![
        Field::new("state", DataType::Utf8, false),
        Field::new("date", DataType::Date32, false),
    ];
    for metric in Metric::ALL {
        fields.push(Field::new(metric.column(), DataType::Float64, true));
    }
    fields.push(Field::new("new_cases", DataType::Float64, true));
    Schema::new(fields)
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    (date - epoch).num_days() as i32
}

/// Write the reshaped table as a Snappy-compressed Parquet snapshot.
/// Unreported cells become column nulls, so absence survives the export.
pub fn write_series_parquet(table: &SeriesTable, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let rows = table.rows();

    let schema = series_schema();
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());

    let states: Vec<&str> = rows.iter().map(|r| r.state.as_str()).collect();
    arrays.push(Arc::new(StringArray::from(states)));

    let dates: Vec<i32> = rows.iter().map(|r| days_since_epoch(r.date)).collect();
    arrays.push(Arc::new(Date32Array::from(dates)));

    for metric in Metric::ALL {
        let cells: Vec<Option<f64>> = rows.iter().map(|r| r.value(metric)).collect();
        arrays.push(Arc::new(Float64Array::from(cells)));
    }
    let new_cases: Vec<Option<f64>> = rows.iter().map(|r| r.new_cases).collect();
    arrays.push(Arc::new(Float64Array::from(new_cases)));

    let batch = RecordBatch::try_new(Arc::new(schema.clone()), arrays)
        .context("building series record batch")?;

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, Arc::new(schema), Some(props))
        .context("creating Arrow writer for series snapshot")?;
    writer.write(&batch).context("writing series batch")?;
    writer.close().context("closing series writer")?;

    info!(rows = rows.len(), path = %path.display(), "wrote series snapshot");
    Ok(())
}
