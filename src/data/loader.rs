use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Cell, NurseDataset, RawTable, REQUIRED_COLUMNS};

/// Why a dataset could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file not found: {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("missing required columns: {}", .0.join(", "))]
    SchemaInvalid(Vec<String>),

    #[error("column `{0}` is reserved for the derived city key")]
    ReservedColumn(String),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("row {row}, column `{column}`: {detail}")]
    Value {
        row: usize,
        column: &'static str,
        detail: String,
    },

    #[error(transparent)]
    Read(#[from] anyhow::Error),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load and validate the nurse dataset stored at `path`.
///
/// This is a pure function of the file contents: loading an unchanged
/// artifact twice yields equal datasets.
pub fn load_dataset(path: &Path) -> Result<NurseDataset, LoadError> {
    if !path.is_file() {
        return Err(LoadError::ArtifactMissing(path.to_path_buf()));
    }
    let table = load_file(path)?;
    NurseDataset::from_table(table)
}

/// Read a raw table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – `df.to_parquet()` output (recommended)
/// * `.json`    – `df.to_json(orient="records")` output
/// * `.csv`     – header row, one nurse per line
pub fn load_file(path: &Path) -> Result<RawTable, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "csv" => load_csv(path)?,
        _ => return Err(LoadError::UnsupportedFormat(ext)),
    };
    Ok(table)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, one object per nurse:
///
/// ```json
/// [
///   { "NurseID": 1, "FName": "Mona", "City": "Cairo", "Score": 9.1, ... },
///   ...
/// ]
/// ```
///
/// The column set is the union of keys over all records.
fn load_json(path: &Path) -> anyhow::Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut table = RawTable::default();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = BTreeMap::new();
        for (key, val) in obj {
            if !table.column_names.contains(key) {
                table.column_names.push(key.clone());
            }
            row.insert(key.clone(), json_to_cell(val));
        }
        table.rows.push(row);
    }

    Ok(table)
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::String(s) => Cell::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Cell::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Cell::Float(f)
            } else {
                Cell::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Cell::Bool(*b),
        JsonValue::Null => Cell::Null,
        other => Cell::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one nurse per line.
/// Cells are kept as text (empty → null); numeric fields are parsed when
/// the rows are typed.
fn load_csv(path: &Path) -> anyhow::Result<RawTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let column_names: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let row: BTreeMap<String, Cell> = column_names
            .iter()
            .zip(record.iter())
            .map(|(name, value)| {
                let cell = if value.is_empty() {
                    Cell::Null
                } else {
                    Cell::String(value.to_string())
                };
                (name.clone(), cell)
            })
            .collect();
        rows.push(row);
    }

    Ok(RawTable { column_names, rows })
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding the nurse table.
///
/// Only the required columns are decoded; anything else (for instance the
/// `__index_level_0__` column Pandas writes) is listed but skipped.
/// Categorical columns arrive dictionary-encoded and are decoded to plain
/// values first.
fn load_parquet(path: &Path) -> anyhow::Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let column_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let wanted: Vec<(usize, &'static str)> = REQUIRED_COLUMNS
        .iter()
        .filter_map(|col| {
            column_names
                .iter()
                .position(|name| name == col)
                .map(|idx| (idx, *col))
        })
        .collect();

    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let columns = wanted
            .iter()
            .map(|&(idx, name)| {
                decode_column(batch.column(idx))
                    .with_context(|| format!("decoding column `{name}`"))
                    .map(|col| (name, col))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            let mut cells = BTreeMap::new();
            for (name, col) in &columns {
                let cell = arrow_cell(col, row)
                    .with_context(|| format!("Row {}: column `{name}`", rows.len()))?;
                cells.insert(name.to_string(), cell);
            }
            rows.push(cells);
        }
    }

    Ok(RawTable { column_names, rows })
}

// -- Parquet / Arrow helpers --

/// Cast dictionary and view encodings down to their plain value type.
fn decode_column(col: &ArrayRef) -> anyhow::Result<ArrayRef> {
    let decoded = match col.data_type() {
        DataType::Dictionary(_, value_type) => cast(col, value_type)?,
        DataType::Utf8View => cast(col, &DataType::Utf8)?,
        _ => col.clone(),
    };
    Ok(decoded)
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &ArrayRef, row: usize) -> anyhow::Result<Cell> {
    if col.is_null(row) {
        return Ok(Cell::Null);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => Cell::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Cell::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => Cell::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => Cell::Integer(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => Cell::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => Cell::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => Cell::Integer(col.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => Cell::Integer(col.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => Cell::Integer(col.as_primitive::<UInt32Type>().value(row).into()),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            Cell::Integer(i64::try_from(v).context("unsigned value out of range")?)
        }
        DataType::Float32 => Cell::Float(col.as_primitive::<Float32Type>().value(row).into()),
        DataType::Float64 => Cell::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => Cell::Bool(col.as_boolean().value(row)),
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{DictionaryArray, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use serde_json::json;

    use super::*;

    fn array(a: impl Array + 'static) -> ArrayRef {
        Arc::new(a)
    }

    /// Write a small nurse table as Parquet. `City` is dictionary-encoded
    /// the way Pandas stores a categorical column.
    fn write_parquet(path: &Path, cities: &[Option<&str>], scores: &[f64]) {
        let n = cities.len();
        let ids: Vec<i64> = (1..=n as i64).collect();
        let text = |prefix: &str| {
            array(StringArray::from(
                (0..n).map(|i| format!("{prefix}{i}")).collect::<Vec<_>>(),
            ))
        };
        let city: DictionaryArray<Int32Type> = cities.iter().copied().collect();

        let columns: Vec<(&str, ArrayRef)> = vec![
            ("NurseID", array(Int64Array::from(ids.clone()))),
            ("FName", text("F")),
            ("LName", text("L")),
            ("PhoneNumber", array(Int64Array::from(vec![1_001_234_567; n]))),
            ("Email", text("mail")),
            ("Experience", array(Int64Array::from(vec![3; n]))),
            ("Specialty", text("spec")),
            ("City", array(city)),
            ("Street", text("street")),
            ("AverageRating", array(Float64Array::from(vec![4.0; n]))),
            ("ReviewCount", array(Float64Array::from(vec![10.0; n]))),
            ("Comment", text("comment")),
            ("Score", array(Float64Array::from(scores.to_vec()))),
            ("__index_level_0__", array(Int64Array::from(ids))),
        ];
        let schema = Arc::new(Schema::new(
            columns
                .iter()
                .map(|(name, arr)| Field::new(*name, arr.data_type().clone(), true))
                .collect::<Vec<_>>(),
        ));
        let batch =
            RecordBatch::try_new(schema.clone(), columns.into_iter().map(|(_, a)| a).collect())
                .unwrap();

        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    fn nurse_json(id: i64, city: JsonValue, score: f64) -> JsonValue {
        json!({
            "NurseID": id, "FName": "Mona", "LName": "Adel", "PhoneNumber": 1001234567i64,
            "Email": "mona@example.com", "Experience": 4, "Specialty": "ICU",
            "City": city, "Street": "Nile St", "AverageRating": 4.8, "ReviewCount": 20.0,
            "Comment": "Great", "Score": score,
        })
    }

    #[test]
    fn missing_file_is_artifact_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dataset(&dir.path().join("nurse_data_frame.parquet")).unwrap_err();
        assert!(matches!(err, LoadError::ArtifactMissing(_)));
        assert!(err.to_string().contains("nurse_data_frame.parquet"));
    }

    #[test]
    fn loads_parquet_with_categorical_city() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nurses.parquet");
        write_parquet(&path, &[Some("Cairo"), None, Some(" Giza ")], &[9.1, 8.0, 7.0]);

        let ds = load_dataset(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.dropped_rows, 1);
        assert_eq!(ds.entries[0].record.city, "Cairo");
        assert_eq!(ds.entries[1].city_key, "giza");
        assert_eq!(ds.entries[1].record.nurse_id, 3);
        assert_eq!(ds.entries[1].record.phone_number, 1_001_234_567);
    }

    #[test]
    fn loading_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nurses.parquet");
        write_parquet(&path, &[Some("Cairo"), Some("cairo")], &[1.0, 2.0]);

        assert_eq!(load_dataset(&path).unwrap(), load_dataset(&path).unwrap());
    }

    #[test]
    fn loads_records_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nurses.json");
        let records = json!([
            nurse_json(1, json!("Cairo"), 9.1),
            nurse_json(2, JsonValue::Null, 5.0),
            nurse_json(3, json!("Giza"), 7.0),
        ]);
        std::fs::write(&path, records.to_string()).unwrap();

        let ds = load_dataset(&path).unwrap();
        let ids: Vec<i64> = ds.entries.iter().map(|e| e.record.nurse_id).collect();
        assert_eq!(ids, [1, 3]);
    }

    #[test]
    fn json_without_email_is_schema_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nurses.json");
        let mut rec = nurse_json(1, json!("Cairo"), 9.1);
        rec.as_object_mut().unwrap().remove("Email");
        std::fs::write(&path, json!([rec]).to_string()).unwrap();

        match load_dataset(&path) {
            Err(LoadError::SchemaInvalid(missing)) => assert_eq!(missing, ["Email"]),
            other => panic!("expected SchemaInvalid, got {other:?}"),
        }
    }

    #[test]
    fn loads_csv_and_parses_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nurses.csv");
        std::fs::write(
            &path,
            "NurseID,FName,LName,PhoneNumber,Email,Experience,Specialty,City,Street,AverageRating,ReviewCount,Comment,Score\n\
             1,Mona,Adel,1001234567,m@x.com,4,ICU,Cairo,Nile St,4.8,20,Great,9.1\n\
             2,Sara,Ali,1007654321,s@x.com,2,ER,,Ring Rd,4.1,3,Fine,3.0\n",
        )
        .unwrap();

        let ds = load_dataset(&path).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.dropped_rows, 1);
        let rec = &ds.entries[0].record;
        assert_eq!(rec.experience, 4);
        assert_eq!(rec.review_count, 20.0);
        assert_eq!(rec.score, 9.1);
    }

    #[test]
    fn rejects_unknown_extension_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let joblib = dir.path().join("nurse_data_frame.joblib");
        std::fs::write(&joblib, b"\x80\x04pickle").unwrap();
        assert!(matches!(
            load_dataset(&joblib),
            Err(LoadError::UnsupportedFormat(ext)) if ext == "joblib"
        ));

        let broken = dir.path().join("broken.parquet");
        std::fs::write(&broken, b"not parquet").unwrap();
        assert!(matches!(load_dataset(&broken), Err(LoadError::Read(_))));
    }
}
