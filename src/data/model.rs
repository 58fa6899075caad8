use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::loader::LoadError;

/// Columns every artifact must provide, in canonical response order.
pub const REQUIRED_COLUMNS: [&str; 13] = [
    "NurseID",
    "FName",
    "LName",
    "PhoneNumber",
    "Email",
    "Experience",
    "Specialty",
    "City",
    "Street",
    "AverageRating",
    "ReviewCount",
    "Comment",
    "Score",
];

/// Name reserved for the derived city key; artifacts may not carry it.
pub const CITY_KEY_COLUMN: &str = "City_clean";

/// Normalise a city name for matching: trimmed and lower-cased.
///
/// Used both when the dataset is built and when a query arrives, so the
/// two sides always agree.
pub fn normalize_city(city: &str) -> String {
    city.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Cell – a single value in a raw table column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring common Pandas dtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::String(s) => write!(f, "{s:?}"),
            Cell::Integer(i) => write!(f, "{i}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Null => write!(f, "<null>"),
        }
    }
}

impl Cell {
    fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Integer(i) => Some(*i),
            // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound.
            Cell::Float(v)
                if v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < i64::MAX as f64 =>
            {
                Some(*v as i64)
            }
            Cell::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Float(v) => Some(*v),
            Cell::Integer(i) => Some(*i as f64),
            Cell::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// RawTable – what every artifact reader produces
// ---------------------------------------------------------------------------

/// Untyped table as read from disk, before schema validation.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Column names in artifact order.
    pub column_names: Vec<String>,
    /// One map per row: column_name → value. Columns a reader skipped
    /// (or a record left out) are simply absent.
    pub rows: Vec<BTreeMap<String, Cell>>,
}

// ---------------------------------------------------------------------------
// NurseRecord – one row of the dataset
// ---------------------------------------------------------------------------

/// Public representation of one nurse. Field order is the response order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NurseRecord {
    #[serde(rename = "NurseID")]
    pub nurse_id: i64,
    #[serde(rename = "FName")]
    pub first_name: String,
    #[serde(rename = "LName")]
    pub last_name: String,
    pub phone_number: i64,
    pub email: String,
    pub experience: i64,
    pub specialty: String,
    pub city: String,
    pub street: String,
    pub average_rating: f64,
    pub review_count: f64,
    pub comment: String,
    pub score: f64,
}

/// Typed accessor over one raw row, carrying the row number for errors.
struct RowReader<'a> {
    index: usize,
    cells: &'a BTreeMap<String, Cell>,
}

impl<'a> RowReader<'a> {
    fn cell(&self, column: &'static str) -> Result<&'a Cell, LoadError> {
        match self.cells.get(column) {
            None | Some(Cell::Null) => Err(self.invalid(column, "null value".to_string())),
            Some(cell) => Ok(cell),
        }
    }

    fn invalid(&self, column: &'static str, detail: String) -> LoadError {
        LoadError::Value {
            row: self.index,
            column,
            detail,
        }
    }

    fn int(&self, column: &'static str) -> Result<i64, LoadError> {
        let cell = self.cell(column)?;
        cell.as_i64()
            .ok_or_else(|| self.invalid(column, format!("expected an integer, found {cell}")))
    }

    fn float(&self, column: &'static str) -> Result<f64, LoadError> {
        let cell = self.cell(column)?;
        cell.as_f64()
            .ok_or_else(|| self.invalid(column, format!("expected a number, found {cell}")))
    }

    fn text(&self, column: &'static str) -> Result<String, LoadError> {
        match self.cell(column)? {
            Cell::String(s) => Ok(s.clone()),
            other => Err(self.invalid(column, format!("expected a string, found {other}"))),
        }
    }
}

impl NurseRecord {
    fn from_row(row: &RowReader<'_>) -> Result<Self, LoadError> {
        Ok(NurseRecord {
            nurse_id: row.int("NurseID")?,
            first_name: row.text("FName")?,
            last_name: row.text("LName")?,
            phone_number: row.int("PhoneNumber")?,
            email: row.text("Email")?,
            experience: row.int("Experience")?,
            specialty: row.text("Specialty")?,
            city: row.text("City")?,
            street: row.text("Street")?,
            average_rating: row.float("AverageRating")?,
            review_count: row.float("ReviewCount")?,
            comment: row.text("Comment")?,
            score: row.float("Score")?,
        })
    }
}

// ---------------------------------------------------------------------------
// NurseDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// A record together with its derived city key.
#[derive(Debug, Clone, PartialEq)]
pub struct NurseEntry {
    pub city_key: String,
    pub record: NurseRecord,
}

/// A row with a city whose other fields could not be typed.
///
/// It is never served; a lookup for its city fails instead of silently
/// returning a partial list.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    pub row: usize,
    pub city_key: String,
    pub reason: String,
}

/// The validated, immutable dataset served by the API.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NurseDataset {
    /// Entries in artifact order, null-City rows removed.
    pub entries: Vec<NurseEntry>,
    /// Rows that failed typing, keyed by city.
    pub rejected: Vec<RejectedRow>,
    /// How many rows were dropped because City was null.
    pub dropped_rows: usize,
}

impl NurseDataset {
    /// Validate the schema of a raw table and type every row.
    pub fn from_table(table: RawTable) -> Result<Self, LoadError> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|col| !table.column_names.iter().any(|name| name == *col))
            .map(|col| col.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::SchemaInvalid(missing));
        }
        if table.column_names.iter().any(|name| name == CITY_KEY_COLUMN) {
            return Err(LoadError::ReservedColumn(CITY_KEY_COLUMN.to_string()));
        }

        let mut entries = Vec::with_capacity(table.rows.len());
        let mut rejected = Vec::new();
        let mut dropped_rows = 0;
        for (index, cells) in table.rows.iter().enumerate() {
            let city = match cells.get("City") {
                None | Some(Cell::Null) => {
                    dropped_rows += 1;
                    continue;
                }
                Some(Cell::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            };
            match NurseRecord::from_row(&RowReader { index, cells }) {
                Ok(record) => entries.push(NurseEntry {
                    city_key: normalize_city(&record.city),
                    record,
                }),
                Err(e) => rejected.push(RejectedRow {
                    row: index,
                    city_key: normalize_city(&city),
                    reason: e.to_string(),
                }),
            }
        }

        Ok(NurseDataset {
            entries,
            rejected,
            dropped_rows,
        })
    }

    /// Number of nurse records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dataset holds no records.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
