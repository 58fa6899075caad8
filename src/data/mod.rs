/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable (untyped cells)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ NurseDataset  │  schema check, null-City rows dropped, city keys
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  exact city-key match → records sorted by Score
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
