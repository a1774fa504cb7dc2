/// Data layer: core types, loading, inference, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ inference  │  numeric / categorical per column
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  checked values + query → View (row indices)
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌───────────┐  ┌─────────┐
///   │ aggregate  │  │  table  │
///   └───────────┘  └─────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod inference;
pub mod loader;
pub mod model;
pub mod table;
