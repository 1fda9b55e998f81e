/// Data layer: loading, column mapping, filtering and export.
///
/// Architecture:
/// ```text
///  .xlsx / .xls / .ods / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  sheet → EventTable (all cells as text)
///   └──────────┘
///        │           dict/cols/*.txt
///        ▼                 │
///   ┌──────────┐           │
///   │ mapping   │ ◄────────┘  role → column suggestions
///   └──────────┘
///        │           dict/blacklist/*.txt
///        ▼                 │
///   ┌──────────┐    ┌───────────┐
///   │  filter   │ ◄─│ blacklist │  blank / type / site / comment stages
///   └──────────┘    └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  canonical columns → .xlsx / .csv
///   └──────────┘
/// ```

pub mod blacklist;
pub mod dictionary;
pub mod export;
pub mod filter;
pub mod loader;
pub mod mapping;
pub mod model;
