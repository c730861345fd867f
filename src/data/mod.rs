/// Data layer: vocabularies, loading, and row filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file, drop rows before 1988 → TransitionDataset
///   └──────────┘
///        │
///        ▼
///   ┌───────────────────┐
///   │ TransitionDataset  │  date-sorted observations, SeriesCatalog
///   └───────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  sex / age-group predicates → rows tagged with sex_age
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
