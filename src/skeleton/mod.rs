/// Skeleton layer: NDskl parsing and the in-memory graph.
///
/// Architecture:
/// ```text
///   .NDskl (ASCII)
///        │
///        ▼
///   ┌──────────┐
///   │  blocks   │  marker lines → section ranges, rows tagged header/continuation
///   └──────────┘
///        │
///        ├──────────────────────┐
///        ▼                      ▼
///   ┌──────────┐          ┌──────────┐
///   │ records   │          │  table    │  "DATA" sections → AttributeTable
///   └──────────┘          └──────────┘
///        │  CriticalPoint / Filament       │
///        ▼                                 ▼
///   ┌──────────────────────────────────────────┐
///   │ document   Skeleton + SkeletonDocument    │
///   └──────────────────────────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  attribute predicates → selected entity indices
///   └──────────┘
/// ```

pub mod blocks;
pub mod document;
pub mod filter;
pub mod model;
pub mod records;
pub mod table;
