//! Reader for DisPerSE `NDskl` ASCII skeleton files and point statistics of
//! thresholded 2-D fields.
//!
//! ```no_run
//! use ndskel::SkeletonDocument;
//!
//! # fn main() -> ndskel::Result<()> {
//! let doc = SkeletonDocument::open("N.fits.up.NDskl.a.NDskl")?;
//! if let Some(skel) = doc.skeleton() {
//!     println!("{} critical points", skel.critical_points.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod skeleton;
pub mod stats;

pub use crate::error::{Result, SkeletonError, StatsError};
pub use crate::skeleton::document::{LoadState, Skeleton, SkeletonDocument};
pub use crate::skeleton::model::{
    BoundingBox, Connection, CriticalPoint, CriticalPointId, Filament, FilamentId,
};
pub use crate::skeleton::table::{AttributeTable, AttributeValue};
pub use crate::stats::config::StatsParams;
pub use crate::stats::{BinKey, ImageStatistics, Pair, Triplet};
