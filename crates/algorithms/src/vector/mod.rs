//! Vector overlay primitives
//!
//! Polygon operations the rank reduction is built from:
//! - Overlay union: split two labeled layers into overlapping and
//!   non-overlapping pieces, keeping each side's label
//! - Dissolve: merge regions (all, or by label) into minimal polygons
//! - Area: unsigned polygon area, used for sliver filtering

mod dissolve;
mod measurements;
mod overlay;

pub use dissolve::{dissolve_all, dissolve_by_label, union_all};
pub use measurements::{area, is_sliver};
pub use overlay::{overlay_union, OverlayPiece, Overlap, Region};
