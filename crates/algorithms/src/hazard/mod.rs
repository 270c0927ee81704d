//! Flood-depth hazard rank merging
//!
//! Stages, in pipeline order:
//! - Decompose: split a source layer into one collection per rank
//! - Merge: dissolve every same-rank feature into one `RankLayer`
//! - Reduce: fold rank layers from highest to lowest so each location keeps
//!   only the highest rank covering it
//! - Extra overlay: fill gaps in the primary result from the secondary
//!   ("extra") category, never overriding a primary rank

mod decompose;
mod extra;
mod label;
mod layer;
mod merge;
mod reduce;

pub use decompose::decompose;
pub use extra::{overlay_extra, ExtraOverlay};
pub use label::Label;
pub use layer::{Footprint, RankLayer, ResultPartition};
pub use merge::{merge_rank, merge_ranks};
pub use reduce::{reduce, PriorityReduce, ReduceParams, Reduction};
