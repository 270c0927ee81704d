//! # floodmax algorithms
//!
//! Flood-depth rank merging for floodmax.
//!
//! ## Modules
//!
//! - **vector**: polygon overlay union, dissolve, area
//! - **hazard**: decompose, rank merge, priority reduction, extra-category overlay
//! - **pipeline**: the on-disk four-stage run driven by a `PipelineConfig`

pub mod hazard;
pub mod pipeline;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::hazard::{
        decompose, merge_rank, merge_ranks, overlay_extra, reduce, ExtraOverlay, Footprint,
        Label, PriorityReduce, RankLayer, ReduceParams, Reduction, ResultPartition,
    };
    pub use crate::pipeline::{Pipeline, PipelineConfig, RunSummary};
    pub use crate::vector::{dissolve_by_label, overlay_union, union_all, Overlap, Region};
    pub use floodmax_core::prelude::*;
}
