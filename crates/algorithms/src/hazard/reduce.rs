//! Priority reduction of rank layers
//!
//! Produces a planar partition labeled by winning rank: at every location
//! the highest rank covering it wins, and a lower rank survives only outside
//! the footprint of every higher rank.
//!
//! Layers are consumed strictly from highest to lowest. Each step overlays
//! the next rank with the footprint of everything folded so far; the pieces
//! outside that footprint become the rank's final region and the footprint
//! grows to include them. Processing order alone implements the priority
//! law, so no separate conflict resolution is needed.

use floodmax_core::{Algorithm, Error, Result};
use tracing::debug;

use super::label::Label;
use super::layer::{Footprint, RankLayer, ResultPartition};
use crate::vector::{area, dissolve_by_label, overlay_union, union_all, Region};

/// Parameters for rank reduction
#[derive(Debug, Clone)]
pub struct ReduceParams {
    /// Overlay pieces with an area at or below this value (CRS units
    /// squared) are discarded as floating-point slivers.
    ///
    /// The default, 1e-12 square degrees, is roughly 0.01 m² at Japanese
    /// latitudes in EPSG:6668.
    pub sliver_epsilon: f64,
}

impl Default for ReduceParams {
    fn default() -> Self {
        Self {
            sliver_epsilon: 1e-12,
        }
    }
}

/// State threaded through the reduction fold
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    /// Finalized rank regions, highest rank first
    pub partition: ResultPartition,
    /// Union of every rank folded so far
    pub footprint: Footprint,
}

impl Reduction {
    /// Start from the highest rank: its layer is final as-is
    fn seed(layer: RankLayer) -> Self {
        let mut partition = ResultPartition::new();
        partition.push(Region::new(layer.rank, layer.geometry.clone()));
        Self {
            partition,
            footprint: Footprint::new(layer.geometry),
        }
    }

    /// Fold the next lower rank into the result
    fn fold_in(self, layer: RankLayer, params: &ReduceParams) -> Self {
        let rank = layer.rank;
        let incoming = [Region::new(Label::Rank(rank), layer.geometry)];
        let covered = [Region::new(Label::Accumulated, self.footprint.into_inner())];
        debug!("overlaying {} with {}", incoming[0].label, covered[0].label);

        // Anything the footprint covers stays accumulated; only the part of
        // the rank layer outside it keeps the rank.
        let pieces = overlay_union(&incoming, &covered, params.sliver_epsilon)
            .into_iter()
            .map(|piece| {
                let label = piece.sides.right().copied().unwrap_or(Label::Rank(rank));
                Region::new(label, piece.geometry)
            });
        let combined = dissolve_by_label(pieces);

        let footprint = Footprint::new(union_all(combined.iter().map(|r| r.geometry.clone())));
        let mut partition = self.partition;
        for region in combined {
            if let Some(r) = region.label.rank() {
                debug!("rank {}: {:.6e} units² outside higher ranks", r, area(&region.geometry));
                partition.push(region.relabel(r));
            }
        }

        Reduction { partition, footprint }
    }
}

/// Reduce rank layers to a priority partition.
///
/// # Arguments
/// * `layers` - One layer per active rank, in any order
/// * `params` - Sliver threshold
///
/// # Errors
/// `NoActiveRanks` when `layers` is empty, `DuplicateRank` when a rank
/// appears twice.
pub fn reduce(layers: Vec<RankLayer>, params: &ReduceParams) -> Result<Reduction> {
    let mut layers = layers;
    layers.sort_by(|a, b| b.rank.cmp(&a.rank));
    if let Some(pair) = layers.windows(2).find(|w| w[0].rank == w[1].rank) {
        return Err(Error::DuplicateRank(pair[0].rank.value()));
    }

    let mut descending = layers.into_iter();
    let highest = descending.next().ok_or(Error::NoActiveRanks)?;
    debug!("seeding reduction with rank {}", highest.rank);

    Ok(descending.fold(Reduction::seed(highest), |acc, layer| acc.fold_in(layer, params)))
}

/// Priority reduction as an [`Algorithm`]
#[derive(Debug, Clone, Default)]
pub struct PriorityReduce;

impl Algorithm for PriorityReduce {
    type Input = Vec<RankLayer>;
    type Output = Reduction;
    type Params = ReduceParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Priority Reduce"
    }

    fn description(&self) -> &'static str {
        "Keep only the highest rank at every location of a set of rank layers"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        reduce(input, &params)
    }
}
