//! Extra-category overlay
//!
//! The extra category is a secondary hazard source that only fills gaps in
//! the primary result. It never overrides a primary rank, whatever its own
//! severity.

use floodmax_core::{Algorithm, Error, Rank, Result};
use tracing::{debug, info};

use super::label::Label;
use super::layer::{RankLayer, ResultPartition};
use super::reduce::{reduce, ReduceParams};
use crate::vector::{area, overlay_union, Overlap, Region};

/// Fill gaps in a primary partition from extra-category rank layers.
///
/// 1. The primary footprint is the dissolve-all of `partition`.
/// 2. It is overlaid against the union of every extra layer.
/// 3. Pieces still covered by the primary footprint are discarded.
/// 4. The remaining gap is overlaid against the extra rank regions to
///    recover each piece's own extra rank.
/// 5. Gap pieces without an extra rank, and slivers, are discarded.
/// 6. Survivors are appended and the result is dissolved by rank.
///
/// Extra layers that overlap each other are first reduced with the same
/// priority law as the primary ranks, so the output stays non-overlapping.
/// With no extra layers the partition is returned unchanged.
pub fn overlay_extra(
    partition: ResultPartition,
    extra_layers: Vec<RankLayer>,
    params: &ReduceParams,
) -> Result<ResultPartition> {
    if extra_layers.is_empty() {
        debug!("no extra layers, primary result is final");
        return Ok(partition);
    }

    let extra = reduce(extra_layers, params)?;

    let primary = [Region::new(Label::Accumulated, partition.footprint().into_inner())];
    let pending = [Region::new(Label::ExtraPending, extra.footprint.into_inner())];

    // Only pieces with no primary side are gaps
    let gap: Vec<Region<Label>> = overlay_union(&primary, &pending, params.sliver_epsilon)
        .into_iter()
        .filter(|piece| piece.sides.left().is_none())
        .map(|piece| Region::new(Label::ExtraPending, piece.geometry))
        .collect();

    if gap.is_empty() {
        info!("extra category lies entirely inside the primary footprint");
        return Ok(partition);
    }

    let extra_regions = extra.partition.into_regions();
    let fills: Vec<Region<Rank>> = overlay_union(&gap, &extra_regions, params.sliver_epsilon)
        .into_iter()
        .filter_map(|piece| match piece.sides {
            Overlap::Both(_, rank) => Some(Region::new(rank, piece.geometry)),
            Overlap::LeftOnly(_) | Overlap::RightOnly(_) => None,
        })
        .collect();

    let filled: f64 = fills.iter().map(|r| area(&r.geometry)).sum();
    info!("extra category fills {} gap piece(s), {:.6e} units²", fills.len(), filled);

    let mut partition = partition;
    partition.extend(fills);
    Ok(partition.dissolve_by_rank())
}

/// Extra-category overlay as an [`Algorithm`]
#[derive(Debug, Clone, Default)]
pub struct ExtraOverlay;

impl Algorithm for ExtraOverlay {
    type Input = (ResultPartition, Vec<RankLayer>);
    type Output = ResultPartition;
    type Params = ReduceParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Extra Overlay"
    }

    fn description(&self) -> &'static str {
        "Fill gaps in a primary rank partition from a lower-priority hazard category"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (partition, extra_layers) = input;
        overlay_extra(partition, extra_layers, &params)
    }
}
