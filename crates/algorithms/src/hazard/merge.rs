//! Dissolve same-rank features into rank layers

use floodmax_core::{Error, Rank, RankedFeature, Result};
use std::collections::BTreeMap;
use tracing::debug;

use super::layer::RankLayer;
use crate::vector::union_all;

/// Dissolve every feature of one rank into a single rank layer.
///
/// Per-source seams are discarded: the result is exactly one (possibly
/// multi-part) geometry. Returns `None` when there are no features or their
/// union has no area, i.e. the rank is absent.
pub fn merge_rank<I>(rank: Rank, features: I) -> Result<Option<RankLayer>>
where
    I: IntoIterator<Item = RankedFeature>,
{
    let mut geometries = Vec::new();
    for feature in features {
        if feature.rank != rank {
            return Err(Error::Algorithm(format!(
                "rank {} feature passed to the rank {} merge",
                feature.rank, rank
            )));
        }
        geometries.push(feature.geometry);
    }

    if geometries.is_empty() {
        return Ok(None);
    }

    let count = geometries.len();
    let geometry = union_all(geometries);
    debug!("rank {}: dissolved {} feature(s) into {} part(s)", rank, count, geometry.0.len());

    if geometry.0.is_empty() {
        Ok(None)
    } else {
        Ok(Some(RankLayer::new(rank, geometry)))
    }
}

/// Group features of mixed ranks and dissolve each group.
///
/// Returns one layer per rank with data, ascending.
pub fn merge_ranks<I>(features: I) -> Vec<RankLayer>
where
    I: IntoIterator<Item = RankedFeature>,
{
    let mut groups: BTreeMap<Rank, Vec<_>> = BTreeMap::new();
    for feature in features {
        groups.entry(feature.rank).or_default().push(feature.geometry);
    }

    groups
        .into_iter()
        .map(|(rank, geometries)| RankLayer::new(rank, union_all(geometries)))
        .filter(|layer| !layer.geometry.0.is_empty())
        .collect()
}
