//! Split a source layer into single-rank collections

use floodmax_core::{FeatureCollection, Rank};
use std::collections::BTreeMap;

/// Split a collection by rank.
///
/// Returns one collection per distinct rank present, keyed ascending. Each
/// output keeps the source CRS; geometries are moved, not copied.
pub fn decompose(collection: FeatureCollection) -> BTreeMap<Rank, FeatureCollection> {
    let crs = collection.crs;
    let mut parts: BTreeMap<Rank, FeatureCollection> = BTreeMap::new();

    for feature in collection.features {
        parts
            .entry(feature.rank)
            .or_insert_with(|| FeatureCollection {
                features: Vec::new(),
                crs: crs.clone(),
            })
            .push(feature);
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use floodmax_core::{RankedFeature, CRS};
    use geo::{LineString, MultiPolygon, Polygon};

    fn feature(x0: f64, rank: i64) -> RankedFeature {
        RankedFeature::new(
            MultiPolygon::new(vec![Polygon::new(
                LineString::from(vec![(x0, 0.0), (x0 + 1.0, 0.0), (x0 + 1.0, 1.0), (x0, 1.0), (x0, 0.0)]),
                vec![],
            )]),
            Rank::new(rank).unwrap(),
        )
    }

    #[test]
    fn test_split_by_rank() {
        let mut fc = FeatureCollection::with_crs(CRS::jgd2011());
        fc.extend([feature(0.0, 3), feature(2.0, 1), feature(4.0, 3), feature(6.0, 6)]);

        let parts = decompose(fc);
        let keys: Vec<u8> = parts.keys().map(|r| r.value()).collect();
        assert_eq!(keys, vec![1, 3, 6]);
        assert_eq!(parts[&Rank::new(3).unwrap()].len(), 2);
        assert!(parts
            .values()
            .all(|p| p.crs == Some(CRS::jgd2011()) && p.ranks().len() == 1));
    }

    #[test]
    fn test_geometry_unchanged() {
        let original = feature(0.0, 2);
        let mut fc = FeatureCollection::new();
        fc.push(original.clone());

        let parts = decompose(fc);
        assert_eq!(parts[&Rank::new(2).unwrap()].features[0], original);
    }

    #[test]
    fn test_empty_collection() {
        assert!(decompose(FeatureCollection::new()).is_empty());
    }
}
