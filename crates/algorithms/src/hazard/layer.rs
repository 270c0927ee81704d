//! Rank layers, the footprint accumulator and the result partition

use floodmax_core::{FeatureCollection, Rank, RankedFeature, CRS};
use geo::MultiPolygon;
use std::collections::{BTreeMap, BTreeSet};

use crate::vector::{area, dissolve_all, dissolve_by_label, Region};

/// Dissolved union of every same-rank feature across all sources
#[derive(Debug, Clone, PartialEq)]
pub struct RankLayer {
    pub rank: Rank,
    pub geometry: MultiPolygon<f64>,
}

impl RankLayer {
    pub fn new(rank: Rank, geometry: MultiPolygon<f64>) -> Self {
        Self { rank, geometry }
    }

    /// Single-record collection for writing the layer to disk
    pub fn to_feature_collection(&self, crs: Option<CRS>) -> FeatureCollection {
        FeatureCollection {
            features: vec![RankedFeature::new(self.geometry.clone(), self.rank)],
            crs,
        }
    }
}

/// Running union of every rank already folded into the result
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint(MultiPolygon<f64>);

impl Default for Footprint {
    fn default() -> Self {
        Self(MultiPolygon::new(Vec::new()))
    }
}

impl Footprint {
    pub fn new(geometry: MultiPolygon<f64>) -> Self {
        Self(geometry)
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.0
    }

    pub fn into_inner(self) -> MultiPolygon<f64> {
        self.0
    }

    pub fn area(&self) -> f64 {
        area(&self.0)
    }
}

/// Rank-labeled, pairwise non-overlapping regions.
///
/// Regions are kept in descending rank order, then in the order they were
/// added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultPartition {
    regions: Vec<Region<Rank>>,
}

impl ResultPartition {
    pub fn new() -> Self {
        Self { regions: Vec::new() }
    }

    pub fn push(&mut self, region: Region<Rank>) {
        self.regions.push(region);
    }

    pub fn regions(&self) -> &[Region<Rank>] {
        &self.regions
    }

    pub fn into_regions(self) -> Vec<Region<Rank>> {
        self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Distinct ranks present, ascending
    pub fn ranks(&self) -> BTreeSet<Rank> {
        self.regions.iter().map(|r| r.label).collect()
    }

    /// Union of every region, regardless of rank
    pub fn footprint(&self) -> Footprint {
        Footprint(dissolve_all(&self.regions))
    }

    /// Merge same-rank regions into one region per rank, highest first
    pub fn dissolve_by_rank(self) -> Self {
        let mut regions = dissolve_by_label(self.regions);
        regions.reverse();
        Self { regions }
    }

    /// Total area per rank
    pub fn area_by_rank(&self) -> BTreeMap<Rank, f64> {
        let mut areas = BTreeMap::new();
        for region in &self.regions {
            *areas.entry(region.label).or_insert(0.0) += area(&region.geometry);
        }
        areas
    }

    /// Features for the writer: one record per region, attribute = rank
    pub fn to_feature_collection(&self, crs: Option<CRS>) -> FeatureCollection {
        FeatureCollection {
            features: self
                .regions
                .iter()
                .map(|r| RankedFeature::new(r.geometry.clone(), r.label))
                .collect(),
            crs,
        }
    }
}

impl Extend<Region<Rank>> for ResultPartition {
    fn extend<I: IntoIterator<Item = Region<Rank>>>(&mut self, iter: I) {
        self.regions.extend(iter);
    }
}

impl FromIterator<Region<Rank>> for ResultPartition {
    fn from_iter<I: IntoIterator<Item = Region<Rank>>>(iter: I) -> Self {
        Self { regions: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    fn rect(x0: f64, x1: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(x0, 0.0), (x1, 0.0), (x1, 1.0), (x0, 1.0), (x0, 0.0)]),
            vec![],
        )])
    }

    fn rank(v: i64) -> Rank {
        Rank::new(v).unwrap()
    }

    #[test]
    fn test_dissolve_by_rank_orders_descending() {
        let partition: ResultPartition = vec![
            Region::new(rank(2), rect(0.0, 1.0)),
            Region::new(rank(5), rect(3.0, 4.0)),
            Region::new(rank(2), rect(1.0, 2.0)),
        ]
        .into_iter()
        .collect();

        let dissolved = partition.dissolve_by_rank();
        assert_eq!(dissolved.len(), 2);
        assert_eq!(dissolved.regions()[0].label, rank(5));
        assert_eq!(dissolved.regions()[1].label, rank(2));
        assert!((dissolved.area_by_rank()[&rank(2)] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_footprint_is_empty() {
        let footprint = Footprint::default();
        assert!(footprint.geometry().0.is_empty());
        assert_eq!(footprint.area(), 0.0);
        assert!(ResultPartition::default().footprint().geometry().0.is_empty());
    }

    #[test]
    fn test_footprint_and_features() {
        let partition: ResultPartition = vec![
            Region::new(rank(3), rect(0.0, 1.0)),
            Region::new(rank(1), rect(1.0, 2.0)),
        ]
        .into_iter()
        .collect();

        assert!((partition.footprint().area() - 2.0).abs() < 1e-9);
        assert_eq!(partition.footprint().geometry().0.len(), 1);

        let fc = partition.to_feature_collection(Some(CRS::jgd2011()));
        assert_eq!(fc.len(), 2);
        assert_eq!(fc.ranks().into_iter().map(Rank::value).collect::<Vec<_>>(), vec![1, 3]);
    }
}
