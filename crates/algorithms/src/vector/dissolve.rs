//! Dissolve: merge polygons into the minimal set with no internal seams

use geo::{BooleanOps, MultiPolygon};
use std::collections::BTreeMap;

use super::overlay::Region;

/// Union every geometry into one (possibly multi-part) polygon.
///
/// Merges pairwise in a balanced tree so each boolean operation sees inputs
/// of similar size. A single input is still passed through the union so the
/// output is always normalized (overlapping parts merged).
pub fn union_all<I>(geometries: I) -> MultiPolygon<f64>
where
    I: IntoIterator<Item = MultiPolygon<f64>>,
{
    let empty = MultiPolygon::new(Vec::new());
    let mut level: Vec<MultiPolygon<f64>> = geometries
        .into_iter()
        .filter(|g| !g.0.is_empty())
        .collect();

    match level.len() {
        0 => return empty,
        1 => return level[0].union(&empty),
        _ => {}
    }

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [a, b] => a.union(b),
                [a] => a.clone(),
                _ => MultiPolygon::new(Vec::new()),
            })
            .collect();
    }
    level.pop().unwrap_or(empty)
}

/// Dissolve every region into a single geometry, ignoring labels
pub fn dissolve_all<L>(regions: &[Region<L>]) -> MultiPolygon<f64> {
    union_all(regions.iter().map(|r| r.geometry.clone()))
}

/// Dissolve regions by label: one region per distinct label, ascending.
///
/// Same-labeled fragments that touch or overlap are merged into one
/// geometry; regions whose dissolved geometry is empty are dropped.
pub fn dissolve_by_label<L, I>(regions: I) -> Vec<Region<L>>
where
    L: Ord,
    I: IntoIterator<Item = Region<L>>,
{
    let mut groups: BTreeMap<L, Vec<MultiPolygon<f64>>> = BTreeMap::new();
    for region in regions {
        groups.entry(region.label).or_default().push(region.geometry);
    }

    groups
        .into_iter()
        .map(|(label, parts)| Region::new(label, union_all(parts)))
        .filter(|r| !r.geometry.0.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::area;
    use geo::{LineString, Polygon};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
            vec![],
        )])
    }

    #[test]
    fn test_union_all_overlapping() {
        let merged = union_all(vec![rect(0.0, 0.0, 2.0, 2.0), rect(1.0, 0.0, 3.0, 2.0)]);
        assert_eq!(merged.0.len(), 1);
        assert!((area(&merged) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_union_all_adjacent_removes_seam() {
        let merged = union_all(vec![
            rect(0.0, 0.0, 1.0, 1.0),
            rect(1.0, 0.0, 2.0, 1.0),
            rect(2.0, 0.0, 3.0, 1.0),
        ]);
        assert_eq!(merged.0.len(), 1);
        assert!((area(&merged) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_union_all_disjoint_keeps_parts() {
        let merged = union_all(vec![rect(0.0, 0.0, 1.0, 1.0), rect(5.0, 5.0, 6.0, 6.0)]);
        assert_eq!(merged.0.len(), 2);
    }

    #[test]
    fn test_union_all_empty() {
        assert!(union_all(Vec::new()).0.is_empty());
        assert!(union_all(vec![MultiPolygon::new(vec![])]).0.is_empty());
    }

    #[test]
    fn test_dissolve_idempotent() {
        let once = union_all(vec![rect(0.0, 0.0, 2.0, 2.0), rect(1.0, 1.0, 3.0, 3.0)]);
        let twice = union_all(vec![once.clone()]);
        assert_eq!(once.0.len(), twice.0.len());
        assert!((area(&once) - area(&twice)).abs() < 1e-9);
        assert!(area(&once.xor(&twice)) < 1e-9);
    }

    #[test]
    fn test_dissolve_by_label() {
        let regions = vec![
            Region::new(2, rect(0.0, 0.0, 1.0, 1.0)),
            Region::new(1, rect(5.0, 0.0, 6.0, 1.0)),
            Region::new(2, rect(1.0, 0.0, 2.0, 1.0)),
        ];
        let dissolved = dissolve_by_label(regions);
        assert_eq!(dissolved.len(), 2);
        assert_eq!(dissolved[0].label, 1);
        assert_eq!(dissolved[1].label, 2);
        assert_eq!(dissolved[1].geometry.0.len(), 1);
        assert!((area(&dissolved[1].geometry) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_dissolve_all_ignores_labels() {
        let regions = vec![
            Region::new("a", rect(0.0, 0.0, 1.0, 1.0)),
            Region::new("b", rect(1.0, 0.0, 2.0, 1.0)),
        ];
        let all = dissolve_all(&regions);
        assert_eq!(all.0.len(), 1);
        assert!((area(&all) - 2.0).abs() < 1e-9);
    }
}
