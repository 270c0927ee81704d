//! Geometric measurements: area and sliver detection

use geo::{Area as GeoArea, MultiPolygon};

/// Unsigned area of a multipolygon.
///
/// Results are in CRS units squared (square degrees for EPSG:6668; project
/// to a metric CRS for square meters).
pub fn area(geom: &MultiPolygon<f64>) -> f64 {
    geom.unsigned_area()
}

/// True when a piece is too small to be a real hazard region.
///
/// Overlay of nearly coincident boundaries leaves thin slivers; anything
/// whose area does not exceed `epsilon` is treated as overlay noise.
pub fn is_sliver(geom: &MultiPolygon<f64>, epsilon: f64) -> bool {
    area(geom) <= epsilon
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    fn square(x0: f64, size: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (x0, 0.0), (x0 + size, 0.0), (x0 + size, size), (x0, size), (x0, 0.0),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_area_multipolygon() {
        let mp = MultiPolygon::new(vec![square(0.0, 10.0), square(20.0, 2.0)]);
        assert!((area(&mp) - 104.0).abs() < 1e-10);
    }

    #[test]
    fn test_area_with_hole() {
        let poly = Polygon::new(
            LineString::from(vec![
                (0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0),
            ]),
            vec![LineString::from(vec![
                (2.0, 2.0), (8.0, 2.0), (8.0, 8.0), (2.0, 8.0), (2.0, 2.0),
            ])],
        );
        assert!((area(&MultiPolygon::new(vec![poly])) - 64.0).abs() < 1e-10);
    }

    #[test]
    fn test_sliver() {
        let thin = MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 1e-9), (0.0, 1e-9), (0.0, 0.0)]),
            vec![],
        )]);
        assert!(is_sliver(&thin, 1e-6));
        assert!(!is_sliver(&MultiPolygon::new(vec![square(0.0, 1.0)]), 1e-6));
        assert!(is_sliver(&MultiPolygon::new(vec![]), 0.0));
    }
}
