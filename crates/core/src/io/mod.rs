//! I/O operations for reading and writing ranked hazard layers
//!
//! GeoJSON is always available. Shapefiles, GeoPackages and reprojection
//! need the `gdal` feature.

#[cfg(feature = "gdal")]
mod gdal_io;
mod native;

use std::path::Path;
use tracing::{debug, warn};

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, FeatureCollection, Rank, RankedFeature};
use geo_types::Geometry;

#[cfg(feature = "gdal")]
pub use gdal_io::{read_ogr, write_ogr};
pub use native::{read_geojson, read_geojson_from_str, write_geojson};

/// Options for reading source hazard layers
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Canonical rank attribute name
    pub rank_field: String,
    /// Alternate rank attribute name accepted when the canonical one is absent
    pub rank_field_alias: String,
    /// CRS every feature must end up in
    pub target_crs: CRS,
    /// Character encoding of shapefile attribute tables (OGR `ENCODING`)
    pub encoding: String,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            rank_field: "value".to_string(),
            rank_field_alias: "rank".to_string(),
            target_crs: CRS::jgd2011(),
            encoding: "CP932".to_string(),
        }
    }
}

impl ReadOptions {
    fn candidates(&self) -> Vec<String> {
        vec![self.rank_field.clone(), self.rank_field_alias.clone()]
    }
}

/// Options for writing ranked layers
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Name of the integer rank attribute
    pub rank_field: String,
    /// Write one record per polygon part instead of one per feature
    pub explode: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            rank_field: "value".to_string(),
            explode: false,
        }
    }
}

/// Vector formats understood by this build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFormat {
    GeoJson,
    #[cfg(feature = "gdal")]
    Ogr,
}

impl VectorFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "geojson" | "json" => Some(VectorFormat::GeoJson),
            #[cfg(feature = "gdal")]
            "shp" | "gpkg" => Some(VectorFormat::Ogr),
            _ => None,
        }
    }
}

/// True when `path` names a file this build can read as a hazard layer
pub fn is_vector_source(path: &Path) -> bool {
    path.is_file() && VectorFormat::from_path(path).is_some()
}

/// Read a hazard layer, normalizing its rank attribute and CRS
pub fn read_features(path: &Path, options: &ReadOptions) -> Result<FeatureCollection> {
    match VectorFormat::from_path(path) {
        Some(VectorFormat::GeoJson) => read_geojson(path, options),
        #[cfg(feature = "gdal")]
        Some(VectorFormat::Ogr) => read_ogr(path, options),
        None => Err(Error::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Write ranked features, choosing the format from the extension
pub fn write_features(collection: &FeatureCollection, path: &Path, options: &WriteOptions) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    match VectorFormat::from_path(path) {
        Some(VectorFormat::GeoJson) => write_geojson(collection, path, options),
        #[cfg(feature = "gdal")]
        Some(VectorFormat::Ogr) => write_ogr(collection, path, options),
        None => Err(Error::UnsupportedFormat(path.to_path_buf())),
    }
}

/// A source record before rank normalization.
///
/// `rank` is `None` when neither rank attribute exists on the record and
/// `Some(AttributeValue::Null)` when it exists but is empty.
#[derive(Debug)]
pub(crate) struct RawFeature {
    pub geometry: Option<Geometry<f64>>,
    pub rank: Option<AttributeValue>,
}

/// Turn raw source records into ranked features.
///
/// A source in which no record carries either rank attribute is a
/// configuration error. Null ranks, empty geometries and ranks outside the
/// recognized set are skipped.
pub(crate) fn rank_features(
    source: &Path,
    raw: Vec<RawFeature>,
    options: &ReadOptions,
) -> Result<Vec<RankedFeature>> {
    if raw.is_empty() {
        warn!("{}: source has no features", source.display());
        return Ok(Vec::new());
    }
    if raw.iter().all(|f| f.rank.is_none()) {
        return Err(Error::MissingRankAttribute {
            path: source.to_path_buf(),
            candidates: options.candidates(),
        });
    }

    let mut features = Vec::with_capacity(raw.len());
    let mut unrecognized = 0usize;
    let mut unranked = 0usize;

    for (index, record) in raw.into_iter().enumerate() {
        let value = match record.rank.as_ref().and_then(AttributeValue::as_integer) {
            None => {
                unranked += 1;
                continue;
            }
            Some(Err(text)) => {
                return Err(Error::InvalidRankValue {
                    path: source.to_path_buf(),
                    index,
                    value: text,
                })
            }
            Some(Ok(v)) => v,
        };

        let rank = match Rank::new(value) {
            Ok(rank) => rank,
            Err(_) => {
                unrecognized += 1;
                continue;
            }
        };

        let Some(geometry) = record.geometry else {
            debug!("{}: feature {} has no geometry", source.display(), index);
            continue;
        };
        match RankedFeature::from_geometry(geometry, rank)? {
            Some(feature) => features.push(feature),
            None => debug!("{}: feature {} has an empty geometry", source.display(), index),
        }
    }

    if unranked > 0 {
        warn!("{}: skipped {} feature(s) without a rank value", source.display(), unranked);
    }
    if unrecognized > 0 {
        warn!(
            "{}: skipped {} feature(s) with a rank outside {}..={}",
            source.display(),
            unrecognized,
            Rank::MIN,
            Rank::MAX
        );
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;
    use std::path::PathBuf;

    fn square() -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)
        ])
    }

    fn raw(rank: Option<AttributeValue>) -> RawFeature {
        RawFeature { geometry: Some(square()), rank }
    }

    #[test]
    fn test_missing_attribute_everywhere_is_fatal() {
        let err = rank_features(
            &PathBuf::from("a.geojson"),
            vec![raw(None), raw(None)],
            &ReadOptions::default(),
        )
        .unwrap_err();
        match err {
            Error::MissingRankAttribute { candidates, .. } => {
                assert_eq!(candidates, vec!["value".to_string(), "rank".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_skips_null_and_unrecognized() {
        let features = rank_features(
            &PathBuf::from("a.geojson"),
            vec![
                raw(Some(AttributeValue::Int(3))),
                raw(Some(AttributeValue::Null)),
                raw(Some(AttributeValue::Int(0))),
                raw(Some(AttributeValue::Int(12))),
                raw(None),
            ],
            &ReadOptions::default(),
        )
        .unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].rank.value(), 3);
    }

    #[test]
    fn test_fractional_rank_is_error() {
        let err = rank_features(
            &PathBuf::from("a.geojson"),
            vec![raw(Some(AttributeValue::Float(2.5)))],
            &ReadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidRankValue { index: 0, .. }));
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(VectorFormat::from_path(Path::new("a.GeoJSON")), Some(VectorFormat::GeoJson));
        assert_eq!(VectorFormat::from_path(Path::new("a.json")), Some(VectorFormat::GeoJson));
        assert_eq!(VectorFormat::from_path(Path::new("a.txt")), None);
        assert_eq!(VectorFormat::from_path(Path::new("noext")), None);
    }
}
