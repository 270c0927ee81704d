//! Native GeoJSON reading/writing (without GDAL dependency)
//!
//! Uses the `geojson` crate. The legacy `crs` member is honoured on read and
//! emitted on write; without it the data is assumed to already be in the
//! target CRS and the collection's `crs` stays `None`. Reprojection needs
//! the `gdal` feature.

use geojson::{FeatureCollection as GeoJsonCollection, GeoJson, JsonObject, JsonValue};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

use super::{rank_features, RawFeature, ReadOptions, WriteOptions};
use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, FeatureCollection};

/// Read a GeoJSON file into a ranked feature collection
pub fn read_geojson(path: &Path, options: &ReadOptions) -> Result<FeatureCollection> {
    let text = std::fs::read_to_string(path)?;
    read_geojson_from_str(&text, path, options)
}

/// Parse GeoJSON text into a ranked feature collection.
///
/// `source` is only used for error messages and logging.
pub fn read_geojson_from_str(text: &str, source: &Path, options: &ReadOptions) -> Result<FeatureCollection> {
    let (features, foreign_members) = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => (fc.features, fc.foreign_members),
        GeoJson::Feature(f) => (vec![f], None),
        GeoJson::Geometry(_) => {
            return Err(Error::MissingRankAttribute {
                path: source.to_path_buf(),
                candidates: options.candidates(),
            })
        }
    };

    let declared = foreign_members.as_ref().map(declared_crs).transpose()?.flatten();
    match &declared {
        Some(crs) if !crs.is_equivalent(&options.target_crs) => {
            return Err(Error::CrsMismatch(crs.identifier(), options.target_crs.identifier()));
        }
        Some(_) => {}
        None => debug!("{}: no crs member, assuming {}", source.display(), options.target_crs),
    }

    let mut raw = Vec::with_capacity(features.len());
    for feature in features {
        let geometry = match feature.geometry {
            Some(g) => Some(geo_types::Geometry::<f64>::try_from(g.value)?),
            None => None,
        };
        let rank = feature.properties.as_ref().and_then(|props| {
            props
                .get(&options.rank_field)
                .or_else(|| props.get(&options.rank_field_alias))
                .map(attribute_from_json)
        });
        raw.push(RawFeature { geometry, rank });
    }

    Ok(FeatureCollection {
        features: rank_features(source, raw, options)?,
        crs: declared,
    })
}

/// Write a ranked feature collection as GeoJSON
pub fn write_geojson(collection: &FeatureCollection, path: &Path, options: &WriteOptions) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, &to_geojson(collection, options))?;
    writer.flush()?;
    Ok(())
}

fn to_geojson(collection: &FeatureCollection, options: &WriteOptions) -> GeoJson {
    let mut features = Vec::with_capacity(collection.len());
    for feature in collection.iter() {
        let mut properties = JsonObject::new();
        properties.insert(options.rank_field.clone(), JsonValue::from(feature.rank.value()));

        let values: Vec<geojson::Value> = if options.explode {
            feature.geometry.0.iter().map(geojson::Value::from).collect()
        } else {
            vec![geojson::Value::from(&feature.geometry)]
        };

        features.extend(values.into_iter().map(|value| geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(value)),
            id: None,
            properties: Some(properties.clone()),
            foreign_members: None,
        }));
    }

    let foreign_members = collection.crs.as_ref().and_then(CRS::to_urn).map(|urn| {
        let mut members = JsonObject::new();
        members.insert(
            "crs".to_string(),
            serde_json::json!({ "type": "name", "properties": { "name": urn } }),
        );
        members
    });

    GeoJson::FeatureCollection(GeoJsonCollection {
        bbox: None,
        features,
        foreign_members,
    })
}

/// CRS named by a legacy `crs` member, if any
fn declared_crs(members: &JsonObject) -> Result<Option<CRS>> {
    let name = members
        .get("crs")
        .and_then(|crs| crs.get("properties"))
        .and_then(|props| props.get("name"))
        .and_then(JsonValue::as_str);
    name.map(str::parse::<CRS>).transpose()
}

fn attribute_from_json(value: &JsonValue) -> AttributeValue {
    match value {
        JsonValue::Null => AttributeValue::Null,
        JsonValue::Bool(b) => AttributeValue::Bool(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => AttributeValue::String(s.clone()),
        other => AttributeValue::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{Rank, RankedFeature};
    use geo_types::{polygon, MultiPolygon};
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn src() -> PathBuf {
        PathBuf::from("test.geojson")
    }

    const TWO_RANKS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"value": 2, "name": "a"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[2,0],[2,2],[0,2],[0,0]]]}},
            {"type": "Feature", "properties": {"value": 4.0},
             "geometry": {"type": "MultiPolygon", "coordinates": [[[[5,5],[6,5],[6,6],[5,6],[5,5]]]]}}
        ]
    }"#;

    #[test]
    fn test_read_ranks_and_geometry() {
        let fc = read_geojson_from_str(TWO_RANKS, &src(), &ReadOptions::default()).unwrap();
        assert_eq!(fc.len(), 2);
        assert_eq!(fc.features[0].rank.value(), 2);
        assert_eq!(fc.features[1].rank.value(), 4);
        // No crs member: coordinates are taken as-is and the CRS stays undeclared
        assert_eq!(fc.crs, None);
    }

    #[test]
    fn test_alias_attribute() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"rank": "3"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}
        ]}"#;
        let fc = read_geojson_from_str(text, &src(), &ReadOptions::default()).unwrap();
        assert_eq!(fc.features[0].rank.value(), 3);
    }

    #[test]
    fn test_missing_attribute() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"depth": 3},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}
        ]}"#;
        let err = read_geojson_from_str(text, &src(), &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MissingRankAttribute { .. }));
    }

    #[test]
    fn test_crs_mismatch_is_rejected() {
        let text = r#"{"type": "FeatureCollection",
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::4326"}},
            "features": []}"#;
        let err = read_geojson_from_str(text, &src(), &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::CrsMismatch(_, _)));
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.geojson");

        let square = polygon![(x: 0.0, y: 0.0), (x: 3.0, y: 0.0), (x: 3.0, y: 3.0), (x: 0.0, y: 3.0)];
        let mut fc = FeatureCollection::with_crs(CRS::jgd2011());
        fc.push(RankedFeature::new(MultiPolygon::new(vec![square]), Rank::new(5).unwrap()));
        write_geojson(&fc, &path, &WriteOptions::default()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("urn:ogc:def:crs:EPSG::6668"));

        let loaded = read_geojson(&path, &ReadOptions::default()).unwrap();
        assert_eq!(loaded.features, fc.features);
        assert_eq!(loaded.crs, Some(CRS::jgd2011()));
    }

    #[test]
    fn test_explode_writes_one_record_per_part() {
        let a = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let b = polygon![(x: 5.0, y: 5.0), (x: 6.0, y: 5.0), (x: 6.0, y: 6.0), (x: 5.0, y: 6.0)];
        let mut fc = FeatureCollection::new();
        fc.push(RankedFeature::new(MultiPolygon::new(vec![a, b]), Rank::new(1).unwrap()));

        let dir = tempdir().unwrap();
        let path = dir.path().join("exploded.geojson");
        let options = WriteOptions { explode: true, ..Default::default() };
        write_geojson(&fc, &path, &options).unwrap();
        let back = read_geojson(&path, &ReadOptions::default()).unwrap();
        assert_eq!(back.len(), 2);
        assert!(back.iter().all(|f| f.rank.value() == 1 && f.geometry.0.len() == 1));
    }
}
