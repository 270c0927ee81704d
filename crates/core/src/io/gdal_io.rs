//! OGR vector reading and writing using GDAL
//!
//! Reads any OGR-readable layer (shapefiles included), reprojecting every
//! geometry into the target CRS. Writes ESRI Shapefile or GeoPackage.

use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::vector::{FieldValue, LayerAccess, LayerOptions, OGRFieldType, OGRwkbGeometryType, ToGdal};
use gdal::{Dataset, DatasetOptions, DriverManager, GdalOpenFlags};
use std::path::Path;
use tracing::{debug, warn};

use super::{rank_features, RawFeature, ReadOptions, WriteOptions};
use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, FeatureCollection};

fn spatial_ref(crs: &CRS) -> Result<SpatialRef> {
    let mut srs = if let Some(epsg) = crs.epsg() {
        SpatialRef::from_epsg(epsg)?
    } else if let Some(wkt) = crs.wkt() {
        SpatialRef::from_wkt(wkt)?
    } else {
        return Err(Error::Other(format!("cannot build a spatial reference for {}", crs)));
    };
    // Keep x = longitude / easting regardless of the authority axis order
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

fn attribute_from_field(value: Option<FieldValue>) -> AttributeValue {
    match value {
        None => AttributeValue::Null,
        Some(FieldValue::IntegerValue(v)) => AttributeValue::Int(v as i64),
        Some(FieldValue::Integer64Value(v)) => AttributeValue::Int(v),
        Some(FieldValue::RealValue(v)) => AttributeValue::Float(v),
        Some(FieldValue::StringValue(s)) => AttributeValue::String(s),
        Some(other) => AttributeValue::String(format!("{:?}", other)),
    }
}

/// Read the first layer of an OGR dataset
///
/// # Arguments
/// * `path` - Path to the vector file
/// * `options` - Rank attribute names, target CRS and attribute encoding
pub fn read_ogr(path: &Path, options: &ReadOptions) -> Result<FeatureCollection> {
    let encoding = format!("ENCODING={}", options.encoding);
    let open_options = [encoding.as_str()];
    let dataset = Dataset::open_ex(
        path,
        DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_VECTOR,
            open_options: Some(&open_options),
            ..Default::default()
        },
    )?;
    let mut layer = dataset.layer(0)?;

    let target = spatial_ref(&options.target_crs)?;
    let transform = match layer.spatial_ref() {
        Some(mut source_srs) => {
            source_srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
            debug!("{}: reprojecting to {}", path.display(), options.target_crs);
            Some(CoordTransform::new(&source_srs, &target)?)
        }
        None => {
            warn!("{}: no spatial reference, assuming {}", path.display(), options.target_crs);
            None
        }
    };

    let mut raw = Vec::new();
    for feature in layer.features() {
        let field_index = feature
            .field_index(&options.rank_field)
            .or_else(|_| feature.field_index(&options.rank_field_alias))
            .ok();
        let rank = match field_index {
            Some(idx) => Some(attribute_from_field(feature.field(idx)?)),
            None => None,
        };

        let geometry = match feature.geometry() {
            Some(geom) => {
                let geom = match &transform {
                    Some(ct) => geom.transform(ct)?,
                    None => geom.clone(),
                };
                Some(geom.to_geo()?)
            }
            None => None,
        };
        raw.push(RawFeature { geometry, rank });
    }

    Ok(FeatureCollection {
        features: rank_features(path, raw, options)?,
        crs: transform.map(|_| options.target_crs.clone()),
    })
}

/// Write ranked features with OGR (`.shp` or `.gpkg`)
pub fn write_ogr(collection: &FeatureCollection, path: &Path, options: &WriteOptions) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let driver_name = match ext.as_str() {
        "shp" => "ESRI Shapefile",
        "gpkg" => "GPKG",
        _ => return Err(Error::UnsupportedFormat(path.to_path_buf())),
    };

    if path.exists() {
        std::fs::remove_file(path)?;
    }

    let driver = DriverManager::get_driver_by_name(driver_name)?;
    let mut dataset = driver.create_vector_only(path)?;
    let srs = collection.crs.as_ref().map(spatial_ref).transpose()?;
    let layer_name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("ranks");

    let mut layer = dataset.create_layer(LayerOptions {
        name: layer_name,
        srs: srs.as_ref(),
        ty: OGRwkbGeometryType::wkbMultiPolygon,
        options: None,
    })?;
    layer.create_defn_fields(&[(options.rank_field.as_str(), OGRFieldType::OFTInteger)])?;

    let fields = [options.rank_field.as_str()];
    for feature in collection.iter() {
        let value = [FieldValue::IntegerValue(feature.rank.value() as i32)];
        if options.explode {
            for part in &feature.geometry.0 {
                layer.create_feature_fields(part.to_gdal()?, &fields, &value)?;
            }
        } else {
            layer.create_feature_fields(feature.geometry.to_gdal()?, &fields, &value)?;
        }
    }

    Ok(())
}
