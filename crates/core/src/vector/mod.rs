//! Vector data structures: ranks, ranked polygon features and collections

use geo_types::{Geometry, MultiPolygon};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::crs::CRS;
use crate::error::{Error, Result};

/// Flood-depth severity rank.
///
/// Only values in [`Rank::RECOGNIZED`] can be constructed. Higher ranks are
/// more severe and win wherever they overlap a lower rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rank(u8);

impl Rank {
    /// Lowest recognized rank
    pub const MIN: u8 = 1;
    /// Highest recognized rank
    pub const MAX: u8 = 7;

    /// Every recognized rank, ascending
    pub const RECOGNIZED: [Rank; 7] = [
        Rank(1), Rank(2), Rank(3), Rank(4), Rank(5), Rank(6), Rank(7),
    ];

    /// Create a rank, failing for values outside the recognized set
    pub fn new(value: i64) -> Result<Self> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Rank(value as u8))
        } else {
            Err(Error::UnrecognizedRank(value))
        }
    }

    /// Numeric value of the rank
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rank {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        Rank::new(value)
    }
}

impl From<Rank> for i64 {
    fn from(rank: Rank) -> Self {
        rank.0 as i64
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw attribute value as read from a source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Interpret the value as an integer.
    ///
    /// Returns `None` for null, `Some(Err(text))` for values that are present
    /// but not integral (e.g. `2.5`, `"deep"`).
    pub fn as_integer(&self) -> Option<std::result::Result<i64, String>> {
        match self {
            AttributeValue::Null => None,
            AttributeValue::Int(v) => Some(Ok(*v)),
            AttributeValue::Float(v) => Some(float_to_integer(*v)),
            AttributeValue::String(s) => {
                let t = s.trim();
                if t.is_empty() {
                    return None;
                }
                Some(
                    t.parse::<i64>()
                        .or_else(|_| t.parse::<f64>().map_err(|_| s.clone()).and_then(float_to_integer)),
                )
            }
            AttributeValue::Bool(b) => Some(Err(b.to_string())),
        }
    }
}

fn float_to_integer(v: f64) -> std::result::Result<i64, String> {
    if v.is_finite() && v.fract() == 0.0 {
        Ok(v as i64)
    } else {
        Err(v.to_string())
    }
}

/// A polygon feature carrying exactly one rank
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFeature {
    pub geometry: MultiPolygon<f64>,
    pub rank: Rank,
}

impl RankedFeature {
    pub fn new(geometry: MultiPolygon<f64>, rank: Rank) -> Self {
        Self { geometry, rank }
    }

    /// Build a feature from an arbitrary geometry.
    ///
    /// Polygons are promoted to multipolygons. Returns `Ok(None)` for empty
    /// geometries and `UnsupportedGeometry` for anything that is not areal.
    pub fn from_geometry(geometry: Geometry<f64>, rank: Rank) -> Result<Option<Self>> {
        let mp = match geometry {
            Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
            Geometry::MultiPolygon(mp) => mp,
            Geometry::Rect(r) => MultiPolygon::new(vec![r.to_polygon()]),
            Geometry::Triangle(t) => MultiPolygon::new(vec![t.to_polygon()]),
            other => return Err(Error::UnsupportedGeometry(geometry_type_name(&other).to_string())),
        };
        if is_empty(&mp) {
            return Ok(None);
        }
        Ok(Some(Self::new(mp, rank)))
    }
}

/// True when a multipolygon has no polygon with a usable exterior ring
pub fn is_empty(mp: &MultiPolygon<f64>) -> bool {
    mp.0.iter().all(|p| p.exterior().0.len() < 4)
}

fn geometry_type_name(geom: &Geometry<f64>) -> &'static str {
    match geom {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Collection of ranked features sharing one CRS
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<RankedFeature>,
    /// CRS of every feature; `None` when the source did not declare one
    pub crs: Option<CRS>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self { features: Vec::new(), crs: None }
    }

    pub fn with_crs(crs: CRS) -> Self {
        Self { features: Vec::new(), crs: Some(crs) }
    }

    pub fn push(&mut self, feature: RankedFeature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedFeature> {
        self.features.iter()
    }

    /// Distinct ranks present, ascending
    pub fn ranks(&self) -> BTreeSet<Rank> {
        self.features.iter().map(|f| f.rank).collect()
    }
}

impl IntoIterator for FeatureCollection {
    type Item = RankedFeature;
    type IntoIter = std::vec::IntoIter<RankedFeature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

impl FromIterator<RankedFeature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = RankedFeature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
            crs: None,
        }
    }
}

impl Extend<RankedFeature> for FeatureCollection {
    fn extend<I: IntoIterator<Item = RankedFeature>>(&mut self, iter: I) {
        self.features.extend(iter);
    }
}
