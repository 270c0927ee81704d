//! Coordinate Reference System handling

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
        }
    }

    /// JGD2011 geographic (EPSG:6668), the default merge target
    pub fn jgd2011() -> Self {
        Self::from_epsg(6668)
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }

        // Textual WKT comparison is imperfect but conservative
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }

        false
    }

    /// OGC URN form used by the legacy GeoJSON `crs` member,
    /// e.g. `urn:ogc:def:crs:EPSG::6668`.
    pub fn to_urn(&self) -> Option<String> {
        self.epsg.map(|code| format!("urn:ogc:def:crs:EPSG::{}", code))
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            return format!("WKT:{}", wkt.chars().take(50).collect::<String>());
        }
        "Unknown".to_string()
    }
}

impl FromStr for CRS {
    type Err = Error;

    /// Accepts `EPSG:6668`, `epsg:6668`, `6668`, `urn:ogc:def:crs:EPSG::6668`
    /// and the legacy `urn:ogc:def:crs:OGC:1.3:CRS84` alias for WGS84.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("urn:ogc:def:crs:OGC:1.3:CRS84") {
            return Ok(Self::wgs84());
        }

        let code = if let Some(rest) = s.strip_prefix("urn:ogc:def:crs:EPSG:") {
            // Optional version segment: urn:ogc:def:crs:EPSG:<version>:<code>
            rest.rsplit(':').next().unwrap_or(rest)
        } else if s.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("epsg:")) {
            &s[5..]
        } else {
            s
        };

        code.parse::<u32>()
            .map(Self::from_epsg)
            .map_err(|_| Error::InvalidParameter {
                name: "crs",
                value: s.to_string(),
                reason: "expected an EPSG code such as EPSG:6668".to_string(),
            })
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::jgd2011()
    }
}
