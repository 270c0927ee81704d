//! Error types for floodmax

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for floodmax operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input directory {} does not exist (created it; place hazard files there)", .0.display())]
    InputDirMissing(PathBuf),

    #[error("no hazard files found in {}", .0.display())]
    NoInputFiles(PathBuf),

    #[error("{}: no feature carries a rank attribute (looked for {candidates:?})", path.display())]
    MissingRankAttribute {
        path: PathBuf,
        candidates: Vec<String>,
    },

    #[error("{}: feature {index} has non-integer rank value {value}", path.display())]
    InvalidRankValue {
        path: PathBuf,
        index: usize,
        value: String,
    },

    #[error("rank {0} is not a recognized flood-depth rank")]
    UnrecognizedRank(i64),

    #[error("rank {0} appears more than once")]
    DuplicateRank(u8),

    #[error("no active ranks: there is no hazard data to merge")]
    NoActiveRanks,

    #[error("source name '{stem}' is used by more than one file in {}", dir.display())]
    DuplicateSource { stem: String, dir: PathBuf },

    #[error("unsupported geometry type {0}: only polygons are merged")]
    UnsupportedGeometry(String),

    #[error("unsupported vector format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GDAL error: {0}")]
    #[cfg(feature = "gdal")]
    Gdal(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("parallel execution failed: {0}")]
    Parallel(#[from] floodmax_parallel::ParallelError),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "gdal")]
impl From<gdal::errors::GdalError> for Error {
    fn from(e: gdal::errors::GdalError) -> Self {
        Error::Gdal(e.to_string())
    }
}

/// Result type alias for floodmax operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use floodmax_parallel::ParallelError;
    use std::error::Error as _;

    #[test]
    fn test_parallel_error_keeps_source() {
        let err: Error = ParallelError::ZeroThreads.into();
        assert!(matches!(err, Error::Parallel(ParallelError::ZeroThreads)));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), ParallelError::ZeroThreads.to_string());
    }
}
