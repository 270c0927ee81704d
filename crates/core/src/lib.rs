//! # floodmax core
//!
//! Core types, traits and vector I/O for flood-depth rank merging.
//!
//! This crate provides:
//! - `Rank`: a recognized flood-depth severity rank
//! - `RankedFeature` / `FeatureCollection`: polygon features carrying one rank
//! - `CRS`: Coordinate Reference System handling
//! - Algorithm traits for consistent API
//! - I/O for GeoJSON (native) and OGR formats (`gdal` feature)

pub mod crs;
pub mod error;
pub mod io;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use vector::{FeatureCollection, Rank, RankedFeature};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::vector::{FeatureCollection, Rank, RankedFeature};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in floodmax.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
