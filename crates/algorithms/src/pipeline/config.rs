//! Pipeline configuration

use floodmax_core::io::{ReadOptions, VectorFormat, WriteOptions};
use floodmax_core::{Error, Result, CRS};
use floodmax_parallel::ProcessingMode;
use std::path::{Path, PathBuf};

use crate::hazard::ReduceParams;

/// Every knob of a merge run.
///
/// The defaults reproduce the conventional directory layout:
///
/// | field | default |
/// |---|---|
/// | `input_dir` | `./shp` |
/// | `extra_subdir` | `ex` |
/// | `split_dir` | `./split` |
/// | `rank_dir` | `./rank` |
/// | `output_path` | `./output/depth_maxall.geojson` |
/// | `target_crs` | EPSG:6668 (JGD2011) |
/// | `rank_field` / `rank_field_alias` | `value` / `rank` |
/// | `source_encoding` | `CP932` |
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding the primary hazard sources
    pub input_dir: PathBuf,
    /// Subdirectory of `input_dir` holding the extra-category sources
    pub extra_subdir: String,
    /// Scratch directory for per-source, per-rank collections
    pub split_dir: PathBuf,
    /// Scratch directory for dissolved rank layers
    pub rank_dir: PathBuf,
    /// Final merged layer
    pub output_path: PathBuf,
    /// CRS every source is brought into
    pub target_crs: CRS,
    /// Canonical rank attribute name, also used for every file written
    pub rank_field: String,
    /// Rank attribute name accepted when `rank_field` is missing
    pub rank_field_alias: String,
    /// Attribute encoding of shapefile sources
    pub source_encoding: String,
    /// How the decompose stage fans out over sources
    pub processing: ProcessingMode,
    /// Overlay pieces at or below this area are dropped
    pub sliver_epsilon: f64,
    /// Write one output record per polygon part
    pub explode_output: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("shp"),
            extra_subdir: "ex".to_string(),
            split_dir: PathBuf::from("split"),
            rank_dir: PathBuf::from("rank"),
            output_path: PathBuf::from("output").join("depth_maxall.geojson"),
            target_crs: CRS::jgd2011(),
            rank_field: "value".to_string(),
            rank_field_alias: "rank".to_string(),
            source_encoding: "CP932".to_string(),
            processing: ProcessingMode::default(),
            sliver_epsilon: ReduceParams::default().sliver_epsilon,
            explode_output: false,
        }
    }
}

impl PipelineConfig {
    /// Default layout rooted at `root` instead of the working directory
    pub fn in_dir(root: &Path) -> Self {
        let defaults = Self::default();
        Self {
            input_dir: root.join(&defaults.input_dir),
            split_dir: root.join(&defaults.split_dir),
            rank_dir: root.join(&defaults.rank_dir),
            output_path: root.join(&defaults.output_path),
            ..defaults
        }
    }

    pub fn extra_input_dir(&self) -> PathBuf {
        self.input_dir.join(&self.extra_subdir)
    }

    pub fn extra_split_dir(&self) -> PathBuf {
        self.split_dir.join(&self.extra_subdir)
    }

    pub fn extra_rank_dir(&self) -> PathBuf {
        self.rank_dir.join(&self.extra_subdir)
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            rank_field: self.rank_field.clone(),
            rank_field_alias: self.rank_field_alias.clone(),
            target_crs: self.target_crs.clone(),
            encoding: self.source_encoding.clone(),
        }
    }

    /// Options for intermediate files, always one record per rank
    pub fn scratch_write_options(&self) -> WriteOptions {
        WriteOptions {
            rank_field: self.rank_field.clone(),
            explode: false,
        }
    }

    /// Options for the final output
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            rank_field: self.rank_field.clone(),
            explode: self.explode_output,
        }
    }

    pub fn reduce_params(&self) -> ReduceParams {
        ReduceParams {
            sliver_epsilon: self.sliver_epsilon,
        }
    }

    /// Check the configuration before anything touches the disk.
    ///
    /// Scratch directories are wiped at the start of a run, so neither may be
    /// the input directory or an ancestor of it. The output must be a format
    /// this build can write.
    pub fn validate(&self) -> Result<()> {
        if VectorFormat::from_path(&self.output_path).is_none() {
            return Err(Error::UnsupportedFormat(self.output_path.clone()));
        }
        if !self.sliver_epsilon.is_finite() || self.sliver_epsilon < 0.0 {
            return Err(Error::InvalidParameter {
                name: "sliver_epsilon",
                value: self.sliver_epsilon.to_string(),
                reason: "must be a finite, non-negative area".to_string(),
            });
        }
        if self.rank_field.is_empty() {
            return Err(Error::InvalidParameter {
                name: "rank_field",
                value: String::new(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.extra_subdir.is_empty() || Path::new(&self.extra_subdir).components().count() != 1 {
            return Err(Error::InvalidParameter {
                name: "extra_subdir",
                value: self.extra_subdir.clone(),
                reason: "must be a single directory name".to_string(),
            });
        }

        for (name, dir) in [("split_dir", &self.split_dir), ("rank_dir", &self.rank_dir)] {
            if self.input_dir.starts_with(dir) {
                return Err(Error::InvalidParameter {
                    name,
                    value: dir.display().to_string(),
                    reason: format!("would delete the input directory {}", self.input_dir.display()),
                });
            }
        }
        if self.split_dir == self.rank_dir {
            return Err(Error::InvalidParameter {
                name: "rank_dir",
                value: self.rank_dir.display().to_string(),
                reason: "must differ from split_dir".to_string(),
            });
        }
        Ok(())
    }
}
