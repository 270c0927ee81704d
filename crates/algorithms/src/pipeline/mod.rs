//! On-disk merge run
//!
//! Drives the hazard stages over a directory of source layers:
//!
//! 1. decompose every source into `split/<stem>_<rank>.geojson`
//! 2. dissolve each rank into `rank/rank_<rank>.geojson`
//! 3. reduce the primary ranks and fill gaps from the extra category
//! 4. write the merged layer
//!
//! The extra category lives in the `ex` subdirectory of each directory and
//! goes through stages 1 and 2 in its own namespace.

mod config;

pub use config::PipelineConfig;

use floodmax_core::io::{is_vector_source, read_features, write_features};
use floodmax_core::{Error, Rank, Result};
use floodmax_parallel::ParallelStrategy;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::hazard::{decompose, merge_rank, overlay_extra, reduce, RankLayer, ResultPartition};

/// Source files found for a run, sorted by path
#[derive(Debug, Clone, Default)]
pub struct Sources {
    pub primary: Vec<PathBuf>,
    pub extra: Vec<PathBuf>,
}

/// Dissolved rank layers, ascending by rank
#[derive(Debug, Clone, Default)]
pub struct MergedRanks {
    pub primary: Vec<RankLayer>,
    pub extra: Vec<RankLayer>,
}

/// What a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub sources: usize,
    pub extra_sources: usize,
    /// Primary ranks with data, ascending
    pub active_ranks: Vec<u8>,
    /// Extra-category ranks with data, ascending
    pub extra_ranks: Vec<u8>,
    /// Records in the output
    pub regions: usize,
    /// Output area per rank in CRS units squared
    pub area_by_rank: BTreeMap<u8, f64>,
    pub output: PathBuf,
    pub elapsed_secs: f64,
}

/// A configured merge run
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage. Nothing is written to `output_path` unless all
    /// stages succeed.
    pub fn run(&self) -> Result<RunSummary> {
        let start = Instant::now();

        let sources = self.discover()?;
        self.prepare_scratch(&sources)?;

        info!(
            "1/4 decompose: {} source(s), {} extra, {} worker thread(s)",
            sources.primary.len(),
            sources.extra.len(),
            self.config.processing.threads()
        );
        self.decompose(&sources)?;

        info!("2/4 merge same-rank features");
        let merged = self.merge(&sources)?;

        info!("3/4 reduce overlapping ranks");
        let active_ranks = rank_values(&merged.primary);
        let extra_ranks = rank_values(&merged.extra);
        let partition = self.reduce(merged)?;

        info!("4/4 write {}", self.config.output_path.display());
        self.write(&partition)?;

        let summary = RunSummary {
            sources: sources.primary.len(),
            extra_sources: sources.extra.len(),
            active_ranks,
            extra_ranks,
            regions: if self.config.explode_output {
                partition.regions().iter().map(|r| r.geometry.0.len()).sum()
            } else {
                partition.len()
            },
            area_by_rank: partition
                .area_by_rank()
                .into_iter()
                .map(|(rank, area)| (rank.value(), area))
                .collect(),
            output: self.config.output_path.clone(),
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        info!("finished in {:.2?}", start.elapsed());
        Ok(summary)
    }

    /// Validate the configuration and list the source files.
    ///
    /// A missing input directory is created so the user knows where to put
    /// the sources, and the run fails. The extra category is optional.
    pub fn discover(&self) -> Result<Sources> {
        self.config.validate()?;

        let input = &self.config.input_dir;
        if !input.is_dir() {
            fs::create_dir_all(input)?;
            return Err(Error::InputDirMissing(input.clone()));
        }
        let primary = list_sources(input)?;
        if primary.is_empty() {
            return Err(Error::NoInputFiles(input.clone()));
        }

        let extra_dir = self.config.extra_input_dir();
        let extra = if extra_dir.is_dir() {
            list_sources(&extra_dir)?
        } else {
            Vec::new()
        };
        if !extra.is_empty() {
            info!("found {} extra-category source(s)", extra.len());
        }

        Ok(Sources { primary, extra })
    }

    /// Empty the scratch directories left by a previous run
    pub fn prepare_scratch(&self, sources: &Sources) -> Result<()> {
        reset_dir(&self.config.split_dir)?;
        reset_dir(&self.config.rank_dir)?;
        if !sources.extra.is_empty() {
            fs::create_dir_all(self.config.extra_split_dir())?;
            fs::create_dir_all(self.config.extra_rank_dir())?;
        }
        Ok(())
    }

    /// Split every source into per-rank files, one work item per source
    pub fn decompose(&self, sources: &Sources) -> Result<()> {
        self.decompose_into(&sources.primary, &self.config.split_dir)?;
        self.decompose_into(&sources.extra, &self.config.extra_split_dir())
    }

    /// Dissolve the split files of each category into rank layers
    pub fn merge(&self, sources: &Sources) -> Result<MergedRanks> {
        let primary = self.merge_dir(&self.config.split_dir, &self.config.rank_dir)?;
        let extra = if sources.extra.is_empty() {
            Vec::new()
        } else {
            info!("merging extra category");
            self.merge_dir(&self.config.extra_split_dir(), &self.config.extra_rank_dir())?
        };
        Ok(MergedRanks { primary, extra })
    }

    /// Priority-reduce the primary ranks, then fill gaps from the extra ranks
    pub fn reduce(&self, merged: MergedRanks) -> Result<ResultPartition> {
        let params = self.config.reduce_params();
        let reduction = reduce(merged.primary, &params)?;
        if merged.extra.is_empty() {
            return Ok(reduction.partition);
        }
        overlay_extra(reduction.partition, merged.extra, &params)
    }

    pub fn write(&self, partition: &ResultPartition) -> Result<()> {
        let collection = partition.to_feature_collection(Some(self.config.target_crs.clone()));
        write_features(&collection, &self.config.output_path, &self.config.write_options())
    }

    fn decompose_into(&self, sources: &[PathBuf], split_dir: &Path) -> Result<()> {
        if sources.is_empty() {
            return Ok(());
        }
        let read_options = self.config.read_options();
        let write_options = self.config.scratch_write_options();

        let written = self
            .config
            .processing
            .try_par_map(0..sources.len(), |i| -> Result<usize> {
                let source = &sources[i];
                let stem = source_stem(source)?;
                let parts = decompose(read_features(source, &read_options)?);
                for (rank, part) in &parts {
                    let path = split_dir.join(format!("{}_{}.geojson", stem, rank));
                    write_features(part, &path, &write_options)?;
                }
                debug!("{}: {} rank(s)", source.display(), parts.len());
                Ok(parts.len())
            })??;

        debug!("wrote {} split file(s) to {}", written.iter().sum::<usize>(), split_dir.display());
        Ok(())
    }

    fn merge_dir(&self, split_dir: &Path, rank_dir: &Path) -> Result<Vec<RankLayer>> {
        let read_options = self.config.read_options();
        let write_options = self.config.scratch_write_options();
        let mut by_rank = split_files_by_rank(split_dir)?;

        let mut layers = Vec::new();
        for rank in Rank::RECOGNIZED {
            let files = by_rank.remove(&rank).unwrap_or_default();
            let mut features = Vec::new();
            for file in &files {
                features.extend(read_features(file, &read_options)?);
            }

            match merge_rank(rank, features)? {
                Some(layer) => {
                    info!("rank {}: dissolved {} split file(s)", rank, files.len());
                    let path = rank_dir.join(rank_file_name(rank));
                    let crs = Some(self.config.target_crs.clone());
                    write_features(&layer.to_feature_collection(crs), &path, &write_options)?;
                    layers.push(layer);
                }
                None => {
                    purge_rank_files(rank_dir, rank)?;
                    info!("rank {} has no data", rank);
                }
            }
        }
        Ok(layers)
    }
}

fn rank_values(layers: &[RankLayer]) -> Vec<u8> {
    layers.iter().map(|l| l.rank.value()).collect()
}

fn rank_file_name(rank: Rank) -> String {
    format!("rank_{}.geojson", rank)
}

/// Readable vector files directly inside `dir`, sorted, with unique stems
fn list_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if is_vector_source(&path) {
            sources.push(path);
        }
    }
    sources.sort();

    let mut seen: HashMap<String, &Path> = HashMap::new();
    for path in &sources {
        let stem = source_stem(path)?;
        if let Some(other) = seen.insert(stem.clone(), path) {
            debug!("{} and {} share a stem", other.display(), path.display());
            return Err(Error::DuplicateSource {
                stem,
                dir: dir.to_path_buf(),
            });
        }
    }
    Ok(sources)
}

fn source_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::UnsupportedFormat(path.to_path_buf()))
}

/// Group `<stem>_<rank>.geojson` files by their rank suffix
fn split_files_by_rank(split_dir: &Path) -> Result<BTreeMap<Rank, Vec<PathBuf>>> {
    let mut groups: BTreeMap<Rank, Vec<PathBuf>> = BTreeMap::new();
    for entry in fs::read_dir(split_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let rank = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.rsplit_once('_'))
            .and_then(|(_, suffix)| suffix.parse::<i64>().ok())
            .and_then(|v| Rank::new(v).ok());
        if let Some(rank) = rank {
            groups.entry(rank).or_default().push(path);
        }
    }
    for files in groups.values_mut() {
        files.sort();
    }
    Ok(groups)
}

/// Remove every `rank_<rank>.*` file so an absent rank leaves nothing behind
fn purge_rank_files(rank_dir: &Path, rank: Rank) -> Result<()> {
    if !rank_dir.is_dir() {
        return Ok(());
    }
    let stem = format!("rank_{}", rank);
    for entry in fs::read_dir(rank_dir)? {
        let path = entry?.path();
        if path.is_file() && path.file_stem().and_then(|s| s.to_str()) == Some(stem.as_str()) {
            info!("removing stale {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        debug!("clearing {}", dir.display());
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn test_split_files_grouped_by_suffix() {
        let tmp = TempDir::new().unwrap();
        for name in ["a_2.geojson", "b_2.geojson", "river_1_4.geojson", "notes.txt", "x_9.geojson"] {
            touch(&tmp.path().join(name));
        }

        let groups = split_files_by_rank(tmp.path()).unwrap();
        let keys: Vec<u8> = groups.keys().map(|r| r.value()).collect();
        assert_eq!(keys, vec![2, 4]);
        assert_eq!(groups[&Rank::new(2).unwrap()].len(), 2);
    }

    #[test]
    fn test_purge_only_matching_rank() {
        let tmp = TempDir::new().unwrap();
        for name in ["rank_3.geojson", "rank_3.shp", "rank_3.dbf", "rank_4.geojson"] {
            touch(&tmp.path().join(name));
        }

        purge_rank_files(tmp.path(), Rank::new(3).unwrap()).unwrap();
        let left: Vec<_> = fs::read_dir(tmp.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(left, vec![std::ffi::OsString::from("rank_4.geojson")]);
    }

    #[test]
    fn test_list_sources_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        for name in ["b.geojson", "a.json", "readme.md"] {
            touch(&tmp.path().join(name));
        }
        touch(&tmp.path().join("ex").join("c.geojson"));

        let sources = list_sources(tmp.path()).unwrap();
        let names: Vec<_> = sources.iter().map(|p| p.file_name().unwrap().to_owned()).collect();
        assert_eq!(names, vec!["a.json", "b.geojson"]);
    }

    #[test]
    fn test_duplicate_stem_rejected() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("river.geojson"));
        touch(&tmp.path().join("river.json"));
        assert!(matches!(
            list_sources(tmp.path()),
            Err(Error::DuplicateSource { stem, .. }) if stem == "river"
        ));
    }

    #[test]
    fn test_reset_dir_clears_contents() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("split");
        touch(&dir.join("old_1.geojson"));
        reset_dir(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }
}
