//! floodmax CLI - merge flood-depth rank layers into a maximum-depth map

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use floodmax_algorithms::hazard::merge_ranks;
use floodmax_algorithms::pipeline::{Pipeline, PipelineConfig, RunSummary};
use floodmax_algorithms::vector::area;
use floodmax_core::io::{read_features, ReadOptions};
use floodmax_core::{FeatureCollection, CRS};
use floodmax_parallel::ProcessingMode;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "floodmax")]
#[command(author, version, about = "Merge flood-depth rank layers keeping the deepest rank everywhere", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge every hazard layer of a directory into one rank map
    Merge {
        /// Directory of primary hazard layers (extra category in its `ex` subdirectory)
        #[arg(short, long, default_value = "shp")]
        input: PathBuf,
        /// Merged output file
        #[arg(short, long, default_value = "output/depth_maxall.geojson")]
        output: PathBuf,
        /// Scratch directory for per-source rank splits (wiped on every run)
        #[arg(long, default_value = "split")]
        split_dir: PathBuf,
        /// Scratch directory for dissolved rank layers (wiped on every run)
        #[arg(long, default_value = "rank")]
        rank_dir: PathBuf,
        /// Name of the extra-category subdirectory
        #[arg(long, default_value = "ex")]
        extra_subdir: String,
        /// Target CRS
        #[arg(long, default_value = "EPSG:6668")]
        crs: String,
        /// Rank attribute name
        #[arg(long, default_value = "value")]
        rank_field: String,
        /// Alternate rank attribute name
        #[arg(long, default_value = "rank")]
        rank_alias: String,
        /// Attribute encoding of shapefile sources
        #[arg(long, default_value = "CP932")]
        encoding: String,
        /// Decompose fan-out: a thread count, `seq` or `par` (default: all cores)
        #[arg(short = 'j', long, value_name = "N|seq|par", conflicts_with = "sequential")]
        threads: Option<ProcessingMode>,
        /// Decompose sources one at a time
        #[arg(long)]
        sequential: bool,
        /// Overlay pieces at or below this area are dropped (CRS units squared)
        #[arg(long, default_value = "1e-12")]
        sliver_epsilon: f64,
        /// Write one record per polygon part
        #[arg(long)]
        explode: bool,
        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show information about a ranked hazard layer
    Info {
        /// Input vector file
        input: PathBuf,
        /// CRS the file is expected in
        #[arg(long, default_value = "EPSG:6668")]
        crs: String,
        /// Rank attribute name
        #[arg(long, default_value = "value")]
        rank_field: String,
        /// Alternate rank attribute name
        #[arg(long, default_value = "rank")]
        rank_alias: String,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_layer(path: &PathBuf, options: &ReadOptions) -> Result<FeatureCollection> {
    let pb = spinner("Reading layer...");
    let layer = read_features(path, options)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} feature(s)", layer.len());
    Ok(layer)
}

fn processing_mode(threads: Option<ProcessingMode>, sequential: bool) -> ProcessingMode {
    if sequential {
        return ProcessingMode::Sequential;
    }
    threads.unwrap_or_default()
}

fn print_summary(summary: &RunSummary) {
    println!("Merged map saved to: {}", summary.output.display());
    println!(
        "  Sources: {} primary, {} extra",
        summary.sources, summary.extra_sources
    );
    println!("  Active ranks: {:?}", summary.active_ranks);
    if !summary.extra_ranks.is_empty() {
        println!("  Extra ranks: {:?}", summary.extra_ranks);
    }
    println!("  Records: {}", summary.regions);
    for (rank, area) in summary.area_by_rank.iter().rev() {
        println!("  Rank {}: {:.6e} units²", rank, area);
    }
    println!("  Processing time: {:.2}s", summary.elapsed_secs);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Merge ────────────────────────────────────────────────────
        Commands::Merge {
            input,
            output,
            split_dir,
            rank_dir,
            extra_subdir,
            crs,
            rank_field,
            rank_alias,
            encoding,
            threads,
            sequential,
            sliver_epsilon,
            explode,
            json,
        } => {
            let config = PipelineConfig {
                input_dir: input,
                extra_subdir,
                split_dir,
                rank_dir,
                output_path: output,
                target_crs: crs.parse::<CRS>().context("Invalid --crs")?,
                rank_field,
                rank_field_alias: rank_alias,
                source_encoding: encoding,
                processing: processing_mode(threads, sequential),
                sliver_epsilon,
                explode_output: explode,
            };

            info!("Decompose mode: {}", config.processing);
            let pb = spinner("Merging rank layers...");
            let result = Pipeline::new(config).run();
            pb.finish_and_clear();
            let summary = result.context("Merge failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }

        // ── Info ─────────────────────────────────────────────────────
        Commands::Info {
            input,
            crs,
            rank_field,
            rank_alias,
        } => {
            let start = Instant::now();
            let options = ReadOptions {
                rank_field,
                rank_field_alias: rank_alias,
                target_crs: crs.parse::<CRS>().context("Invalid --crs")?,
                ..ReadOptions::default()
            };
            let layer = read_layer(&input, &options)?;
            let crs = layer
                .crs
                .as_ref()
                .map(|c| c.to_string())
                .unwrap_or_else(|| format!("{} (assumed)", options.target_crs));

            println!("File: {}", input.display());
            println!("Features: {}", layer.len());
            println!("CRS: {}", crs);

            let layers = merge_ranks(layer);
            if layers.is_empty() {
                println!("Ranks: none");
            }
            for rank_layer in layers.iter().rev() {
                println!(
                    "  Rank {}: {} part(s), {:.6e} units²",
                    rank_layer.rank,
                    rank_layer.geometry.0.len(),
                    area(&rank_layer.geometry)
                );
            }
            info!("Inspected in {:.2?}", start.elapsed());
        }
    }

    Ok(())
}
