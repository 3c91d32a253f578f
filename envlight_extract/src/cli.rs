//! Command-line arguments for `envlight-extract`.

use clap::{Parser, ValueEnum};
use envlight::{PipelineConfig, SplitStrategy};
use std::path::PathBuf;

/// Extracts directional light sources from HDR environment panoramas.
///
/// CLI values override settings loaded from `--config`.
#[derive(Parser, Debug, Default)]
#[command(name = "envlight-extract", version, about)]
pub struct CliArgs {
    /// Equirectangular HDR images (.hdr, .exr, .png, ...).
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// JSON pipeline configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Subdivision depth; at most 2^depth regions.
    #[arg(long)]
    pub depth: Option<u32>,

    /// Fraction of the smallest lights that may be merged into a neighbor.
    #[arg(long)]
    pub merge_percentile: Option<f64>,

    /// Pixel tolerance when testing whether two lights touch.
    #[arg(long)]
    pub border: Option<u32>,

    /// How regions choose their cut position.
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Emit the area-sorted candidate lights without merging them.
    #[arg(long, alias = "unmerged")]
    pub no_merge: bool,

    /// Keep regions without luminous energy as lights.
    #[arg(long)]
    pub keep_dark: bool,

    /// Write one `<stem>.lights.json` per input here instead of printing to stdout.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Log filter (error, warn, info, debug, trace). `RUST_LOG` takes precedence.
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyArg {
    MinVariance,
    MedianEnergy,
}

impl From<StrategyArg> for SplitStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::MinVariance => SplitStrategy::MinVariance,
            StrategyArg::MedianEnergy => SplitStrategy::MedianEnergy,
        }
    }
}

/// Apply CLI overrides to a loaded config.
pub fn apply_cli_overrides(config: &mut PipelineConfig, args: &CliArgs) {
    if let Some(depth) = args.depth {
        config.subdivision_depth = depth;
    }
    if let Some(percentile) = args.merge_percentile {
        config.merge_percentile = percentile;
    }
    if let Some(border) = args.border {
        config.merge_border = border;
    }
    if let Some(strategy) = args.strategy {
        config.split_strategy = strategy.into();
    }
    if args.no_merge {
        config.merge_lights = false;
    }
    if args.keep_dark {
        config.skip_dark_regions = false;
    }
}
