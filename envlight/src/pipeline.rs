// THEORY:
// The `pipeline` module is the top-level API of the extraction engine. It wires the
// layers together in a fixed order and hands back a single report:
//
//   pixels -> summed-area tables -> recursive partition -> candidate lights
//          -> merge -> drop dark lights -> projection -> JSON
//
// Every region becomes a candidate, so the merge threshold is measured over the whole
// partition. Lights without luminous energy are dropped only right before projection.
//
// A pipeline run is synchronous and owns nothing but its configuration, so one
// `ExtractionPipeline` can process any number of images, and many pipelines can run side
// by side (see `parallel_pipeline`).

use crate::core_modules::emitter;
use crate::core_modules::image_loader;
use crate::core_modules::light_builder::{create_lights, drop_dark_lights};
use crate::core_modules::light_merger::{MergeParams, merge_lights};
use crate::core_modules::partitioner::median_variance_cut;
use crate::core_modules::pixel::pixel::HdrImage;
use crate::core_modules::projection::project_lights;
use crate::core_modules::region::Region;
use crate::core_modules::summed_area_table::summed_area_table::LuminanceField;
use crate::error::{ExtractError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

// Re-export key data structures for the public API.
pub use crate::core_modules::light::{Light, MergeState};
pub use crate::core_modules::projection::{AreaRect, EmittedLight};
pub use crate::core_modules::region::SplitStrategy;

/// Deepest recursion accepted; `2^24` leaves is already far beyond any panorama.
pub const MAX_SUBDIVISION_DEPTH: u32 = 24;

/// Configuration for the ExtractionPipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Recursion budget of the partitioner; yields at most `2^n` regions.
    pub subdivision_depth: u32,
    /// Fraction of the smallest candidate lights that may be absorbed by a neighbor.
    pub merge_percentile: f64,
    /// Pixel tolerance added around a light's box when looking for neighbors.
    pub merge_border: u32,
    pub split_strategy: SplitStrategy,
    /// When off, the area-sorted candidates are emitted as they are.
    pub merge_lights: bool,
    /// Keep energy-free lights out of merging and out of the output.
    pub skip_dark_regions: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            subdivision_depth: 8,
            merge_percentile: 0.25,
            merge_border: 5,
            split_strategy: SplitStrategy::MinVariance,
            merge_lights: true,
            skip_dark_regions: true,
        }
    }
}

impl PipelineConfig {
    /// Reads a JSON configuration. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(ExtractError::ConfigRead)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).map_err(ExtractError::ConfigParse)
    }

    /// Rejects values outside their documented ranges.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_SUBDIVISION_DEPTH).contains(&self.subdivision_depth) {
            return Err(ExtractError::InvalidConfig(format!(
                "subdivision_depth must be in 1..={MAX_SUBDIVISION_DEPTH}, got {}",
                self.subdivision_depth
            )));
        }
        if !(0.0..=1.0).contains(&self.merge_percentile) {
            return Err(ExtractError::InvalidConfig(format!(
                "merge_percentile must be in [0, 1], got {}",
                self.merge_percentile
            )));
        }
        Ok(())
    }

    fn merge_params(&self) -> MergeParams {
        MergeParams {
            percentile: self.merge_percentile,
            border: self.merge_border,
            skip_dark: self.skip_dark_regions,
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub width: u32,
    pub height: u32,
    /// Lights as they are written out, brightest first when merged.
    pub lights: Vec<EmittedLight>,
    /// The pixel-space lights behind `lights`, in the same order.
    pub final_lights: Vec<Light>,
    /// Leaf regions produced by the partitioner.
    pub region_count: usize,
    /// Lights built from those regions, before merging.
    pub candidate_count: usize,
    /// Candidates swallowed by a neighbor.
    pub absorbed_count: u32,
    /// Energy-free lights left out of the output.
    pub dark_count: usize,
}

impl ExtractionReport {
    fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            lights: Vec::new(),
            final_lights: Vec::new(),
            region_count: 0,
            candidate_count: 0,
            absorbed_count: 0,
            dark_count: 0,
        }
    }

    pub fn write_json<W: Write>(&self, out: &mut W) -> Result<()> {
        emitter::write_lights(&self.lights, out)
    }

    pub fn to_json(&self) -> Result<String> {
        emitter::to_json_string(&self.lights)
    }
}

/// The main, top-level struct for the extraction engine.
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    config: PipelineConfig,
}

impl ExtractionPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Loads the panorama at `path` and extracts its lights.
    pub fn extract_path(&self, path: &Path) -> Result<ExtractionReport> {
        let image = image_loader::load_hdr(path)?;
        let report = self.extract(&image);
        info!(
            path = %path.display(),
            lights = report.lights.len(),
            "extracted lights"
        );
        Ok(report)
    }

    /// Runs every stage on an in-memory panorama.
    pub fn extract(&self, image: &HdrImage) -> ExtractionReport {
        let (width, height) = (image.width, image.height);
        if image.pixel_count() == 0 {
            warn!(width, height, "empty image, no lights to extract");
            return ExtractionReport::empty(width, height);
        }
        if width < 2 || height < 2 {
            warn!(width, height, "degenerate image, treating it as a single region");
        }

        // Stage 1: Summed-area tables
        let field = LuminanceField::new(image);

        // Stage 2: Recursive partition
        let root = Region::whole(&field, self.config.split_strategy);
        let regions = median_variance_cut(root, self.config.subdivision_depth);

        // Stage 3: Candidate lights, smallest first
        let mut candidates = create_lights(&regions, image);
        let candidate_count = candidates.len();

        // Stage 4: Merge
        let (mut final_lights, absorbed_count) = if self.config.merge_lights {
            let outcome = merge_lights(&mut candidates, self.config.merge_params());
            (outcome.lights, outcome.absorbed)
        } else {
            debug!("merging disabled, emitting candidates");
            (candidates, 0)
        };

        // Stage 5: Drop dark lights
        let dark_count = if self.config.skip_dark_regions {
            drop_dark_lights(&mut final_lights)
        } else {
            0
        };

        // Stage 6: Projection
        let lights = project_lights(&final_lights, width, height);

        info!(
            width,
            height,
            regions = regions.len(),
            candidates = candidate_count,
            absorbed = absorbed_count,
            dark = dark_count,
            lights = lights.len(),
            "pipeline finished"
        );

        ExtractionReport {
            width,
            height,
            lights,
            final_lights,
            region_count: regions.len(),
            candidate_count,
            absorbed_count,
            dark_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::HdrPixel;

    fn square(size: u32, at: (u32, u32), side: u32, value: f32) -> HdrImage {
        HdrImage::from_fn(size, size, |x, y| {
            let inside = (at.0..at.0 + side).contains(&x) && (at.1..at.1 + side).contains(&y);
            if inside { HdrPixel::new(value, value, value) } else { HdrPixel::default() }
        })
    }

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.subdivision_depth, 8);
        assert_eq!(config.merge_border, 5);
        assert_eq!(config.split_strategy, SplitStrategy::MinVariance);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for config in [
            PipelineConfig { subdivision_depth: 0, ..Default::default() },
            PipelineConfig { subdivision_depth: 25, ..Default::default() },
            PipelineConfig { merge_percentile: 1.5, ..Default::default() },
            PipelineConfig { merge_percentile: f64::NAN, ..Default::default() },
        ] {
            assert!(matches!(config.validate(), Err(ExtractError::InvalidConfig(_))), "{config:?}");
            assert!(ExtractionPipeline::new(config).is_err());
        }
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = PipelineConfig::from_json_str(r#"{ "subdivision_depth": 5, "split_strategy": "median_energy" }"#).unwrap();
        assert_eq!(config.subdivision_depth, 5);
        assert_eq!(config.split_strategy, SplitStrategy::MedianEnergy);
        assert_eq!(config.merge_percentile, 0.25);
        assert!(config.merge_lights);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            PipelineConfig::from_json_str("{ subdivision_depth: "),
            Err(ExtractError::ConfigParse(_))
        ));
    }

    #[test]
    fn config_file_is_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("envlight.json");
        std::fs::write(&path, r#"{ "merge_border": 9, "merge_lights": false }"#).unwrap();

        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.merge_border, 9);
        assert!(!config.merge_lights);

        let missing = PipelineConfig::from_json_file(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(ExtractError::ConfigRead(_))));
    }

    #[test]
    fn report_statistics_add_up() {
        let image = square(256, (126, 126), 4, 10.0);
        let pipeline = ExtractionPipeline::new(PipelineConfig::default()).unwrap();
        let report = pipeline.extract(&image);

        assert!(report.region_count > 0 && report.region_count <= 256);
        assert_eq!(report.candidate_count, report.region_count);
        assert!(report.dark_count > 0);
        assert_eq!(
            report.final_lights.len() + report.absorbed_count as usize + report.dark_count,
            report.candidate_count
        );
        assert_eq!(report.lights.len(), report.final_lights.len());
        assert_eq!((report.width, report.height), (256, 256));
    }

    #[test]
    fn unmerged_mode_emits_area_sorted_candidates() {
        let image = HdrImage::from_fn(64, 32, |x, y| HdrPixel::new((x % 7) as f32, (y % 3) as f32, 1.0));
        let config = PipelineConfig { merge_lights: false, subdivision_depth: 5, ..Default::default() };
        let report = ExtractionPipeline::new(config).unwrap().extract(&image);

        assert_eq!(report.absorbed_count, 0);
        assert_eq!(report.final_lights.len(), report.candidate_count);
        assert!(report.final_lights.windows(2).all(|w| w[0].area_size <= w[1].area_size));
        assert!(report.final_lights.iter().all(|l| l.state == MergeState::Standalone));
    }

    #[test]
    fn dark_image_yields_an_empty_document() {
        let image = HdrImage::from_fn(32, 16, |_, _| HdrPixel::default());
        let report = ExtractionPipeline::new(PipelineConfig::default()).unwrap().extract(&image);
        assert!(report.lights.is_empty());
        assert_eq!(report.dark_count, report.candidate_count);
        assert_eq!(report.to_json().unwrap(), "[]\n");
    }

    #[test]
    fn infinite_texel_does_not_reach_the_output() {
        let mut samples = square(256, (200, 200), 4, 10.0).samples().to_vec();
        samples[..3].copy_from_slice(&[f32::INFINITY, f32::NAN, -3.0]);
        let image = HdrImage::new(256, 256, 3, samples).unwrap();

        let report = ExtractionPipeline::new(PipelineConfig::default()).unwrap().extract(&image);
        assert_eq!(report.lights.len(), 1);
        let light = &report.final_lights[0];
        assert!((light.centroid.x - 201.5).abs() < 1e-9 && (light.centroid.y - 201.5).abs() < 1e-9);
        assert!((light.sum - 160.0).abs() < 1e-9);

        let emitted = &report.lights[0];
        let numbers = emitted
            .position
            .iter()
            .chain(&emitted.direction)
            .chain([&emitted.luminosity, &emitted.variance, &emitted.area.x, &emitted.area.w]);
        for value in numbers {
            assert!(value.is_finite());
        }
        assert!(emitted.color.iter().all(|c| c.is_finite()));
        assert!(!report.to_json().unwrap().contains("null"));
    }

    #[test]
    fn keeping_dark_regions_emits_them() {
        let image = HdrImage::from_fn(32, 16, |_, _| HdrPixel::default());
        let config = PipelineConfig { skip_dark_regions: false, ..Default::default() };
        let report = ExtractionPipeline::new(config).unwrap().extract(&image);
        assert_eq!(report.dark_count, 0);
        assert!(!report.lights.is_empty());
        assert!(report.final_lights.iter().all(|l| l.sum == 0.0));
    }

    #[test]
    fn empty_and_degenerate_images_do_not_fail() {
        let pipeline = ExtractionPipeline::new(PipelineConfig::default()).unwrap();

        let empty = HdrImage::new(0, 0, 3, Vec::new()).unwrap();
        assert!(pipeline.extract(&empty).lights.is_empty());

        let column = HdrImage::from_fn(1, 40, |_, y| HdrPixel::new(y as f32, y as f32, y as f32));
        let report = pipeline.extract(&column);
        assert_eq!(report.region_count, 1);
        assert_eq!(report.lights.len(), 1);
    }

    #[test]
    fn extract_path_reports_load_failures() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ExtractionPipeline::new(PipelineConfig::default()).unwrap();
        let result = pipeline.extract_path(&dir.path().join("missing.exr"));
        assert!(matches!(result, Err(ExtractError::ImageLoad { .. })));
    }
}
