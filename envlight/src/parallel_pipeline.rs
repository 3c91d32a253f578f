// THEORY:
// The parallel pipeline runs many independent extractions at once. A single extraction
// is CPU-bound and synchronous, so each one is pushed onto tokio's blocking thread pool
// while the async side only schedules work and gathers results.
//
// Key principles:
// 1.  **Bounded fan-out**: at most `concurrency` images are in flight (the CPU count by
//     default), which also bounds how many decoded panoramas sit in memory.
// 2.  **Ordered results**: outcomes come back in input order regardless of which image
//     finishes first.
// 3.  **Failure isolation**: a bad input or a panicking worker is reported against that
//     input only; every other image still gets processed.

use crate::error::{ExtractError, Result};
use crate::pipeline::{ExtractionPipeline, ExtractionReport, PipelineConfig};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Suffix of the per-input JSON documents written in batch mode.
pub const OUTPUT_SUFFIX: &str = ".lights.json";

/// Result of one input of a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub path: PathBuf,
    pub result: Result<ExtractionReport>,
}

pub struct BatchExtractor {
    pipeline: Arc<ExtractionPipeline>,
    concurrency: usize,
}

impl BatchExtractor {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Ok(Self {
            pipeline: Arc::new(ExtractionPipeline::new(config)?),
            concurrency: num_cpus::get().max(1),
        })
    }

    /// Caps the number of images processed at the same time.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Extracts the lights of every input, returning outcomes in input order.
    pub async fn extract_all(&self, paths: Vec<PathBuf>) -> Vec<BatchOutcome> {
        debug!(inputs = paths.len(), concurrency = self.concurrency, "starting batch");

        stream::iter(paths)
            .map(|path| {
                let pipeline = Arc::clone(&self.pipeline);
                async move {
                    let task_path = path.clone();
                    let result = tokio::task::spawn_blocking(move || pipeline.extract_path(&task_path))
                        .await
                        .unwrap_or_else(|join_error| Err(ExtractError::Worker(join_error.to_string())));

                    if let Err(error) = &result {
                        warn!(path = %path.display(), %error, "extraction failed");
                    }
                    BatchOutcome { path, result }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }
}

/// Where the JSON document for `input` goes inside `out_dir`: `<stem>.lights.json`.
pub fn output_path(out_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    out_dir.join(format!("{stem}{OUTPUT_SUFFIX}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_spot(dir: &Path, name: &str, at: (u32, u32)) -> PathBuf {
        let path = dir.join(name);
        let mut png = RgbImage::new(64, 32);
        for y in at.1..at.1 + 4 {
            for x in at.0..at.0 + 4 {
                png.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        png.save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn outcomes_follow_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let inputs: Vec<PathBuf> = (0..6)
            .map(|i| write_spot(dir.path(), &format!("spot{i}.png"), (4 + i * 8, 10)))
            .collect();

        let batch = BatchExtractor::new(PipelineConfig::default()).unwrap().with_concurrency(3);
        let outcomes = batch.extract_all(inputs.clone()).await;

        assert_eq!(outcomes.len(), inputs.len());
        for (outcome, input) in outcomes.iter().zip(&inputs) {
            assert_eq!(&outcome.path, input);
            let report = outcome.result.as_ref().unwrap();
            assert!(!report.lights.is_empty());
        }

        // Spots move right, so the brightest light's column must increase with the input index.
        let columns: Vec<f64> = outcomes
            .iter()
            .map(|o| o.result.as_ref().unwrap().lights[0].position[1])
            .collect();
        assert!(columns.windows(2).all(|w| w[0] < w[1]), "{columns:?}");
    }

    #[tokio::test]
    async fn one_bad_input_does_not_sink_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_spot(dir.path(), "good.png", (20, 10));
        let bad = dir.path().join("missing.hdr");

        let batch = BatchExtractor::new(PipelineConfig::default()).unwrap();
        let outcomes = batch.extract_all(vec![bad.clone(), good.clone()]).await;

        assert!(matches!(outcomes[0].result, Err(ExtractError::ImageLoad { .. })));
        assert!(outcomes[1].result.is_ok());
    }

    #[tokio::test]
    async fn empty_batch_is_fine() {
        let batch = BatchExtractor::new(PipelineConfig::default()).unwrap();
        assert!(batch.extract_all(Vec::new()).await.is_empty());
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = PipelineConfig { subdivision_depth: 0, ..Default::default() };
        assert!(BatchExtractor::new(config).is_err());
    }

    #[test]
    fn concurrency_is_at_least_one() {
        let batch = BatchExtractor::new(PipelineConfig::default()).unwrap();
        assert!(batch.concurrency() >= 1);
        assert_eq!(batch.with_concurrency(0).concurrency(), 1);
    }

    #[test]
    fn output_paths_use_the_input_stem() {
        let out = output_path(Path::new("/tmp/out"), Path::new("/data/sky.hdr"));
        assert_eq!(out, PathBuf::from("/tmp/out/sky.lights.json"));
    }
}
