mod cli;
mod logging;

use anyhow::{Context, bail};
use clap::Parser;
use cli::{CliArgs, apply_cli_overrides};
use envlight::parallel_pipeline::output_path;
use envlight::{BatchExtractor, BatchOutcome, ExtractionPipeline, ExtractionReport, PipelineConfig};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Argument Parsing & Setup ---
    let args = CliArgs::parse();
    logging::init_logging(args.log_level.as_deref())?;

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    apply_cli_overrides(&mut config, &args);
    config.validate()?;

    // --- 2. Single image to stdout ---
    let Some(out_dir) = &args.out_dir else {
        if args.inputs.len() > 1 {
            bail!("{} inputs given; use --out-dir to write one document per input", args.inputs.len());
        }
        let Some(input) = args.inputs.first() else {
            bail!("no input given");
        };
        let report = ExtractionPipeline::new(config)?
            .extract_path(input)
            .with_context(|| format!("extracting lights from {}", input.display()))?;

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        report.write_json(&mut out)?;
        out.flush()?;
        return Ok(());
    };

    // --- 3. Batch to an output directory ---
    std::fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let batch = BatchExtractor::new(config)?;
    let outcomes = batch.extract_all(args.inputs.clone()).await;

    let failures = write_outcomes(out_dir, outcomes);
    if failures > 0 {
        bail!("{failures} of {} inputs failed", args.inputs.len());
    }
    Ok(())
}

/// Writes one document per successful outcome. A failed extraction or write is logged
/// and counted, and the remaining inputs are still processed.
fn write_outcomes(out_dir: &Path, outcomes: Vec<BatchOutcome>) -> usize {
    let mut failures = 0;
    for outcome in outcomes {
        let report = match outcome.result {
            Ok(report) => report,
            Err(err) => {
                error!(path = %outcome.path.display(), error = %err, "skipping input");
                failures += 1;
                continue;
            }
        };

        let target = output_path(out_dir, &outcome.path);
        match write_report(&target, &report) {
            Ok(()) => info!(
                input = %outcome.path.display(),
                output = %target.display(),
                lights = report.lights.len(),
                "wrote lights"
            ),
            Err(err) => {
                error!(path = %outcome.path.display(), error = format!("{err:#}"), "could not write lights");
                failures += 1;
            }
        }
    }
    failures
}

fn write_report(target: &Path, report: &ExtractionReport) -> anyhow::Result<()> {
    let file = File::create(target).with_context(|| format!("creating {}", target.display()))?;
    let mut writer = BufWriter::new(file);
    report.write_json(&mut writer)?;
    writer.flush().with_context(|| format!("writing {}", target.display()))?;
    Ok(())
}
