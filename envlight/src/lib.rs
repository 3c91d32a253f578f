// THEORY:
// This file is the main entry point for the `envlight` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (like the `envlight-extract` CLI).
//
// The primary goal is to export the `ExtractionPipeline` and its associated data
// structures (`PipelineConfig`, `ExtractionReport`, `EmittedLight`) as the high-level
// interface for turning an HDR environment map into a short list of directional
// lights. The internal stages live in `core_modules` and stay usable on their own
// for callers that want to drive them step by step.

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use error::{ExtractError, Result};
pub use parallel_pipeline::{BatchExtractor, BatchOutcome};
pub use pipeline::{EmittedLight, ExtractionPipeline, ExtractionReport, PipelineConfig, SplitStrategy};
