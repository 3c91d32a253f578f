// THEORY:
// Decoding is delegated to the `image` crate, which reads Radiance `.hdr`, OpenEXR and
// the usual LDR formats. Whatever comes in is widened to RGBA f32 so the rest of the
// engine only ever sees one buffer layout. Widening rescales but does not re-encode: HDR
// inputs are linear and keep their full range, while 8/16-bit inputs stay in their
// stored (usually sRGB) encoding and land in [0, 1]. LDR panoramas are accepted for
// convenience; their luminance is only as linear as the file was.

use crate::core_modules::pixel::pixel::HdrImage;
use crate::error::{ExtractError, Result};
use image::DynamicImage;
use std::path::Path;
use tracing::debug;

/// Loads and decodes the panorama at `path`.
pub fn load_hdr(path: &Path) -> Result<HdrImage> {
    let decoded = image::open(path).map_err(|source| ExtractError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), color = ?decoded.color(), "decoded image");
    from_dynamic(decoded)
}

/// Widens an already decoded image to RGBA f32, keeping the stored encoding.
pub fn from_dynamic(decoded: DynamicImage) -> Result<HdrImage> {
    let rgba = decoded.into_rgba32f();
    let (width, height) = rgba.dimensions();
    HdrImage::new(width, height, 4, rgba.into_raw())
}
