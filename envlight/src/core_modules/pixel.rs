// THEORY (HDR Pixel Buffer):
// The `pixel` module is the most fundamental unit of the extraction engine. It owns
// the decoded environment panorama as a flat float buffer and knows how to turn a
// single texel into a luminance value. Nothing in here looks at neighbors; spatial
// aggregation lives in the summed-area tables and regions built on top of it.
//
// Key principles:
// 1) Linear light: HDR texels are already linear radiance, so luminance is a plain
//    weighted sum (Rec. 709 / sRGB primaries) with no gamma decoding.
// 2) Channel agnostic: buffers may be RGB or RGBA. Anything past the third channel
//    is carried along but ignored.
// 3) Read-only after load: every later stage borrows the image immutably.
// 4) Clean samples: radiance is never negative and never infinite. NaN, infinities and
//    negative values are replaced by 0 when the buffer is built, so one bad texel
//    cannot poison the prefix sums downstream.

pub mod pixel {
    use crate::error::{ExtractError, Result};
    use tracing::warn;

    pub type Channel = f32;
    pub type Luminance = f64;

    /// Rec. 709 luminance weights for linear RGB.
    pub const LUMINANCE_WEIGHTS: [f64; 3] = [0.2126, 0.7152, 0.0722];

    /// Maps a raw sample to usable radiance: non-finite and negative values become 0.
    #[inline]
    pub fn sanitize(sample: Channel) -> Channel {
        if sample.is_finite() && sample > 0.0 { sample } else { 0.0 }
    }

    /// Luminance of a linear RGB triple.
    #[inline]
    pub fn luminance(red: f64, green: f64, blue: f64) -> Luminance {
        LUMINANCE_WEIGHTS[0] * red + LUMINANCE_WEIGHTS[1] * green + LUMINANCE_WEIGHTS[2] * blue
    }

    /// A single linear HDR texel.
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct HdrPixel {
        pub red: Channel,
        pub green: Channel,
        pub blue: Channel,
    }

    impl HdrPixel {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Self { red, green, blue }
        }

        /// Perceived brightness of this texel.
        pub fn luminance(&self) -> Luminance {
            luminance(self.red as f64, self.green as f64, self.blue as f64)
        }
    }

    /// A decoded environment image: `width * height * channels` interleaved floats.
    #[derive(Debug, Clone)]
    pub struct HdrImage {
        /// Width of the panorama in pixels.
        pub width: u32,
        /// Height of the panorama in pixels.
        pub height: u32,
        /// Number of interleaved channels per pixel (3 or 4).
        pub channels: usize,
        pixels: Vec<Channel>,
    }

    impl HdrImage {
        /// Wraps an interleaved buffer, checking its length against the dimensions.
        ///
        /// Non-finite and negative samples are replaced by 0.
        pub fn new(width: u32, height: u32, channels: usize, mut pixels: Vec<Channel>) -> Result<Self> {
            if channels < 3 {
                return Err(ExtractError::InvalidImage(format!(
                    "expected at least 3 channels, got {channels}"
                )));
            }
            let expected = width as usize * height as usize * channels;
            if pixels.len() != expected {
                return Err(ExtractError::InvalidImage(format!(
                    "{width}x{height}x{channels} needs {expected} samples, buffer has {}",
                    pixels.len()
                )));
            }

            let mut replaced = 0usize;
            for sample in pixels.iter_mut().filter(|s| !s.is_finite() || **s < 0.0) {
                *sample = 0.0;
                replaced += 1;
            }
            if replaced > 0 {
                warn!(width, height, replaced, "replaced non-finite or negative samples with 0");
            }

            Ok(Self {
                width,
                height,
                channels,
                pixels,
            })
        }

        /// Builds an RGB image from a per-pixel closure. Mostly useful for synthetic scenes.
        pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> HdrPixel) -> Self {
            let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
            for y in 0..height {
                for x in 0..width {
                    let p = f(x, y);
                    pixels.extend_from_slice(&[sanitize(p.red), sanitize(p.green), sanitize(p.blue)]);
                }
            }
            Self {
                width,
                height,
                channels: 3,
                pixels,
            }
        }

        /// Reads the texel at `(x, y)`.
        #[inline]
        pub fn pixel(&self, x: u32, y: u32) -> HdrPixel {
            self.pixel_at(y as usize * self.width as usize + x as usize)
        }

        /// Reads the texel at a flat row-major index.
        #[inline]
        pub fn pixel_at(&self, index: usize) -> HdrPixel {
            let base = index * self.channels;
            HdrPixel {
                red: self.pixels[base],
                green: self.pixels[base + 1],
                blue: self.pixels[base + 2],
            }
        }

        pub fn pixel_count(&self) -> usize {
            self.width as usize * self.height as usize
        }

        pub fn samples(&self) -> &[Channel] {
            &self.pixels
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;

    #[test]
    fn white_has_unit_luminance() {
        let white = HdrPixel::new(1.0, 1.0, 1.0);
        assert!((white.luminance() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn green_dominates_luminance() {
        let g = HdrPixel::new(0.0, 1.0, 0.0).luminance();
        let r = HdrPixel::new(1.0, 0.0, 0.0).luminance();
        let b = HdrPixel::new(0.0, 0.0, 1.0).luminance();
        assert!(g > r && r > b);
    }

    #[test]
    fn rgba_buffers_skip_alpha() {
        let image = HdrImage::new(2, 1, 4, vec![1.0, 2.0, 3.0, 9.0, 4.0, 5.0, 6.0, 9.0])
            .expect("valid buffer");
        assert_eq!(image.pixel(1, 0), HdrPixel::new(4.0, 5.0, 6.0));
        assert_eq!(image.pixel_count(), 2);
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        assert!(HdrImage::new(4, 4, 3, vec![0.0; 10]).is_err());
        assert!(HdrImage::new(1, 1, 2, vec![0.0; 2]).is_err());
    }

    #[test]
    fn bad_samples_become_zero() {
        assert_eq!(sanitize(f32::NAN), 0.0);
        assert_eq!(sanitize(f32::INFINITY), 0.0);
        assert_eq!(sanitize(f32::NEG_INFINITY), 0.0);
        assert_eq!(sanitize(-2.5), 0.0);
        assert_eq!(sanitize(3.25), 3.25);

        let image = HdrImage::new(2, 1, 3, vec![f32::INFINITY, f32::NAN, -1.0, 1.0, 2.0, 3.0]).unwrap();
        assert_eq!(image.pixel(0, 0), HdrPixel::default());
        assert_eq!(image.pixel(1, 0), HdrPixel::new(1.0, 2.0, 3.0));

        let built = HdrImage::from_fn(2, 1, |x, _| {
            if x == 0 { HdrPixel::new(f32::NAN, -4.0, f32::INFINITY) } else { HdrPixel::new(1.0, 1.0, 1.0) }
        });
        assert_eq!(built.pixel(0, 0).luminance(), 0.0);
        assert!(built.samples().iter().all(|s| s.is_finite()));
    }

    #[test]
    fn from_fn_lays_out_rows() {
        let image = HdrImage::from_fn(3, 2, |x, y| HdrPixel::new(x as f32, y as f32, 0.0));
        assert_eq!(image.pixel(2, 1), HdrPixel::new(2.0, 1.0, 0.0));
        assert_eq!(image.samples().len(), 18);
    }
}
