// THEORY:
// A `Region` is the unit of analysis of the partitioning layer: an axis-aligned pixel
// rectangle that can answer aggregate questions about the light inside it without
// touching the pixels. It is the query provider the median-cut partitioner drives.
//
// Key architectural principles:
// 1.  **Borrowed integrals**: A region is a few integers plus a reference to the
//     image's `LuminanceField`. Creating and splitting regions is free; every
//     statistic is a summed-area-table lookup.
// 2.  **Admissible cuts only**: A split never produces a half that is 2 pixels or
//     thinner along the cut axis, because the partitioner discards such slivers and
//     the light inside them would be lost. When a region is too narrow to be cut
//     that way, the split is degenerate: the first half is the whole region and the
//     second half is empty.
// 3.  **Pluggable criterion**: Where to cut is a `SplitStrategy`. `MinVariance`
//     isolates bright features tightly; `MedianEnergy` is the classic median cut
//     that balances luminous energy between halves.
// 4.  **Trait seam**: The partitioner only needs dimensions and the two split
//     operations, exposed through `SplittableRegion`, so it can be exercised with
//     synthetic regions in tests.

use crate::core_modules::summed_area_table::summed_area_table::LuminanceField;
use serde::{Deserialize, Serialize};

/// Narrowest half an admissible cut may leave behind.
pub const MIN_SPLIT_SIDE: u32 = 3;

/// Relative tolerance under which two candidate cuts are considered equally good.
const CUT_TIE_TOLERANCE: f64 = 1e-9;

/// How a region chooses its cut position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Minimize the summed squared luminance deviation of both halves.
    #[default]
    MinVariance,
    /// Cut where the leading half first holds at least half of the luminous energy.
    MedianEnergy,
}

/// What the partitioner needs from a region.
pub trait SplittableRegion: Sized {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Splits along the width into a left and a right part.
    fn split_w(&self) -> (Self, Self);
    /// Splits along the height into a top and a bottom part.
    fn split_h(&self) -> (Self, Self);
}

/// A sub-pixel position in image space, in pixel-index coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Width,
    Height,
}

/// A rectangular view over a `LuminanceField`.
#[derive(Debug, Clone, Copy)]
pub struct Region<'a> {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    field: &'a LuminanceField,
    strategy: SplitStrategy,
}

impl<'a> Region<'a> {
    pub fn create(x: u32, y: u32, w: u32, h: u32, field: &'a LuminanceField, strategy: SplitStrategy) -> Self {
        debug_assert!(x + w <= field.width() && y + h <= field.height());
        Self {
            x,
            y,
            w,
            h,
            field,
            strategy,
        }
    }

    /// The region covering the whole image.
    pub fn whole(field: &'a LuminanceField, strategy: SplitStrategy) -> Self {
        Self::create(0, 0, field.width(), field.height(), field, strategy)
    }

    pub fn area_size(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// Total luminance inside the region.
    pub fn sum(&self) -> f64 {
        self.field.luminance.sum(self.x, self.y, self.w, self.h)
    }

    /// Mean luminance, 0 for an empty region.
    pub fn mean(&self) -> f64 {
        match self.area_size() {
            0 => 0.0,
            area => self.sum() / area as f64,
        }
    }

    /// Population variance of luminance, `E[L^2] - E[L]^2`, clamped at zero.
    pub fn variance(&self) -> f64 {
        let area = self.area_size();
        if area == 0 {
            return 0.0;
        }
        let mean = self.sum() / area as f64;
        let mean_sq = self.field.luminance_squared.sum(self.x, self.y, self.w, self.h) / area as f64;
        (mean_sq - mean * mean).max(0.0)
    }

    pub fn red(&self) -> f64 {
        self.field.red.sum(self.x, self.y, self.w, self.h)
    }

    pub fn green(&self) -> f64 {
        self.field.green.sum(self.x, self.y, self.w, self.h)
    }

    pub fn blue(&self) -> f64 {
        self.field.blue.sum(self.x, self.y, self.w, self.h)
    }

    /// Luminance-weighted mean pixel position. Falls back to the geometric center when
    /// the region carries no energy.
    pub fn centroid(&self) -> Centroid {
        let total = self.sum();
        if !(total > 0.0) {
            return Centroid {
                x: self.x as f64 + (self.w as f64 - 1.0) / 2.0,
                y: self.y as f64 + (self.h as f64 - 1.0) / 2.0,
            };
        }

        let lum = &self.field.luminance;
        let mut cx = 0.0;
        for i in 0..self.w {
            cx += (self.x + i) as f64 * lum.sum(self.x + i, self.y, 1, self.h);
        }
        let mut cy = 0.0;
        for j in 0..self.h {
            cy += (self.y + j) as f64 * lum.sum(self.x, self.y + j, self.w, 1);
        }

        Centroid {
            x: cx / total,
            y: cy / total,
        }
    }

    /// Squared luminance deviation summed over a sub-rectangle.
    fn deviation(&self, x: u32, y: u32, w: u32, h: u32) -> f64 {
        let area = w as u64 * h as u64;
        if area == 0 {
            return 0.0;
        }
        let s = self.field.luminance.sum(x, y, w, h);
        let s2 = self.field.luminance_squared.sum(x, y, w, h);
        (s2 - s * s / area as f64).max(0.0)
    }

    /// Luminance of the leading `k` columns or rows.
    fn leading_sum(&self, axis: Axis, k: u32) -> f64 {
        match axis {
            Axis::Width => self.field.luminance.sum(self.x, self.y, k, self.h),
            Axis::Height => self.field.luminance.sum(self.x, self.y, self.w, k),
        }
    }

    fn cut_position(&self, axis: Axis) -> u32 {
        let extent = match axis {
            Axis::Width => self.w,
            Axis::Height => self.h,
        };
        if extent < 2 * MIN_SPLIT_SIDE {
            return extent;
        }
        let (lo, hi) = (MIN_SPLIT_SIDE, extent - MIN_SPLIT_SIDE);

        match self.strategy {
            SplitStrategy::MedianEnergy => {
                let total = self.sum();
                if !(total > 0.0) {
                    return extent / 2;
                }
                let median = (1..extent)
                    .find(|&k| 2.0 * self.leading_sum(axis, k) >= total)
                    .unwrap_or(hi);
                median.clamp(lo, hi)
            }
            SplitStrategy::MinVariance => {
                // Visit candidates from the middle outward so ties settle on a balanced cut.
                let mut candidates: Vec<u32> = (lo..=hi).collect();
                candidates.sort_by_key(|&k| ((2 * k as i64 - extent as i64).abs(), k));

                let mut best: Option<(u32, f64)> = None;
                for k in candidates {
                    let cost = match axis {
                        Axis::Width => {
                            self.deviation(self.x, self.y, k, self.h)
                                + self.deviation(self.x + k, self.y, self.w - k, self.h)
                        }
                        Axis::Height => {
                            self.deviation(self.x, self.y, self.w, k)
                                + self.deviation(self.x, self.y + k, self.w, self.h - k)
                        }
                    };
                    match best {
                        Some((_, best_cost)) if cost >= best_cost - CUT_TIE_TOLERANCE * best_cost.abs().max(1.0) => {}
                        _ => best = Some((k, cost)),
                    }
                }
                best.map_or(extent / 2, |(k, _)| k)
            }
        }
    }
}

impl SplittableRegion for Region<'_> {
    fn width(&self) -> u32 {
        self.w
    }

    fn height(&self) -> u32 {
        self.h
    }

    fn split_w(&self) -> (Self, Self) {
        let k = self.cut_position(Axis::Width);
        (
            Region::create(self.x, self.y, k, self.h, self.field, self.strategy),
            Region::create(self.x + k, self.y, self.w - k, self.h, self.field, self.strategy),
        )
    }

    fn split_h(&self) -> (Self, Self) {
        let k = self.cut_position(Axis::Height);
        (
            Region::create(self.x, self.y, self.w, k, self.field, self.strategy),
            Region::create(self.x, self.y + k, self.w, self.h - k, self.field, self.strategy),
        )
    }
}
