// THEORY:
// The `Light` module holds the primary data container of the lighting layer. A `Light`
// starts life as a one-to-one summary of a partitioned region and may later grow by
// absorbing its small neighbors during merging.
//
// Key architectural principles:
// 1.  **Data Aggregation**: A light summarizes a region with a handful of numbers
//     (bounding box, centroid, luminous sum, variance, average color) so that the
//     merger never has to go back to the pixels.
// 2.  **Explicit merge state**: Whether a light was swallowed by another one, or is
//     itself swallowing others, is a tagged `MergeState` instead of a pair of loose
//     flags. Lights live in an index-addressed list, so "absorbed into" is an index.
// 3.  **Mutable ranking key**: `sort_criteria` is area while lights are being merged
//     and total luminous sum once merging is over.

use crate::core_modules::region::Centroid;

/// Where a light stands in the merge process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeState {
    /// Not (yet) involved in any merge.
    #[default]
    Standalone,
    /// Swallowed by the anchor at this index; never emitted or reused.
    Absorbed { into: usize },
    /// Has swallowed `absorbed` other lights.
    Anchor { absorbed: u32 },
}

/// A candidate light source derived from a region of the panorama.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Bounding box in pixel space.
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    /// Luminance-weighted position inside the image.
    pub centroid: Centroid,
    /// Pixel count of the bounding box.
    pub area_size: u64,
    /// Total luminance.
    pub sum: f64,
    pub variance: f64,
    pub lum_average: f64,
    pub r_average: f64,
    pub g_average: f64,
    pub b_average: f64,
    /// Luminance of the single pixel nearest the centroid; a peak-intensity signal.
    pub luminance_pixel: f64,
    pub state: MergeState,
    pub sort_criteria: f64,
}

impl Light {
    /// True once another light has absorbed this one.
    pub fn is_merged(&self) -> bool {
        matches!(self.state, MergeState::Absorbed { .. })
    }

    /// Carries any luminous energy at all.
    pub fn is_lit(&self) -> bool {
        self.sum > 0.0
    }

    /// Number of lights this one absorbed.
    pub fn merged_num(&self) -> u32 {
        match self.state {
            MergeState::Anchor { absorbed } => absorbed,
            _ => 0,
        }
    }

    /// Whether this light's box, grown by `border` pixels on every side, touches `other`.
    ///
    /// Computed in signed arithmetic so boxes near the image origin are handled like any
    /// other. There is no wraparound across the horizontal seam of the panorama.
    pub fn touches(&self, other: &Light, border: u32) -> bool {
        let b = border as i64;
        let (x, y, w, h) = (self.x as i64, self.y as i64, self.w as i64, self.h as i64);
        let (ox, oy, ow, oh) = (other.x as i64, other.y as i64, other.w as i64, other.h as i64);

        !(oy - b > y + h || oy + oh + b < y || ox - b > x + w || ox + ow + b < x)
    }

    /// Grows the bounding box to the union with `other`.
    pub fn grow_to_include(&mut self, other: &Light) {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        self.w = (self.x + self.w).max(other.x + other.w) - x;
        self.h = (self.y + self.h).max(other.y + other.h) - y;
        self.x = x;
        self.y = y;
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::boxed_light;
    use super::*;

    #[test]
    fn merge_state_accessors() {
        let mut light = boxed_light(0, 0, 4, 4, 1.0);
        assert!(!light.is_merged());
        assert_eq!(light.merged_num(), 0);

        light.state = MergeState::Anchor { absorbed: 3 };
        assert_eq!(light.merged_num(), 3);

        light.state = MergeState::Absorbed { into: 7 };
        assert!(light.is_merged());
        assert_eq!(light.merged_num(), 0);

        assert!(light.is_lit());
        assert!(!boxed_light(0, 0, 4, 4, 0.0).is_lit());
    }

    #[test]
    fn touching_respects_border() {
        let a = boxed_light(10, 10, 4, 4, 1.0);
        // Gap of 5 pixels to the right: inside the tolerance.
        assert!(a.touches(&boxed_light(19, 10, 4, 4, 1.0), 5));
        // Gap of 7 pixels: outside.
        assert!(!a.touches(&boxed_light(21, 10, 4, 4, 1.0), 5));
        // Without tolerance only true overlaps or shared edges count.
        assert!(a.touches(&boxed_light(14, 10, 4, 4, 1.0), 0));
        assert!(!a.touches(&boxed_light(15, 10, 4, 4, 1.0), 0));
    }

    #[test]
    fn touching_near_the_origin() {
        let corner = boxed_light(0, 0, 3, 3, 1.0);
        let neighbor = boxed_light(1, 6, 3, 3, 1.0);
        assert!(neighbor.touches(&corner, 5));
        assert!(corner.touches(&neighbor, 5));
    }

    #[test]
    fn growing_produces_the_union() {
        let mut a = boxed_light(10, 20, 4, 4, 1.0);
        a.grow_to_include(&boxed_light(2, 26, 3, 5, 1.0));
        assert_eq!((a.x, a.y, a.w, a.h), (2, 20, 12, 11));
    }
}
