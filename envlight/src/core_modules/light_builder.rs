// THEORY:
// The light builder is the bridge between the partitioning layer and the lighting
// layer. It reads the statistics of each leaf region, samples the source pixel under
// the region's centroid, and packages everything into a `Light`.
//
// The output is sorted by area, smallest first. That ordering is a precondition of the
// merger: it visits small lights first and derives its absorption threshold from a
// percentile of this list. Energy-free regions become lights too, so the threshold sees
// the whole partition; they are only dropped when the final list is emitted.

use crate::core_modules::light::{Light, MergeState};
use crate::core_modules::pixel::pixel::HdrImage;
use crate::core_modules::region::Region;
use tracing::debug;

/// Converts one leaf region into a light.
pub fn light_from_region(region: &Region, image: &HdrImage) -> Light {
    let centroid = region.centroid();
    let area_size = region.area_size();
    let per_pixel = |channel_sum: f64| match area_size {
        0 => 0.0,
        area => channel_sum / area as f64,
    };

    // The single pixel nearest the centroid, clamped into the image.
    let px = (centroid.x.round().max(0.0) as u32).min(image.width.saturating_sub(1));
    let py = (centroid.y.round().max(0.0) as u32).min(image.height.saturating_sub(1));
    let luminance_pixel = if image.pixel_count() > 0 {
        image.pixel(px, py).luminance()
    } else {
        0.0
    };

    Light {
        x: region.x,
        y: region.y,
        w: region.w,
        h: region.h,
        centroid,
        area_size,
        sum: region.sum(),
        variance: region.variance(),
        lum_average: region.mean(),
        r_average: per_pixel(region.red()),
        g_average: per_pixel(region.green()),
        b_average: per_pixel(region.blue()),
        luminance_pixel,
        state: MergeState::Standalone,
        sort_criteria: area_size as f64,
    }
}

/// Builds a light per region, dark ones included, and sorts them by ascending area.
pub fn create_lights(regions: &[Region], image: &HdrImage) -> Vec<Light> {
    let mut lights: Vec<Light> = regions.iter().map(|region| light_from_region(region, image)).collect();

    sort_by_criteria(&mut lights);
    debug!(
        regions = regions.len(),
        lights = lights.len(),
        "built candidate lights"
    );
    lights
}

/// Removes lights without luminous energy, keeping the order of the rest. Returns how
/// many were dropped.
pub fn drop_dark_lights(lights: &mut Vec<Light>) -> usize {
    let before = lights.len();
    lights.retain(Light::is_lit);
    before - lights.len()
}

/// Stable ascending sort on `sort_criteria`.
pub fn sort_by_criteria(lights: &mut [Light]) {
    lights.sort_by(|a, b| a.sort_criteria.total_cmp(&b.sort_criteria));
}
