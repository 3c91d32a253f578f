// THEORY:
// The `LightMerger` is the engine of the lighting layer. Median cut tends to shatter a
// bright source into a cluster of tiny regions (the cuts hug high-energy pixels), and a
// renderer wants one light per source, not a dozen. The merger implements a greedy
// "anchor and grow" algorithm that fuses such clusters back together.
//
// Key architectural principles & algorithm steps:
// 1.  **Eligibility threshold**: Only the smallest lights may be swallowed. The area at
//     a fixed percentile of the area-sorted list is the cut-off; anchors themselves are
//     unbounded. The percentile runs over every candidate, dark ones included, so the
//     cut-off reflects the whole partition rather than only its lit fragments.
// 2.  **Anchor growth**: Visiting lights smallest first, each not-yet-absorbed light
//     becomes a candidate anchor and repeatedly absorbs every eligible light whose box
//     touches its own (with a pixel tolerance), growing after every hit, until a full
//     pass finds nothing new. A grown box can reach neighbors the original could not.
// 3.  **First match wins**: Once absorbed, a light is out for good, even if it would
//     also touch a later anchor.
// 4.  **Energy conservation**: Absorbing moves the luminous sum into the anchor; every
//     input light ends up either absorbed, as an anchor, or standalone.
// 5.  **Dark lights stay put**: With `skip_dark` set, lights without energy neither
//     anchor nor get absorbed. They cannot bridge two bright sources into one box, and
//     they come back standalone for the caller to drop.
// 6.  **No seam wrap**: Equirectangular panoramas wrap horizontally, but lights on
//     opposite edges are not considered neighbors.

use crate::core_modules::light::{Light, MergeState};
use tracing::debug;

/// Tuning for the merge pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeParams {
    /// Fraction of the smallest lights that may be absorbed.
    pub percentile: f64,
    /// Pixel tolerance added around an anchor's box.
    pub border: u32,
    /// Leave energy-free lights out of the merge. They still count for the threshold.
    pub skip_dark: bool,
}

impl Default for MergeParams {
    fn default() -> Self {
        Self {
            percentile: 0.25,
            border: 5,
            skip_dark: true,
        }
    }
}

/// What a merge pass produced.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// Anchors and standalone lights, highest total luminance first.
    pub lights: Vec<Light>,
    /// Number of lights absorbed into anchors.
    pub absorbed: u32,
    /// Largest area a light could have and still be absorbed.
    pub merge_area_size: u64,
}

/// Fuses adjacent small lights. `lights` must be sorted by ascending area; the merge
/// state of every input light is updated in place.
pub fn merge_lights(lights: &mut [Light], params: MergeParams) -> MergeOutcome {
    if lights.is_empty() {
        return MergeOutcome {
            lights: Vec::new(),
            absorbed: 0,
            merge_area_size: 0,
        };
    }

    // --- 1. Eligibility threshold ---
    let merge_index = ((lights.len() as f64 * params.percentile).floor() as usize).min(lights.len() - 1);
    let merge_area_size = lights[merge_index].area_size;

    let mut merged = Vec::new();
    let mut absorbed_total = 0;

    let mergeable = |light: &Light| !params.skip_dark || light.is_lit();

    // --- 2. Anchor growth ---
    for anchor in 0..lights.len() {
        if lights[anchor].is_merged() || !mergeable(&lights[anchor]) {
            continue;
        }

        loop {
            let mut absorbed_this_pass = 0;

            for candidate in 0..lights.len() {
                let other = &lights[candidate];
                if candidate == anchor
                    || other.is_merged()
                    || other.merged_num() > 0
                    || other.area_size > merge_area_size
                    || !mergeable(other)
                    || !lights[anchor].touches(other, params.border)
                {
                    continue;
                }

                let source = lights[candidate].clone();
                lights[candidate].state = MergeState::Absorbed { into: anchor };
                absorb(&mut lights[anchor], &source);
                absorbed_this_pass += 1;
            }

            if absorbed_this_pass == 0 {
                break;
            }
        }

        // --- 3. Finalize anchors ---
        let light = &mut lights[anchor];
        if let MergeState::Anchor { absorbed } = light.state {
            light.area_size = light.w as u64 * light.h as u64;
            light.lum_average = light.sum / light.area_size as f64;
            light.sort_criteria = light.sum;
            absorbed_total += absorbed;
            merged.push(light.clone());
        }
    }

    // --- 4. Standalone lights ---
    for light in lights.iter_mut() {
        if light.state == MergeState::Standalone {
            light.sort_criteria = light.sum;
            merged.push(light.clone());
        }
    }

    // --- 5. Brightest first ---
    merged.sort_by(|a, b| b.sort_criteria.total_cmp(&a.sort_criteria));

    debug!(
        inputs = lights.len(),
        outputs = merged.len(),
        absorbed = absorbed_total,
        merge_area_size,
        "merged lights"
    );

    MergeOutcome {
        lights: merged,
        absorbed: absorbed_total,
        merge_area_size,
    }
}

/// Folds `source` into `anchor`: union box, accumulated sum, energy-weighted centroid.
fn absorb(anchor: &mut Light, source: &Light) {
    anchor.grow_to_include(source);

    let total = anchor.sum + source.sum;
    if total > 0.0 {
        anchor.centroid.x = (anchor.centroid.x * anchor.sum + source.centroid.x * source.sum) / total;
        anchor.centroid.y = (anchor.centroid.y * anchor.sum + source.centroid.y * source.sum) / total;
    }
    anchor.sum = total;

    anchor.state = MergeState::Anchor {
        absorbed: anchor.merged_num() + 1,
    };
}
