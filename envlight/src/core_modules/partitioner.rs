// THEORY:
// The `Partitioner` is the orchestration layer of the region analysis. It is not an
// analyzer itself; it owns the recursion that turns one whole-image region into a flat
// list of luminance-homogeneous leaves, and delegates every "where do I cut?" decision
// to the region it is holding.
//
// Key architectural principles:
// 1.  **Budgeted recursion**: Each level spends one unit of the subdivision depth, so a
//     run yields at most `2^n` leaves and always terminates.
// 2.  **Longest-axis cuts**: A region is split across its larger dimension (ties go to
//     the width), which keeps leaves from degenerating into long strips.
// 3.  **Sliver discard**: A sub-region 2 pixels wide or high (or thinner) is dropped on
//     the floor rather than emitted. Regions built on summed-area tables never produce
//     such halves, but the rule holds for any `SplittableRegion`.
// 4.  **Order free output**: Leaves come out depth-first. Nothing downstream may rely on
//     that order; the light builder re-sorts.

use crate::core_modules::region::SplittableRegion;
use tracing::debug;

/// Splits `root` recursively, spending at most `depth` levels, and returns the leaves.
pub fn median_variance_cut<R: SplittableRegion>(root: R, depth: u32) -> Vec<R> {
    let mut regions = Vec::new();
    split_recursive(root, depth, &mut regions);
    debug!(depth, leaves = regions.len(), "partitioned image");
    regions
}

fn split_recursive<R: SplittableRegion>(region: R, depth: u32, regions: &mut Vec<R>) {
    // Can't split any further: keep the region as a leaf.
    if region.width() < 2 || region.height() < 2 || depth == 0 {
        regions.push(region);
        return;
    }

    let (a, b) = if region.width() >= region.height() {
        region.split_w()
    } else {
        region.split_h()
    };

    for half in [a, b] {
        if half.width() > 2 && half.height() > 2 {
            split_recursive(half, depth - 1, regions);
        }
    }
}
