// THEORY:
// The projection layer turns pixel-space lights into the renderer-facing description. An
// equirectangular panorama maps x to azimuth and y to polar angle, so a centroid becomes
// a direction on the unit sphere. Radiometric weights come from the solid angle that a
// patch of the image subtends when the [-1,1] UV square is treated as a cube face at unit
// distance, which keeps the emitted numbers independent of the image resolution.
//
// The texel solid angle uses the classic closed form: the solid angle of the rectangle
// from the origin to (x, y) is `atan2(x*y, sqrt(x^2 + y^2 + 1))`, and any axis-aligned
// rectangle follows by inclusion-exclusion of its four corners.

use crate::core_modules::light::Light;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Below this norm a direction is left as computed.
pub const MIN_DIRECTION_NORM: f64 = 1e-16;

/// Normalized bounding box of an emitted light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// One light as it appears in the output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmittedLight {
    /// Centroid as (row, column) fractions of the image.
    pub position: [f64; 2],
    pub direction: [f64; 3],
    pub luminosity: f64,
    pub color: [f32; 3],
    pub area: AreaRect,
    pub variance: f64,
}

/// Solid angle of the rectangle spanning the origin and `(x, y)` in UV space.
pub fn area_element(x: f64, y: f64) -> f64 {
    (x * y).atan2((x * x + y * y + 1.0).sqrt())
}

fn rectangle_solid_angle(x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    area_element(x0, y0) - area_element(x0, y1) - area_element(x1, y0) + area_element(x1, y1)
}

/// Solid angle of the single texel at pixel coordinates `(u, v)`.
pub fn texel_pixel_solid_angle(u: f64, v: f64, width: u32, height: u32) -> f64 {
    let (w, h) = (width as f64, height as f64);
    let center_u = 2.0 * (u + 0.5) / w - 1.0;
    let center_v = 2.0 * (v + 0.5) / h - 1.0;

    rectangle_solid_angle(center_u - 1.0 / w, center_v - 1.0 / h, center_u + 1.0 / w, center_v + 1.0 / h)
}

/// Solid angle of the texel block from `(u, v)` to `(u + extent_w, v + extent_h)`, both
/// corner texels included.
pub fn texel_area_solid_angle(u: f64, v: f64, extent_w: f64, extent_h: f64, width: u32, height: u32) -> f64 {
    let (w, h) = (width as f64, height as f64);
    let x0 = 2.0 * (u + 0.5) / w - 1.0 - 1.0 / w;
    let y0 = 2.0 * (v + 0.5) / h - 1.0 - 1.0 / h;
    let x1 = 2.0 * (u + extent_w + 0.5) / w - 1.0 + 1.0 / w;
    let y1 = 2.0 * (v + extent_h + 0.5) / h - 1.0 + 1.0 / h;

    rectangle_solid_angle(x0, y0, x1, y1)
}

/// Unit direction for an equirectangular pixel position. The top row looks down (-y).
pub fn direction(x: f64, y: f64, width: u32, height: u32) -> [f64; 3] {
    let theta = (1.0 - y / height as f64) * PI;
    let phi = x / width as f64 * TAU;
    normalized([theta.sin() * phi.sin(), theta.cos(), theta.sin() * phi.cos()])
}

/// Scales `v` to unit length unless it is too short to normalize.
pub fn normalized(v: [f64; 3]) -> [f64; 3] {
    let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if norm < MIN_DIRECTION_NORM {
        return v;
    }
    let inv = 1.0 / norm;
    [v[0] * inv, v[1] * inv, v[2] * inv]
}

/// Projects a final light of a `width` x `height` panorama.
pub fn project_light(light: &Light, width: u32, height: u32) -> EmittedLight {
    let (w, h) = (width as f64, height as f64);
    let (cx, cy) = (light.centroid.x, light.centroid.y);
    let position = [cy / h, cx / w];

    let pixel_solid_angle = texel_pixel_solid_angle(cx, cy, width, height);
    let region_solid_angle = texel_area_solid_angle(cx, cy, light.w as f64, light.h as f64, width, height);

    EmittedLight {
        position,
        direction: direction(cx, cy, width, height),
        luminosity: light.lum_average * pixel_solid_angle,
        color: [light.r_average as f32, light.g_average as f32, light.b_average as f32],
        area: AreaRect {
            x: position[0],
            y: position[1],
            w: light.w as f64 / w,
            h: light.h as f64 / h,
        },
        variance: light.sum * region_solid_angle,
    }
}

pub fn project_lights(lights: &[Light], width: u32, height: u32) -> Vec<EmittedLight> {
    lights.iter().map(|light| project_light(light, width, height)).collect()
}
