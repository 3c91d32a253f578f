// THEORY:
// The `SummedAreaTable` module provides spatial pooling for the partitioner. Instead of
// re-walking every pixel of a candidate region each time the median-cut scan asks "how
// much light is in here?", we precompute prefix sums once and answer any rectangular
// query with four lookups.
//
// Key architectural principles:
// 1.  **One channel per table**: A `SummedAreaTable` integrates a single scalar field.
//     The `LuminanceField` bundles the handful of tables a region needs (luminance,
//     squared luminance for variance, and the three color channels for averages).
// 2.  **Padded layout**: Tables are `(width + 1) x (height + 1)` with a zero first row
//     and column, so queries never branch on image borders.
// 3.  **f64 accumulation**: HDR panoramas routinely contain values in the thousands
//     (the sun) next to values near zero. Summing in f64 keeps the small contributions
//     from vanishing in large tables.

pub mod summed_area_table {
    use crate::core_modules::pixel::pixel::HdrImage;

    /// Prefix-sum table over a single scalar field.
    #[derive(Debug, Clone)]
    pub struct SummedAreaTable {
        width: u32,
        height: u32,
        data: Vec<f64>,
    }

    impl SummedAreaTable {
        /// Integrates `value(x, y)` over a `width x height` grid.
        pub fn from_fn(width: u32, height: u32, mut value: impl FnMut(u32, u32) -> f64) -> Self {
            let stride = width as usize + 1;
            let mut data = vec![0.0; stride * (height as usize + 1)];

            for y in 0..height as usize {
                let mut row_sum = 0.0;
                for x in 0..width as usize {
                    row_sum += value(x as u32, y as u32);
                    data[(y + 1) * stride + x + 1] = data[y * stride + x + 1] + row_sum;
                }
            }

            Self {
                width,
                height,
                data,
            }
        }

        /// Sum of the field over the rectangle `[x, x + w) x [y, y + h)`.
        #[inline]
        pub fn sum(&self, x: u32, y: u32, w: u32, h: u32) -> f64 {
            let stride = self.width as usize + 1;
            let (x0, y0) = (x as usize, y as usize);
            let (x1, y1) = (x0 + w as usize, y0 + h as usize);
            debug_assert!(x1 <= self.width as usize && y1 <= self.height as usize);

            self.data[y1 * stride + x1] - self.data[y0 * stride + x1] - self.data[y1 * stride + x0]
                + self.data[y0 * stride + x0]
        }

        pub fn width(&self) -> u32 {
            self.width
        }

        pub fn height(&self) -> u32 {
            self.height
        }
    }

    /// The set of integrals a region query needs, built once per image.
    #[derive(Debug, Clone)]
    pub struct LuminanceField {
        pub luminance: SummedAreaTable,
        pub luminance_squared: SummedAreaTable,
        pub red: SummedAreaTable,
        pub green: SummedAreaTable,
        pub blue: SummedAreaTable,
    }

    impl LuminanceField {
        pub fn new(image: &HdrImage) -> Self {
            let (w, h) = (image.width, image.height);
            let lum: Vec<f64> = (0..image.pixel_count())
                .map(|i| image.pixel_at(i).luminance())
                .collect();
            let at = |x: u32, y: u32| y as usize * w as usize + x as usize;

            Self {
                luminance: SummedAreaTable::from_fn(w, h, |x, y| lum[at(x, y)]),
                luminance_squared: SummedAreaTable::from_fn(w, h, |x, y| {
                    let l = lum[at(x, y)];
                    l * l
                }),
                red: SummedAreaTable::from_fn(w, h, |x, y| image.pixel(x, y).red as f64),
                green: SummedAreaTable::from_fn(w, h, |x, y| image.pixel(x, y).green as f64),
                blue: SummedAreaTable::from_fn(w, h, |x, y| image.pixel(x, y).blue as f64),
            }
        }

        pub fn width(&self) -> u32 {
            self.luminance.width()
        }

        pub fn height(&self) -> u32 {
            self.luminance.height()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::summed_area_table::*;
    use crate::core_modules::pixel::pixel::{HdrImage, HdrPixel};

    fn counting_table() -> SummedAreaTable {
        // 4x3 grid holding 0..12 row-major.
        SummedAreaTable::from_fn(4, 3, |x, y| (y * 4 + x) as f64)
    }

    #[test]
    fn full_extent_sums_everything() {
        let table = counting_table();
        assert_eq!(table.sum(0, 0, 4, 3), (0..12).sum::<u32>() as f64);
    }

    #[test]
    fn single_cell_query() {
        let table = counting_table();
        assert_eq!(table.sum(2, 1, 1, 1), 6.0);
        assert_eq!(table.sum(3, 2, 1, 1), 11.0);
    }

    #[test]
    fn interior_rectangle() {
        let table = counting_table();
        // cells 5, 6, 9, 10
        assert_eq!(table.sum(1, 1, 2, 2), 30.0);
    }

    #[test]
    fn empty_rectangle_is_zero() {
        let table = counting_table();
        assert_eq!(table.sum(2, 1, 0, 2), 0.0);
        assert_eq!(table.sum(4, 3, 0, 0), 0.0);
    }

    #[test]
    fn field_tracks_color_channels() {
        let image = HdrImage::from_fn(2, 2, |x, _| HdrPixel::new(x as f32 + 1.0, 2.0, 0.5));
        let field = LuminanceField::new(&image);
        assert_eq!(field.red.sum(0, 0, 2, 2), 6.0);
        assert_eq!(field.green.sum(0, 0, 2, 2), 8.0);
        assert_eq!(field.blue.sum(0, 0, 2, 2), 2.0);
        assert_eq!((field.width(), field.height()), (2, 2));
    }
}
