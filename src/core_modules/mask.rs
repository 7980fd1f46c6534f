// THEORY:
// The `mask` module turns a continuous "how different is this pixel" map into a
// binary foreground/background mask, then cleans that mask up so one moving
// object shows up as one solid shape instead of a spray of fragments.

use crate::core_modules::smoothing::LumaF32;
use image::{GrayImage, Luma};

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Per-pixel absolute difference between two blurred images.
///
/// Both images must have the same dimensions; the caller checks this.
pub fn absolute_difference(a: &LumaF32, b: &LumaF32) -> LumaF32 {
    let (width, height) = a.dimensions();
    let diff: Vec<f32> = a
        .as_raw()
        .iter()
        .zip(b.as_raw().iter())
        .map(|(x, y)| (x - y).abs())
        .collect();
    LumaF32::from_raw(width, height, diff)
        .unwrap_or_else(|| LumaF32::from_pixel(width, height, Luma([0.0])))
}

/// Marks every pixel whose difference is at least `threshold` as foreground.
pub fn binarize(diff: &LumaF32, threshold: u8) -> GrayImage {
    let threshold = threshold as f32;
    let (width, height) = diff.dimensions();
    let bits: Vec<u8> = diff
        .as_raw()
        .iter()
        .map(|&d| if d >= threshold { FOREGROUND } else { BACKGROUND })
        .collect();
    GrayImage::from_raw(width, height, bits)
        .unwrap_or_else(|| GrayImage::from_pixel(width, height, Luma([BACKGROUND])))
}

/// Grows foreground regions by one pixel in every direction (3x3 square),
/// `passes` times. Pixels outside the image never count as foreground.
pub fn dilate(mask: &GrayImage, passes: u32) -> GrayImage {
    let mut current = mask.clone();
    for _ in 0..passes {
        current = dilate_once(&current);
    }
    current
}

fn dilate_once(mask: &GrayImage) -> GrayImage {
    let (width, height) = mask.dimensions();
    let mut out = GrayImage::from_pixel(width, height, Luma([BACKGROUND]));
    for y in 0..height {
        for x in 0..width {
            let y0 = y.saturating_sub(1);
            let y1 = (y + 1).min(height - 1);
            let x0 = x.saturating_sub(1);
            let x1 = (x + 1).min(width - 1);

            let mut hit = false;
            'scan: for ny in y0..=y1 {
                for nx in x0..=x1 {
                    if mask.get_pixel(nx, ny).0[0] == FOREGROUND {
                        hit = true;
                        break 'scan;
                    }
                }
            }
            if hit {
                out.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
    }
    out
}

/// Number of foreground pixels in a mask.
pub fn foreground_count(mask: &GrayImage) -> usize {
    mask.as_raw().iter().filter(|&&b| b == FOREGROUND).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_inclusive() {
        let diff = LumaF32::from_raw(3, 1, vec![24.9, 25.0, 80.0]).unwrap();
        let mask = binarize(&diff, 25);
        assert_eq!(mask.as_raw(), &vec![BACKGROUND, FOREGROUND, FOREGROUND]);
    }

    #[test]
    fn difference_is_symmetric() {
        let a = LumaF32::from_raw(2, 1, vec![10.0, 200.0]).unwrap();
        let b = LumaF32::from_raw(2, 1, vec![30.0, 50.0]).unwrap();
        assert_eq!(absolute_difference(&a, &b).as_raw(), &vec![20.0, 150.0]);
        assert_eq!(absolute_difference(&b, &a).as_raw(), &vec![20.0, 150.0]);
    }

    #[test]
    fn single_pixel_dilates_to_square() {
        let mut mask = GrayImage::from_pixel(9, 9, Luma([BACKGROUND]));
        mask.put_pixel(4, 4, Luma([FOREGROUND]));

        let once = dilate(&mask, 1);
        assert_eq!(foreground_count(&once), 9);

        let twice = dilate(&mask, 2);
        assert_eq!(foreground_count(&twice), 25);
        assert_eq!(twice.get_pixel(2, 2).0[0], FOREGROUND);
        assert_eq!(twice.get_pixel(1, 1).0[0], BACKGROUND);
    }

    #[test]
    fn dilation_closes_small_gaps() {
        let mut mask = GrayImage::from_pixel(7, 1, Luma([BACKGROUND]));
        mask.put_pixel(1, 0, Luma([FOREGROUND]));
        mask.put_pixel(3, 0, Luma([FOREGROUND]));
        let dilated = dilate(&mask, 1);
        assert_eq!(dilated.get_pixel(2, 0).0[0], FOREGROUND);
    }

    #[test]
    fn zero_passes_is_identity() {
        let mut mask = GrayImage::from_pixel(4, 4, Luma([BACKGROUND]));
        mask.put_pixel(0, 0, Luma([FOREGROUND]));
        assert_eq!(dilate(&mask, 0), mask);
    }

    #[test]
    fn corner_pixel_stays_inside_image() {
        let mut mask = GrayImage::from_pixel(4, 4, Luma([BACKGROUND]));
        mask.put_pixel(0, 0, Luma([FOREGROUND]));
        assert_eq!(foreground_count(&dilate(&mask, 1)), 4);
    }
}
