// THEORY:
// Camera sensors are noisy: individual pixels flicker by a few intensity levels
// from frame to frame even when nothing moves. Comparing raw frames would turn
// that flicker into false motion. The `smoothing` module suppresses it with a
// separable Gaussian blur applied to every grayscale frame before comparison.
//
// The blurred result is kept in `f32` so that the background model can blend
// many frames together without losing small contributions to integer rounding.

use image::{GrayImage, ImageBuffer, Luma};

/// A single-channel image with floating-point intensities (0.0-255.0).
pub type LumaF32 = ImageBuffer<Luma<f32>, Vec<f32>>;

/// A normalized one-dimensional Gaussian kernel, applied along both axes.
#[derive(Debug, Clone)]
pub struct GaussianKernel {
    weights: Vec<f32>,
}

impl GaussianKernel {
    /// Builds a kernel covering `size` pixels. Even sizes are widened to the
    /// next odd size so the kernel always has a centre tap.
    pub fn new(size: u32) -> Self {
        let size = (size.max(1) | 1) as usize;
        let sigma = Self::sigma_for(size as u32);
        let center = (size / 2) as f32;
        let two_sigma_sq = 2.0 * sigma * sigma;

        let mut weights: Vec<f32> = (0..size)
            .map(|i| {
                let d = i as f32 - center;
                (-(d * d) / two_sigma_sq).exp()
            })
            .collect();
        let total: f32 = weights.iter().sum();
        for w in &mut weights {
            *w /= total;
        }
        Self { weights }
    }

    /// Standard deviation derived from the kernel size, matching the common
    /// "sigma = 0" convention of image-processing libraries.
    pub fn sigma_for(size: u32) -> f32 {
        0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
    }

    pub fn size(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Blurs a grayscale image. Borders are mirrored without repeating the
    /// edge pixel (reflect-101).
    pub fn apply(&self, image: &GrayImage) -> LumaF32 {
        let (width, height) = image.dimensions();
        let (w, h) = (width as usize, height as usize);
        let radius = (self.weights.len() / 2) as isize;
        let src = image.as_raw();

        // Horizontal pass.
        let mut horizontal = vec![0.0f32; w * h];
        for y in 0..h {
            let row = &src[y * w..(y + 1) * w];
            for x in 0..w {
                let mut acc = 0.0f32;
                for (k, weight) in self.weights.iter().enumerate() {
                    let sx = reflect_101(x as isize + k as isize - radius, w);
                    acc += *weight * row[sx] as f32;
                }
                horizontal[y * w + x] = acc;
            }
        }

        // Vertical pass.
        let mut out = vec![0.0f32; w * h];
        for y in 0..h {
            for x in 0..w {
                let mut acc = 0.0f32;
                for (k, weight) in self.weights.iter().enumerate() {
                    let sy = reflect_101(y as isize + k as isize - radius, h);
                    acc += *weight * horizontal[sy * w + x];
                }
                out[y * w + x] = acc;
            }
        }

        ImageBuffer::from_raw(width, height, out)
            .unwrap_or_else(|| ImageBuffer::from_pixel(width, height, Luma([0.0])))
    }
}

/// Maps an out-of-range coordinate back inside `0..len` by mirroring around
/// the edge pixels: `-1 -> 1`, `len -> len - 2`.
fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let mut i = index.rem_euclid(period);
    if i >= len as isize {
        i = period - i;
    }
    i as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let kernel = GaussianKernel::new(21);
        assert_eq!(kernel.size(), 21);
        let total: f32 = kernel.weights().iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        let w = kernel.weights();
        for i in 0..w.len() / 2 {
            assert!((w[i] - w[w.len() - 1 - i]).abs() < 1e-7);
        }
        assert!(w[10] > w[9]);
    }

    #[test]
    fn sigma_matches_size_convention() {
        assert!((GaussianKernel::sigma_for(21) - 3.5).abs() < 1e-6);
        assert!((GaussianKernel::sigma_for(3) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn even_size_is_widened() {
        assert_eq!(GaussianKernel::new(4).size(), 5);
    }

    #[test]
    fn reflect_101_mirrors_edges() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-7, 1), 0);
        // Radius larger than the image bounces more than once.
        assert_eq!(reflect_101(-10, 4), 2);
    }

    #[test]
    fn uniform_image_is_unchanged() {
        let image = GrayImage::from_pixel(8, 6, Luma([100]));
        let blurred = GaussianKernel::new(21).apply(&image);
        for p in blurred.pixels() {
            assert!((p.0[0] - 100.0).abs() < 1e-3);
        }
    }

    #[test]
    fn blur_spreads_a_bright_dot() {
        let mut image = GrayImage::from_pixel(15, 15, Luma([0]));
        image.put_pixel(7, 7, Luma([255]));
        let blurred = GaussianKernel::new(5).apply(&image);
        let center = blurred.get_pixel(7, 7).0[0];
        let neighbour = blurred.get_pixel(8, 7).0[0];
        assert!(center < 255.0);
        assert!(neighbour > 0.0);
        assert!(center > neighbour);
        assert_eq!(blurred.get_pixel(0, 0).0[0], 0.0);
    }
}
