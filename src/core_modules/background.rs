// THEORY:
// The `BackgroundModel` is the detector's memory of the empty scene. It holds a
// single blurred grayscale reference image and nothing else.
//
// Key architectural principles:
// 1.  **Exponential Moving Average**: The reference follows the scene with
//     `bg = bg * (1 - alpha) + frame * alpha`. A small alpha tracks slow
//     lighting drift (the sun moving across a room) while a person walking
//     through the frame barely registers.
// 2.  **Caller-Gated Learning**: The model never decides on its own when to
//     learn. The motion detector only calls `blend` on frames where it found no
//     motion, so an intruder standing still is not absorbed into the scene.
// 3.  **Fixed Geometry**: The reference keeps the dimensions of the frame it
//     was created from for its whole life.

use crate::core_modules::smoothing::LumaF32;

#[derive(Debug, Clone)]
pub struct BackgroundModel {
    /// The blurred grayscale reference, one `f32` intensity per pixel.
    reference: LumaF32,
    /// Number of frames blended into the reference since it was created.
    blended_frames: u64,
}

impl BackgroundModel {
    pub fn new(reference: LumaF32) -> Self {
        Self {
            reference,
            blended_frames: 0,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.reference.dimensions()
    }

    pub fn reference(&self) -> &LumaF32 {
        &self.reference
    }

    pub fn blended_frames(&self) -> u64 {
        self.blended_frames
    }

    /// Blends `frame` into the reference with weight `alpha` (clamped to
    /// `[0, 1]`). An alpha of zero leaves the reference untouched.
    pub fn blend(&mut self, frame: &LumaF32, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha == 0.0 {
            return;
        }
        let keep = 1.0 - alpha;
        for (bg, px) in self.reference.iter_mut().zip(frame.as_raw().iter()) {
            *bg = *bg * keep + *px * alpha;
        }
        self.blended_frames += 1;
    }

    /// Mean absolute intensity gap between the reference and `frame`.
    pub fn mean_distance(&self, frame: &LumaF32) -> f32 {
        let len = self.reference.as_raw().len();
        if len == 0 {
            return 0.0;
        }
        let total: f32 = self
            .reference
            .as_raw()
            .iter()
            .zip(frame.as_raw().iter())
            .map(|(bg, px)| (bg - px).abs())
            .sum();
        total / len as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use image::Luma;

    fn uniform(value: f32) -> LumaF32 {
        LumaF32::from_pixel(4, 3, Luma([value]))
    }

    #[test]
    fn blend_moves_toward_frame() {
        let mut model = BackgroundModel::new(uniform(100.0));
        model.blend(&uniform(200.0), 0.25);
        assert_approx_eq!(model.reference().get_pixel(0, 0).0[0], 125.0, 1e-4);
        assert_eq!(model.blended_frames(), 1);
    }

    #[test]
    fn zero_alpha_freezes_reference() {
        let mut model = BackgroundModel::new(uniform(50.0));
        model.blend(&uniform(250.0), 0.0);
        assert_eq!(model.reference().get_pixel(1, 1).0[0], 50.0);
        assert_eq!(model.blended_frames(), 0);
    }

    #[test]
    fn full_alpha_replaces_reference() {
        let mut model = BackgroundModel::new(uniform(50.0));
        model.blend(&uniform(80.0), 1.0);
        assert_approx_eq!(model.reference().get_pixel(3, 2).0[0], 80.0, 1e-5);
    }

    #[test]
    fn repeated_blends_converge_without_overshoot() {
        let mut model = BackgroundModel::new(uniform(100.0));
        let target = uniform(110.0);
        let mut last = model.mean_distance(&target);
        for _ in 0..50 {
            model.blend(&target, 0.02);
            let now = model.mean_distance(&target);
            assert!(now < last);
            last = now;
        }
        let value = model.reference().get_pixel(0, 0).0[0];
        // 110 - 10 * 0.98^50
        assert_approx_eq!(value, 106.358, 1e-2);
        assert!(value <= 110.0);
    }
}
