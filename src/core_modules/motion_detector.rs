// THEORY:
// The `MotionDetector` is the engine of the whole system. For every frame it
// answers one question: "which parts of this image differ meaningfully from
// the empty scene?" and it keeps its picture of the empty scene current.
//
// Algorithm steps, per frame:
// 1.  **Normalize**: grayscale (Rec. 601) and Gaussian blur, the same way the
//     background was built, so both sides of the comparison share one scale.
// 2.  **Compare**: per-pixel absolute difference against the background.
// 3.  **Binarize**: pixels at or above `threshold` become foreground.
// 4.  **Dilate**: grow the foreground so fragments of one object merge.
// 5.  **Group**: extract connected components and their bounding boxes.
// 6.  **Filter**: drop components smaller than `min_region_area`.
// 7.  **Learn**: only if nothing survived the filter, blend the frame into the
//     background. Frames with motion never touch the reference.
//
// Setting `background_update_rate` to zero turns step 7 off, which gives the
// classic static-background detector.

use crate::config::DetectorConfig;
use crate::core_modules::background::BackgroundModel;
use crate::core_modules::frame::Frame;
use crate::core_modules::mask::{absolute_difference, binarize, dilate, foreground_count};
use crate::core_modules::region::{MotionRegion, extract_regions, filter_by_area};
use crate::core_modules::smoothing::{GaussianKernel, LumaF32};
use crate::error::DetectorError;
use image::GrayImage;
use tracing::debug;

pub struct MotionDetector {
    config: DetectorConfig,
    kernel: GaussianKernel,
    /// The empty-scene reference. `None` until `initialize_background`.
    background: Option<BackgroundModel>,
    /// The dilated change mask from the most recent `detect` call.
    last_mask: Option<GrayImage>,
    frames_processed: u64,
}

impl MotionDetector {
    pub fn new(config: DetectorConfig) -> Self {
        let kernel = GaussianKernel::new(config.blur_kernel);
        Self {
            config,
            kernel,
            background: None,
            last_mask: None,
            frames_processed: 0,
        }
    }

    /// Stores the blurred grayscale version of `frame` as the empty scene.
    /// Calling it again discards the previous reference.
    pub fn initialize_background(&mut self, frame: &Frame<'_>) {
        let blurred = self.normalize(frame);
        let (width, height) = blurred.dimensions();
        debug!(width, height, "background reference initialized");
        self.background = Some(BackgroundModel::new(blurred));
        self.last_mask = None;
    }

    /// Compares `frame` against the background and returns the regions of
    /// significant change. See the module notes for the exact steps.
    pub fn detect(&mut self, frame: &Frame<'_>) -> Result<Vec<MotionRegion>, DetectorError> {
        let background = self.background.as_ref().ok_or(DetectorError::Uninitialized)?;
        let (width, height) = background.dimensions();
        if frame.dimensions() != (width, height) {
            return Err(DetectorError::DimensionMismatch {
                width,
                height,
                got_width: frame.width(),
                got_height: frame.height(),
            });
        }

        let blurred = self.normalize(frame);
        let drift = background.mean_distance(&blurred);
        let diff = absolute_difference(background.reference(), &blurred);
        let mask = dilate(
            &binarize(&diff, self.config.threshold),
            self.config.dilation_passes,
        );

        let candidates = extract_regions(&mask);
        let candidate_count = candidates.len();
        let regions = filter_by_area(candidates, self.config.min_region_area);

        self.frames_processed += 1;
        debug!(
            frame = self.frames_processed,
            drift = format!("{drift:.2}"),
            foreground = foreground_count(&mask),
            candidates = candidate_count,
            regions = regions.len(),
            "motion detection pass"
        );

        if regions.is_empty() {
            if let Some(background) = self.background.as_mut() {
                background.blend(&blurred, self.config.background_update_rate);
            }
        }
        self.last_mask = Some(mask);

        Ok(regions)
    }

    pub fn background(&self) -> Option<&BackgroundModel> {
        self.background.as_ref()
    }

    pub fn last_mask(&self) -> Option<&GrayImage> {
        self.last_mask.as_ref()
    }

    /// Number of successful `detect` calls so far.
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    fn normalize(&self, frame: &Frame<'_>) -> LumaF32 {
        self.kernel.apply(&frame.to_luma())
    }
}
