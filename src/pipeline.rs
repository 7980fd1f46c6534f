// THEORY:
// The `pipeline` module is the top-level API of the engine. It couples the
// motion detector with the alarm so a caller hands in a frame and gets back one
// `FrameReport` describing everything the renderer and the logger need.

use crate::config::DetectorConfig;
use crate::core_modules::alarm::Alarm;
use crate::core_modules::frame::Frame;
use crate::core_modules::motion_detector::MotionDetector;
use crate::error::DetectorError;
use chrono::{DateTime, Local};

// Re-export key data structures for the public API.
pub use crate::core_modules::alarm::{AlarmEvent, AlarmState};
pub use crate::core_modules::region::{BoundingBox, MotionRegion};

/// Whether a frame is considered safe to ignore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneStatus {
    Safe,
    Unsafe,
}

impl SceneStatus {
    pub fn label(self) -> &'static str {
        match self {
            SceneStatus::Safe => "SAFE",
            SceneStatus::Unsafe => "UNSAFE",
        }
    }
}

/// The output of the pipeline for a single frame.
#[derive(Debug, Clone)]
pub struct FrameReport {
    /// 1-based index of the frame among those processed by this pipeline.
    pub frame_index: u64,
    pub regions: Vec<MotionRegion>,
    pub status: SceneStatus,
    /// Set only on the frame where the alarm went off.
    pub alarm: Option<AlarmEvent>,
    pub captured_at: DateTime<Local>,
}

impl FrameReport {
    pub fn is_unsafe(&self) -> bool {
        self.status == SceneStatus::Unsafe
    }
}

pub struct WatchPipeline {
    detector: MotionDetector,
    alarm: Alarm,
}

impl WatchPipeline {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            detector: MotionDetector::new(config),
            alarm: Alarm::new(),
        }
    }

    /// Captures the empty scene. Must run once before `process`.
    pub fn prime(&mut self, frame: &Frame<'_>) {
        self.detector.initialize_background(frame);
    }

    pub fn process(&mut self, frame: &Frame<'_>) -> Result<FrameReport, DetectorError> {
        self.process_at(frame, Local::now())
    }

    /// Same as `process`, with the wall-clock time supplied by the caller.
    pub fn process_at(
        &mut self,
        frame: &Frame<'_>,
        now: DateTime<Local>,
    ) -> Result<FrameReport, DetectorError> {
        let regions = self.detector.detect(frame)?;
        let motion = !regions.is_empty();
        let alarm = self.alarm.update(motion, now);

        Ok(FrameReport {
            frame_index: self.detector.frames_processed(),
            regions,
            status: if motion {
                SceneStatus::Unsafe
            } else {
                SceneStatus::Safe
            },
            alarm,
            captured_at: now,
        })
    }

    pub fn alarm_state(&self) -> AlarmState {
        self.alarm.state()
    }

    pub fn alarm_count(&self) -> u64 {
        self.alarm.trigger_count()
    }
}
