// THEORY:
// Opening a webcam reliably is mostly heuristics. Device indices shift when
// phones or virtual cameras come and go, and a freshly opened sensor often
// delivers a run of black frames before the exposure settles. The `camera`
// module hides that dance behind `open_first_working`: list what is there,
// probe the configured indices in order, warm each one up, and keep the first
// device whose picture is brighter than a near-black floor.

use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use watchpost::config::CameraConfig;
use watchpost::core_modules::frame::{AsFrame, Frame, PixelLayout};
use watchpost::error::{FrameError, SessionError};
use watchpost::session::FrameSource;

/// One frame as delivered by OpenCV (BGR, 8 bits per channel).
pub struct CapturedFrame {
    mat: Mat,
}

impl CapturedFrame {
    pub fn mat(&self) -> &Mat {
        &self.mat
    }

    pub fn mat_mut(&mut self) -> &mut Mat {
        &mut self.mat
    }
}

impl AsFrame for CapturedFrame {
    fn as_frame(&self) -> Result<Frame<'_>, FrameError> {
        let layout = match self.mat.channels() {
            3 => PixelLayout::Bgr,
            1 => PixelLayout::Gray,
            n => return Err(FrameError::UnsupportedChannels(n.max(0) as usize)),
        };
        let data = self
            .mat
            .data_bytes()
            .map_err(|e| FrameError::Unreadable(e.to_string()))?;
        Frame::new(self.mat.cols() as u32, self.mat.rows() as u32, layout, data)
    }
}

/// An opened capture device. Released when dropped.
pub struct Camera {
    capture: VideoCapture,
    index: i32,
}

impl Camera {
    pub fn index(&self) -> i32 {
        self.index
    }

    fn grab(&mut self) -> Result<CapturedFrame, SessionError> {
        let mut mat = Mat::default();
        match self.capture.read(&mut mat) {
            Ok(true) if !mat.empty() => Ok(CapturedFrame { mat }),
            Ok(_) => Err(SessionError::FrameRead(format!(
                "camera {} returned no frame",
                self.index
            ))),
            Err(e) => Err(SessionError::FrameRead(e.to_string())),
        }
    }

    fn discard(&mut self, count: u32) {
        for _ in 0..count {
            if let Err(e) = self.grab() {
                debug!(index = self.index, error = %e, "warm-up read failed");
            }
        }
    }

    /// Final warm-up before the background frame: drop a batch of frames and
    /// give auto-exposure a moment to settle.
    pub fn settle(&mut self, config: &CameraConfig) {
        info!(
            index = self.index,
            frames = config.warmup_frames,
            settle_ms = config.settle_ms,
            "final camera warm-up"
        );
        self.discard(config.warmup_frames);
        thread::sleep(Duration::from_millis(config.settle_ms));
    }
}

impl FrameSource for Camera {
    type Frame = CapturedFrame;

    fn read(&mut self) -> Result<CapturedFrame, SessionError> {
        self.grab()
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        match self.capture.release() {
            Ok(()) => debug!(index = self.index, "camera released"),
            Err(e) => warn!(index = self.index, error = %e, "failed to release camera"),
        }
    }
}

/// Maps a backend name from the config onto an OpenCV capture API id.
/// Unknown names fall back to automatic selection.
pub fn backend_id(name: &str) -> i32 {
    match name.to_ascii_lowercase().as_str() {
        "avfoundation" => videoio::CAP_AVFOUNDATION,
        "v4l2" | "v4l" => videoio::CAP_V4L2,
        "dshow" => videoio::CAP_DSHOW,
        "msmf" => videoio::CAP_MSMF,
        _ => videoio::CAP_ANY,
    }
}

fn try_open(index: i32, backend: i32) -> Option<VideoCapture> {
    match VideoCapture::new(index, backend) {
        Ok(capture) if capture.is_opened().unwrap_or(false) => Some(capture),
        Ok(capture) => {
            release_probe(capture, index);
            None
        }
        Err(e) => {
            debug!(index, error = %e, "capture constructor failed");
            None
        }
    }
}

/// Closes a capture opened only to probe `index`. Returns false, after
/// logging, when OpenCV reports a failure.
fn release_probe(mut capture: VideoCapture, index: i32) -> bool {
    match capture.release() {
        Ok(()) => true,
        Err(e) => {
            warn!(index, error = %e, "failed to release probed camera");
            false
        }
    }
}

/// Logs every device index below `list_limit` that opens, and returns them.
pub fn list_cameras(config: &CameraConfig) -> Vec<i32> {
    let backend = backend_id(&config.backend);
    let mut found = Vec::new();
    for index in 0..config.list_limit {
        if let Some(capture) = try_open(index, backend) {
            info!(index, "camera found");
            found.push(index);
            release_probe(capture, index);
        }
    }
    found
}

/// True when a warm frame is bright enough to come from a live sensor.
pub fn is_live(brightness: f64, floor: f64) -> bool {
    brightness > floor
}

/// Probes `config.probe_indices` in order and returns the first camera that
/// delivers a non-black frame after warm-up.
pub fn open_first_working(config: &CameraConfig) -> Result<Camera, SessionError> {
    let available = list_cameras(config);
    info!(?available, backend = %config.backend, "camera scan complete");

    let backend = backend_id(&config.backend);
    for &index in &config.probe_indices {
        info!(index, "trying camera");
        let Some(capture) = try_open(index, backend) else {
            warn!(index, "camera failed to open");
            continue;
        };

        let mut camera = Camera { capture, index };
        camera.discard(config.warmup_frames);

        match camera.grab() {
            Ok(frame) => {
                let brightness = frame
                    .as_frame()
                    .map(|f| f.mean_brightness())
                    .unwrap_or(0.0);
                if is_live(brightness, config.brightness_floor) {
                    info!(index, brightness = format!("{brightness:.1}"), "camera working");
                    return Ok(camera);
                }
                warn!(
                    index,
                    brightness = format!("{brightness:.1}"),
                    floor = config.brightness_floor,
                    "camera opened but frame is black"
                );
            }
            Err(e) => warn!(index, error = %e, "camera opened but delivered no frame"),
        }
    }

    Err(SessionError::DeviceUnavailable {
        tried: config.probe_indices.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_map_to_capture_apis() {
        assert_eq!(backend_id("avfoundation"), videoio::CAP_AVFOUNDATION);
        assert_eq!(backend_id("V4L2"), videoio::CAP_V4L2);
        assert_eq!(backend_id("dshow"), videoio::CAP_DSHOW);
        assert_eq!(backend_id("something-else"), videoio::CAP_ANY);
    }

    #[test]
    fn releasing_an_unopened_capture_succeeds() {
        let capture = VideoCapture::default().unwrap();
        assert!(release_probe(capture, 0));
    }

    #[test]
    fn near_black_frames_are_not_live() {
        assert!(!is_live(0.0, 2.0));
        assert!(!is_live(2.0, 2.0));
        assert!(is_live(2.1, 2.0));
    }
}
