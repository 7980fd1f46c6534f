// THEORY:
// The `session` module owns the control loop of a surveillance run. It knows
// the order of operations (capture, detect, render, write, display) but none of
// the devices: cameras, video files and windows are reached only through the
// small collaborator traits below. The runner binary plugs in OpenCV-backed
// implementations; the tests plug in in-memory fakes.
//
// Key architectural principles:
// 1.  **Single Thread, Strict Order**: one frame is fully handled before the
//     next one is read. Nothing is shared, so nothing is locked.
// 2.  **Fail Fast on Input**: a failed read ends the loop at once. It is
//     reported in the summary and never retried.
// 3.  **Scoped Resources**: the session borrows its collaborators. Whoever
//     created them releases them when they drop, on every exit path.

use crate::core_modules::frame::AsFrame;
use crate::error::SessionError;
use crate::pipeline::{FrameReport, WatchPipeline};
use tracing::{error, info, warn};

/// Supplies frames from a camera or any other source.
pub trait FrameSource {
    type Frame: AsFrame;

    /// Blocks until the next frame is available.
    fn read(&mut self) -> Result<Self::Frame, SessionError>;
}

/// Draws detection results onto a frame in place.
pub trait Renderer<F> {
    fn draw(&mut self, frame: &mut F, report: &FrameReport) -> Result<(), SessionError>;
}

/// Persists annotated frames.
pub trait FrameWriter<F> {
    fn write(&mut self, frame: &F) -> Result<(), SessionError>;
}

/// What the user asked for while a frame was on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

/// Shows frames to the user and polls for the quit key.
pub trait Display<F> {
    fn show(&mut self, frame: &F) -> Result<KeyAction, SessionError>;
}

/// A display that shows nothing and never asks to quit.
#[derive(Debug, Default)]
pub struct Headless;

impl<F> Display<F> for Headless {
    fn show(&mut self, _frame: &F) -> Result<KeyAction, SessionError> {
        Ok(KeyAction::Continue)
    }
}

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user pressed the quit key.
    QuitRequested,
    /// The source stopped producing frames.
    SourceFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Frames run through detection (the background frame excluded).
    pub frames: u64,
    /// Alarm activations during the run.
    pub alarms: u64,
    pub end: SessionEnd,
}

pub struct Session {
    pipeline: WatchPipeline,
}

impl Session {
    pub fn new(pipeline: WatchPipeline) -> Self {
        Self { pipeline }
    }

    /// Runs until the quit key or a failed read. The first frame read becomes
    /// the background reference.
    pub fn run<S, R, W, D>(
        &mut self,
        source: &mut S,
        renderer: &mut R,
        writer: &mut W,
        display: &mut D,
    ) -> Result<SessionSummary, SessionError>
    where
        S: FrameSource,
        R: Renderer<S::Frame>,
        W: FrameWriter<S::Frame>,
        D: Display<S::Frame>,
    {
        let background = match source.read() {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, "failed to grab the background frame");
                return Ok(self.summary(0, SessionEnd::SourceFailed(e.to_string())));
            }
        };
        self.pipeline.prime(&background.as_frame()?);
        info!("background captured, monitoring started");

        let mut frames = 0u64;
        loop {
            let mut frame = match source.read() {
                Ok(frame) => frame,
                Err(e) => {
                    error!(error = %e, frames, "frame source stopped");
                    return Ok(self.summary(frames, SessionEnd::SourceFailed(e.to_string())));
                }
            };

            let report = self.pipeline.process(&frame.as_frame()?)?;
            frames += 1;
            if let Some(event) = &report.alarm {
                warn!(regions = report.regions.len(), "{event}");
            }

            renderer.draw(&mut frame, &report)?;
            writer.write(&frame)?;

            if display.show(&frame)? == KeyAction::Quit {
                info!(frames, alarm = ?self.pipeline.alarm_state(), "quit requested");
                return Ok(self.summary(frames, SessionEnd::QuitRequested));
            }
        }
    }

    fn summary(&self, frames: u64, end: SessionEnd) -> SessionSummary {
        SessionSummary {
            frames,
            alarms: self.pipeline.alarm_count(),
            end,
        }
    }
}
