use crate::camera::CapturedFrame;
use opencv::{
    core::Size,
    prelude::*,
    videoio::VideoWriter,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use watchpost::config::RecordingConfig;
use watchpost::error::SessionError;
use watchpost::session::FrameWriter;

/// Writes the annotated stream to a single video file.
///
/// The file is opened on the first write, sized after that first frame; the
/// camera resolution is fixed for the whole session.
pub struct VideoRecorder {
    output_path: PathBuf,
    fps: f64,
    fourcc: [char; 4],
    writer: Option<VideoWriter>,
    frame_count: u64,
}

impl VideoRecorder {
    pub fn new(config: &RecordingConfig) -> Self {
        Self {
            output_path: config.output_path.clone(),
            fps: config.fps,
            fourcc: fourcc_chars(&config.fourcc),
            writer: None,
            frame_count: 0,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn open(&self, size: Size) -> Result<VideoWriter, SessionError> {
        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.error(e))?;
            }
        }

        let [a, b, c, d] = self.fourcc;
        let fourcc = VideoWriter::fourcc(a, b, c, d).map_err(|e| self.error(e))?;
        let path = self.output_path.to_string_lossy();
        let writer =
            VideoWriter::new(&path, fourcc, self.fps, size, true).map_err(|e| self.error(e))?;
        if !writer.is_opened().map_err(|e| self.error(e))? {
            return Err(self.error("video writer refused to open"));
        }

        info!(
            path = %self.output_path.display(),
            width = size.width,
            height = size.height,
            fps = self.fps,
            "recording started"
        );
        Ok(writer)
    }

    fn error(&self, reason: impl ToString) -> SessionError {
        SessionError::Writer {
            path: self.output_path.clone(),
            reason: reason.to_string(),
        }
    }
}

impl FrameWriter<CapturedFrame> for VideoRecorder {
    fn write(&mut self, frame: &CapturedFrame) -> Result<(), SessionError> {
        if self.writer.is_none() {
            let size = frame.mat().size().map_err(|e| self.error(e))?;
            self.writer = Some(self.open(size)?);
        }
        if let Some(writer) = self.writer.as_mut() {
            writer.write(frame.mat()).map_err(|e| SessionError::Writer {
                path: self.output_path.clone(),
                reason: e.to_string(),
            })?;
            self.frame_count += 1;
        }
        Ok(())
    }
}

impl Drop for VideoRecorder {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            match writer.release() {
                Ok(()) => info!(
                    path = %self.output_path.display(),
                    frames = self.frame_count,
                    "recording saved"
                ),
                Err(e) => warn!(error = %e, "failed to release video writer"),
            }
        } else {
            debug!("recorder dropped before any frame was written");
        }
    }
}

/// Splits a four-character codec name; anything malformed falls back to mp4v.
fn fourcc_chars(code: &str) -> [char; 4] {
    let chars: Vec<char> = code.chars().collect();
    match chars.as_slice() {
        [a, b, c, d] => [*a, *b, *c, *d],
        _ => ['m', 'p', '4', 'v'],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourcc_is_split_into_chars() {
        assert_eq!(fourcc_chars("MJPG"), ['M', 'J', 'P', 'G']);
        assert_eq!(fourcc_chars("toolong"), ['m', 'p', '4', 'v']);
    }

    #[test]
    fn recorder_starts_closed() {
        let recorder = VideoRecorder::new(&RecordingConfig::default());
        assert_eq!(recorder.frame_count(), 0);
        assert_eq!(
            recorder.output_path(),
            Path::new("output/recordings/recording.mp4")
        );
    }
}
