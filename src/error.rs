// THEORY:
// Every failure the engine can report lives here, grouped by the layer that
// raises it. The library never prints or aborts on its own; it hands these
// values back to the caller, and the runner binary decides how loud to be.
//
// - `FrameError`: a raw buffer that cannot be interpreted as a frame.
// - `DetectorError`: misuse of the motion detector (no background yet, or a
//   frame whose size differs from the background reference).
// - `ConfigError`: the TOML configuration could not be read, parsed or trusted.
// - `SessionError`: the capture loop and its collaborators (camera, writer,
//   display).

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame has a zero dimension ({width}x{height})")]
    EmptyDimensions { width: u32, height: u32 },
    #[error("frame buffer holds {got} bytes, expected {expected} for {width}x{height}x{channels}")]
    BufferSize {
        got: usize,
        expected: usize,
        width: u32,
        height: u32,
        channels: usize,
    },
    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(usize),
    #[error("frame buffer is not readable: {0}")]
    Unreadable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("background reference was never initialized; call initialize_background first")]
    Uninitialized,
    #[error("frame is {got_width}x{got_height} but the background reference is {width}x{height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        got_width: u32,
        got_height: u32,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no usable camera found (tried indices {tried:?})")]
    DeviceUnavailable { tried: Vec<i32> },
    #[error("failed to read frame: {0}")]
    FrameRead(String),
    #[error("failed to render overlay: {0}")]
    Render(String),
    #[error("failed to write frame to {path}: {reason}")]
    Writer { path: PathBuf, reason: String },
    #[error("display failure: {0}")]
    Display(String),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Detector(#[from] DetectorError),
}
