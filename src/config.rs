use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

/// Top-level configuration, usually read from `watchpost.toml`.
///
/// Every section and field has a default, so an empty file (or no file at
/// all, see [`Config::load_or_default`]) yields a working setup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Tuning for the background-subtraction motion detector.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Minimum per-pixel intensity difference (0-255) that counts as change.
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    /// Minimum connected-region area, in pixels, that counts as motion.
    #[serde(default = "default_min_region_area")]
    pub min_region_area: u64,
    /// Rounds of 3x3 dilation applied to the change mask.
    #[serde(default = "default_dilation_passes")]
    pub dilation_passes: u32,
    /// Weight of a motion-free frame when blended into the background.
    /// Zero keeps the first background forever.
    #[serde(default = "default_background_update_rate")]
    pub background_update_rate: f32,
    /// Side length of the Gaussian blur kernel. Must be odd.
    #[serde(default = "default_blur_kernel")]
    pub blur_kernel: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    /// Device indices tried in order until one delivers a usable frame.
    #[serde(default = "default_probe_indices")]
    pub probe_indices: Vec<i32>,
    /// How many indices to list at startup, starting from zero.
    #[serde(default = "default_list_limit")]
    pub list_limit: i32,
    /// Capture backend: "any", "avfoundation", "v4l2", "dshow" or "msmf".
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Frames discarded after opening a device, before judging it.
    #[serde(default = "default_warmup_frames")]
    pub warmup_frames: u32,
    /// Mean brightness a frame must exceed for the device to count as live.
    #[serde(default = "default_brightness_floor")]
    pub brightness_floor: f64,
    /// Pause after the final warm-up, before the background frame is taken.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordingConfig {
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_fps")]
    pub fps: f64,
    /// Four-character codec code handed to the video writer.
    #[serde(default = "default_fourcc")]
    pub fourcc: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Show a preview window. Without it the session only ends when the
    /// camera stops delivering frames.
    #[serde(default = "default_display_enabled")]
    pub enabled: bool,
    #[serde(default = "default_window_title")]
    pub window_title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            min_region_area: default_min_region_area(),
            dilation_passes: default_dilation_passes(),
            background_update_rate: default_background_update_rate(),
            blur_kernel: default_blur_kernel(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            probe_indices: default_probe_indices(),
            list_limit: default_list_limit(),
            backend: default_backend(),
            warmup_frames: default_warmup_frames(),
            brightness_floor: default_brightness_floor(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            fps: default_fps(),
            fourcc: default_fourcc(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: default_display_enabled(),
            window_title: default_window_title(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::parse(&content)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector.validate()?;
        if self.camera.probe_indices.is_empty() {
            return Err(ConfigError::Invalid {
                field: "camera.probe_indices",
                reason: "at least one device index is required".into(),
            });
        }
        if !(self.recording.fps > 0.0) {
            return Err(ConfigError::Invalid {
                field: "recording.fps",
                reason: format!("must be positive, got {}", self.recording.fps),
            });
        }
        if self.recording.fourcc.chars().count() != 4 {
            return Err(ConfigError::Invalid {
                field: "recording.fourcc",
                reason: format!("expected four characters, got {:?}", self.recording.fourcc),
            });
        }
        self.logging.level_filter()?;
        Ok(())
    }
}

impl LoggingConfig {
    /// The configured level as a filter. Accepts `off`, `error`, `warn`,
    /// `info`, `debug` and `trace`, in any case.
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.level
            .trim()
            .parse::<LevelFilter>()
            .map_err(|_| ConfigError::Invalid {
                field: "logging.level",
                reason: format!(
                    "expected one of off, error, warn, info, debug, trace, got {:?}",
                    self.level
                ),
            })
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blur_kernel == 0 || self.blur_kernel % 2 == 0 {
            return Err(ConfigError::Invalid {
                field: "detector.blur_kernel",
                reason: format!("must be a positive odd number, got {}", self.blur_kernel),
            });
        }
        if !(0.0..=1.0).contains(&self.background_update_rate) {
            return Err(ConfigError::Invalid {
                field: "detector.background_update_rate",
                reason: format!("must lie in [0, 1], got {}", self.background_update_rate),
            });
        }
        Ok(())
    }
}

// Default value functions
fn default_threshold() -> u8 {
    25
}
fn default_min_region_area() -> u64 {
    500
}
fn default_dilation_passes() -> u32 {
    2
}
fn default_background_update_rate() -> f32 {
    0.02
}
fn default_blur_kernel() -> u32 {
    21
}
fn default_probe_indices() -> Vec<i32> {
    vec![0, 1, 2]
}
fn default_list_limit() -> i32 {
    5
}
fn default_backend() -> String {
    "any".into()
}
fn default_warmup_frames() -> u32 {
    20
}
fn default_brightness_floor() -> f64 {
    2.0
}
fn default_settle_ms() -> u64 {
    500
}
fn default_output_path() -> PathBuf {
    PathBuf::from("output/recordings/recording.mp4")
}
fn default_fps() -> f64 {
    20.0
}
fn default_fourcc() -> String {
    "mp4v".into()
}
fn default_display_enabled() -> bool {
    true
}
fn default_window_title() -> String {
    "Watchpost".into()
}
fn default_log_level() -> String {
    "info".into()
}
