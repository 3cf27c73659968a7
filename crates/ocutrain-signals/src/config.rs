use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameDims {
    pub width: f32,
    pub height: f32,
}

impl Default for FrameDims {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
        }
    }
}

/// How blink rate is scaled from the blink history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BlinkRateMode {
    /// closed-frame fraction × 60 × fps
    #[default]
    PerFrameFraction,
    /// closed→open transitions × 60 / window seconds
    WindowDuration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Effective sampling rate of the landmark source (frames per second)
    pub sampling_fps: f32,
    /// Normalization frame for gaze direction
    pub reference_frame: FrameDims,
    /// Vertical eye offset (px) at which alignment reaches 0
    pub alignment_tolerance_px: f32,
    /// Average openness below which the eyes count as closed
    pub blink_closed_threshold: f32,
    pub blink_rate_mode: BlinkRateMode,
    /// Blink history length in frames
    pub blink_window: usize,
    /// Eye-center history length in frames
    pub position_window: usize,
    /// In-flight detections older than this are abandoned
    pub detection_timeout_ms: u64,
    /// Clear histories when the face is lost
    pub clear_history_on_face_lost: bool,
    pub deviation: DeviationConfig,
}

/// Lazy-eye drift calibration constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviationConfig {
    /// Weight on vertical eye offset
    pub vertical_weight: f32,
    /// Weight on eye midpoint offset from face center
    pub midpoint_weight: f32,
    /// Weight on interocular distance error
    pub interocular_weight: f32,
    /// Expected interocular distance (px)
    pub expected_interocular_px: f32,
    /// Expected left eye x as fraction of frame width
    pub left_eye_expected_frac: f32,
    /// Expected right eye x as fraction of frame width
    pub right_eye_expected_frac: f32,
    /// Deviation history length (samples); classification waits for a full window
    pub window: usize,
    /// Samples averaged for the drift decision
    pub averaging_window: usize,
    /// Average deviation above which drift is flagged
    pub drift_threshold: f32,
    /// Horizontal offset margin (px) between eyes that picks the lazy side
    pub horizontal_margin_px: f32,
    /// Vertical offset (px) above which the lower eye is flagged
    pub vertical_threshold_px: f32,
    /// Single-sample deviation above which severity is severe
    pub severe_threshold: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sampling_fps: 30.0,
            reference_frame: FrameDims::default(),
            alignment_tolerance_px: 20.0,
            blink_closed_threshold: 0.3,
            blink_rate_mode: BlinkRateMode::default(),
            blink_window: 60,
            position_window: 30,
            detection_timeout_ms: 500,
            clear_history_on_face_lost: true,
            deviation: DeviationConfig::default(),
        }
    }
}

impl Default for DeviationConfig {
    fn default() -> Self {
        Self {
            vertical_weight: 2.0,
            midpoint_weight: 0.5,
            interocular_weight: 0.3,
            expected_interocular_px: 60.0,
            left_eye_expected_frac: 0.35,
            right_eye_expected_frac: 0.65,
            window: 60,
            averaging_window: 30,
            drift_threshold: 12.0,
            horizontal_margin_px: 15.0,
            vertical_threshold_px: 8.0,
            severe_threshold: 20.0,
        }
    }
}

impl TrackerConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: TrackerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    /// Environment variables are prefixed with OCUTRAIN_TRACKER_
    /// Example: OCUTRAIN_TRACKER_SAMPLING_FPS=60
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = env_parse("OCUTRAIN_TRACKER_SAMPLING_FPS")? {
            self.sampling_fps = v;
        }
        if let Some(v) = env_parse("OCUTRAIN_TRACKER_REFERENCE_WIDTH")? {
            self.reference_frame.width = v;
        }
        if let Some(v) = env_parse("OCUTRAIN_TRACKER_REFERENCE_HEIGHT")? {
            self.reference_frame.height = v;
        }
        if let Some(v) = env_parse("OCUTRAIN_TRACKER_BLINK_CLOSED_THRESHOLD")? {
            self.blink_closed_threshold = v;
        }
        if let Some(v) = env_parse("OCUTRAIN_TRACKER_DETECTION_TIMEOUT_MS")? {
            self.detection_timeout_ms = v;
        }
        if let Some(v) = env_parse("OCUTRAIN_TRACKER_DRIFT_THRESHOLD")? {
            self.deviation.drift_threshold = v;
        }
        if let Some(v) = env_parse("OCUTRAIN_TRACKER_SEVERE_THRESHOLD")? {
            self.deviation.severe_threshold = v;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_positive(self.sampling_fps) {
            return Err(ConfigError::Validation(
                "sampling_fps must be positive".to_string(),
            ));
        }
        if !is_positive(self.reference_frame.width) || !is_positive(self.reference_frame.height) {
            return Err(ConfigError::Validation(
                "reference_frame dimensions must be positive".to_string(),
            ));
        }
        if !is_positive(self.alignment_tolerance_px) {
            return Err(ConfigError::Validation(
                "alignment_tolerance_px must be positive".to_string(),
            ));
        }
        if !is_positive(self.blink_closed_threshold) {
            return Err(ConfigError::Validation(
                "blink_closed_threshold must be positive".to_string(),
            ));
        }
        if self.blink_window == 0 || self.position_window == 0 {
            return Err(ConfigError::Validation(
                "history windows must be non-empty".to_string(),
            ));
        }
        self.deviation.validate()
    }
}

impl DeviationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::Validation(
                "deviation.window must be non-empty".to_string(),
            ));
        }
        if self.averaging_window == 0 || self.averaging_window > self.window {
            return Err(ConfigError::Validation(
                "deviation.averaging_window must be in [1, window]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.left_eye_expected_frac)
            || !(0.0..=1.0).contains(&self.right_eye_expected_frac)
            || self.left_eye_expected_frac >= self.right_eye_expected_frac
        {
            return Err(ConfigError::Validation(
                "deviation expected eye fractions must satisfy 0 <= left < right <= 1".to_string(),
            ));
        }
        if [self.vertical_weight, self.midpoint_weight, self.interocular_weight]
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(ConfigError::Validation(
                "deviation weights must be non-negative".to_string(),
            ));
        }
        if [
            self.expected_interocular_px,
            self.drift_threshold,
            self.horizontal_margin_px,
            self.vertical_threshold_px,
            self.severe_threshold,
        ]
        .iter()
        .any(|v| !v.is_finite())
        {
            return Err(ConfigError::Validation(
                "deviation thresholds must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Finite and strictly positive (rejects NaN)
fn is_positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

/// Parse an optional environment variable, reporting malformed values.
pub fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(val) => val
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Validation(format!("Invalid {}", key))),
        Err(_) => Ok(None),
    }
}
