//! Session configuration
//!
//! One TOML file carries both the tracker calibration and the active
//! exercise:
//!
//! ```toml
//! [tracker]
//! sampling_fps = 24.0
//!
//! [tracker.deviation]
//! drift_threshold = 10.0
//!
//! [exercise]
//! kind = "smooth-pursuit"
//! pursuit_mode = "circular"
//! stop = { mode = "duration", ms = 30000 }
//! ```

use ocutrain_signals::config::env_parse;
use ocutrain_signals::{ConfigError, TrackerConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::session::StopPolicy;
use crate::target::{ExerciseKind, PursuitMode};

/// Exercise selection and pattern parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExerciseConfig {
    pub kind: ExerciseKind,
    pub pursuit_mode: PursuitMode,
    /// Pursuit angular speed (rad/s)
    pub pursuit_angular_speed: f32,
    /// Pursuit target refresh interval (ms)
    pub pursuit_refresh_ms: u32,
    /// Length of one pursuit run (ms)
    pub pursuit_run_ms: u32,
    pub stop: StopPolicy,
}

impl Default for ExerciseConfig {
    fn default() -> Self {
        Self {
            kind: ExerciseKind::default(),
            pursuit_mode: PursuitMode::default(),
            pursuit_angular_speed: 0.6,
            pursuit_refresh_ms: 100,
            pursuit_run_ms: 10_000,
            stop: StopPolicy::default(),
        }
    }
}

impl ExerciseConfig {
    /// Apply environment variable overrides
    /// Environment variables are prefixed with OCUTRAIN_EXERCISE_
    /// Example: OCUTRAIN_EXERCISE_KIND=convergence
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = env_parse("OCUTRAIN_EXERCISE_KIND")? {
            self.kind = v;
        }
        if let Some(v) = env_parse("OCUTRAIN_EXERCISE_PURSUIT_MODE")? {
            self.pursuit_mode = v;
        }
        if let Some(v) = env_parse("OCUTRAIN_EXERCISE_PURSUIT_ANGULAR_SPEED")? {
            self.pursuit_angular_speed = v;
        }
        if let Some(v) = env_parse("OCUTRAIN_EXERCISE_PURSUIT_REFRESH_MS")? {
            self.pursuit_refresh_ms = v;
        }
        if let Some(v) = env_parse("OCUTRAIN_EXERCISE_PURSUIT_RUN_MS")? {
            self.pursuit_run_ms = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.pursuit_angular_speed.is_finite() || self.pursuit_angular_speed <= 0.0 {
            return Err(ConfigError::Validation(
                "exercise.pursuit_angular_speed must be positive".to_string(),
            ));
        }
        if !(50..=100).contains(&self.pursuit_refresh_ms) {
            return Err(ConfigError::Validation(
                "exercise.pursuit_refresh_ms must be in [50, 100]".to_string(),
            ));
        }
        if self.pursuit_run_ms < self.pursuit_refresh_ms {
            return Err(ConfigError::Validation(
                "exercise.pursuit_run_ms must cover at least one refresh".to_string(),
            ));
        }
        match self.stop {
            StopPolicy::Steps { count: 0 } | StopPolicy::Duration { ms: 0 } => Err(
                ConfigError::Validation("exercise.stop must be non-zero".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// Tracker and exercise configuration for one training session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub tracker: TrackerConfig,
    pub exercise: ExerciseConfig,
}

impl SessionConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. User config file (if exists)
    /// 3. Default config file
    /// 4. Built-in defaults (lowest priority)
    ///
    /// The user file overrides the default file key by key, so it only needs
    /// the values it changes.
    pub fn load_layered(
        default_path: Option<&Path>,
        user_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut table = toml::Table::new();

        for path in [default_path, user_path].into_iter().flatten() {
            if path.exists() {
                let layer: toml::Table = toml::from_str(&fs::read_to_string(path)?)?;
                merge_tables(&mut table, layer);
            } else {
                log::debug!("config layer {} not found, skipping", path.display());
            }
        }

        let mut config: SessionConfig = toml::Value::Table(table).try_into()?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.tracker.apply_env_overrides()?;
        self.exercise.apply_env_overrides()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracker.validate()?;
        self.exercise.validate()
    }

    /// Export configuration to TOML string
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self
            .to_toml_string()
            .map_err(|e| ConfigError::Validation(format!("TOML serialization error: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Recursively overlay `other` onto `base`; nested tables merge, other values replace.
fn merge_tables(base: &mut toml::Table, other: toml::Table) {
    for (key, value) in other {
        match value {
            toml::Value::Table(incoming) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge_tables(existing, incoming),
                _ => {
                    base.insert(key, toml::Value::Table(incoming));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}
