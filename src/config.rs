// Engine configuration - RON file with defaults for every field

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("RON serialization error: {0}")]
    Serialize(#[from] ron::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Master bus gain, 0.0 - 2.0
    pub master_gain: f32,
    /// Default scheduling lookahead for live triggers, in seconds
    pub lookahead_s: f64,
    pub metronome_bpm: f64,
    pub quantize_grid_ms: f64,
    /// Metronome keeps clicking this long after the last hit
    pub metronome_tail_ms: f64,
    /// Length of the shared noise buffer
    pub noise_seconds: f32,
    /// How long an FX insert renders after its dry input ends
    pub fx_tail_s: f64,
    pub command_capacity: usize,
    pub notification_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            master_gain: 0.85,
            lookahead_s: 0.0005,
            metronome_bpm: 120.0,
            quantize_grid_ms: 125.0,
            metronome_tail_ms: 600.0,
            noise_seconds: 1.0,
            fx_tail_s: 1.0,
            command_capacity: 1024,
            notification_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Default location: `<config dir>/drumkit/config.ron`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("drumkit").join("config.ron"))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: EngineConfig = ron::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location, falling back to defaults
    ///
    /// A missing file is normal; an unreadable or invalid one is logged.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }

        match Self::load(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        self.validate()?;
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, text)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.master_gain) {
            return Err(ConfigError::Invalid(format!(
                "master_gain must be within [0, 2], got {}",
                self.master_gain
            )));
        }
        if !(self.metronome_bpm > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "metronome_bpm must be positive, got {}",
                self.metronome_bpm
            )));
        }
        if !(self.quantize_grid_ms > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "quantize_grid_ms must be positive, got {}",
                self.quantize_grid_ms
            )));
        }
        if !(self.noise_seconds > 0.0) {
            return Err(ConfigError::Invalid("noise_seconds must be positive".to_string()));
        }
        if self.lookahead_s < 0.0 || self.metronome_tail_ms < 0.0 || self.fx_tail_s < 0.0 {
            return Err(ConfigError::Invalid("durations must not be negative".to_string()));
        }
        if self.command_capacity == 0 || self.notification_capacity == 0 {
            return Err(ConfigError::Invalid("channel capacities must be non-zero".to_string()));
        }
        Ok(())
    }
}
