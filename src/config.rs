//! Configuration management for ringcast

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::capture::{CaptureSpec, QualityClass, ResolutionClass};
use crate::error::{RecorderError, RecorderResult};

/// Immutable per-session configuration, supplied at start
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory that receives the segment files
    pub output_dir: PathBuf,

    /// Total storage budget for committed segments; `None` means unlimited
    pub max_storage_bytes: Option<u64>,

    /// Segment rotation boundary; `None` means a single unbounded segment
    pub segment_duration: Option<Duration>,

    /// Parameters handed to the capture port
    pub capture: CaptureSpec,
}

impl SessionConfig {
    /// Reject configurations the core cannot honor
    pub fn validate(&self) -> RecorderResult<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(RecorderError::config("output directory is empty"));
        }
        if self.segment_duration == Some(Duration::ZERO) {
            return Err(RecorderError::config("segment duration must be non-zero"));
        }
        if self.max_storage_bytes == Some(0) {
            return Err(RecorderError::config("storage budget must be non-zero"));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_directory(),
            max_storage_bytes: None,
            segment_duration: None,
            capture: CaptureSpec::default(),
        }
    }
}

/// Main configuration structure for the binary (TOML file)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Recording configuration
    #[serde(default)]
    pub recording: RecordingConfig,

    /// Simulated capture backend configuration
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Path to config file (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Directory for segment files
    #[serde(default = "default_output_directory_option")]
    pub output_directory: Option<PathBuf>,

    /// Segment duration in seconds; absent means one unbounded segment
    pub segment_duration_secs: Option<u64>,

    /// Total storage budget in MiB; absent means unlimited
    pub max_storage_mb: Option<u64>,

    /// Resolution class requested from the capture port
    #[serde(default)]
    pub resolution: ResolutionClass,

    /// Quality class requested from the capture port
    #[serde(default)]
    pub quality: QualityClass,

    /// Whether audio capture is requested
    #[serde(default = "default_true")]
    pub audio: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Synthetic output rate of the simulated capture port
    #[serde(default = "default_sim_bytes_per_sec")]
    pub bytes_per_sec: u64,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_sim_bytes_per_sec() -> u64 {
    // Roughly a 2 Mbps stream
    250 * 1024
}

fn default_output_directory() -> PathBuf {
    std::env::temp_dir().join("ringcast-recordings")
}

fn default_output_directory_option() -> Option<PathBuf> {
    Some(default_output_directory())
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_directory: default_output_directory_option(),
            segment_duration_secs: Some(60),
            max_storage_mb: Some(512),
            resolution: ResolutionClass::default(),
            quality: QualityClass::default(),
            audio: true,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            bytes_per_sec: default_sim_bytes_per_sec(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recording: RecordingConfig::default(),
            simulation: SimulationConfig::default(),
            config_path: None,
        }
    }
}

impl Config {
    /// Load configuration from default location or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let mut config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

            config.config_path = Some(config_path);
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = match &self.config_path {
            Some(path) => path.clone(),
            None => Self::default_config_path()?,
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Get the config file path
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Self::default_config_path(),
        }
    }

    /// Get default config path
    fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = directories::ProjectDirs::from("dev", "ringcast", "ringcast")
            .context("Failed to determine config directory")?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Build the immutable session configuration from the file config
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            output_dir: self
                .recording
                .output_directory
                .clone()
                .unwrap_or_else(default_output_directory),
            max_storage_bytes: self.recording.max_storage_mb.map(|mb| mb * 1024 * 1024),
            segment_duration: self.recording.segment_duration_secs.map(Duration::from_secs),
            capture: CaptureSpec {
                resolution: self.recording.resolution,
                quality: self.recording.quality,
                audio_enabled: self.recording.audio,
            },
        }
    }
}
