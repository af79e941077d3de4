use crate::models::hand::NUM_FRAMES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How raw sample files are named inside a class directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleIdStrategy {
    /// Random UUID per sample, safe with several recorders on one class
    Uuid,
    /// `existing file count + 1`; two writers on one class can collide
    Sequential,
}

/// What happens to earlier ledger rows when a class is normalized again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerPolicy {
    /// Drop earlier rows for the class, keep exactly one
    ReplaceClass,
    /// Keep every row; re-normalized classes then fail assembly until cleaned up
    Append,
}

/// Pipeline configuration, scoped to one run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Per-class directories of raw `.npy` samples
    pub raw_dir: PathBuf,
    /// `{class}_latest.npy` and timestamped archives
    pub normalized_dir: PathBuf,
    /// Ledger file; defaults to `metadata.csv` inside `normalized_dir`
    #[serde(default)]
    pub metadata_file: Option<PathBuf>,
    /// Frames per recorded sample
    pub num_frames: usize,
    pub sample_ids: SampleIdStrategy,
    pub ledger_policy: LedgerPolicy,
    /// Capture loop tick in milliseconds
    pub frame_interval_ms: u64,
    /// Refuse to assemble normalized classes that have no raw directory
    pub check_raw_classes: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data").join("keypoints"),
            normalized_dir: PathBuf::from("data").join("keypoints_normalised"),
            metadata_file: None,
            num_frames: NUM_FRAMES,
            sample_ids: SampleIdStrategy::Uuid,
            ledger_policy: LedgerPolicy::ReplaceClass,
            frame_interval_ms: 10,
            check_raw_classes: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine home directory")]
    NoHomeDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl PipelineConfig {
    /// Config rooted at `base`, keeping the default directory names
    pub fn with_base_dir(base: &Path) -> Self {
        Self {
            raw_dir: base.join("keypoints"),
            normalized_dir: base.join("keypoints_normalised"),
            ..Self::default()
        }
    }

    /// Load configuration from the default location
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load configuration from `path`, creating it with defaults if it doesn't exist
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: PipelineConfig = serde_json::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.num_frames == 0 {
            return Err(ConfigError::Invalid(
                "num_frames must be at least 1".to_string(),
            ));
        }

        if self.frame_interval_ms == 0 || self.frame_interval_ms > 1000 {
            return Err(ConfigError::Invalid(format!(
                "frame_interval_ms: {}. Must be between 1 and 1000",
                self.frame_interval_ms
            )));
        }

        if self.raw_dir == self.normalized_dir {
            return Err(ConfigError::Invalid(format!(
                "raw_dir and normalized_dir must differ (both {})",
                self.raw_dir.display()
            )));
        }

        if let Some(metadata) = &self.metadata_file {
            if metadata.extension().and_then(|e| e.to_str()) == Some("npy") {
                return Err(ConfigError::Invalid(format!(
                    "metadata_file {} would be picked up as an archive",
                    metadata.display()
                )));
            }
        }

        Ok(())
    }

    /// Ledger location
    pub fn metadata_path(&self) -> PathBuf {
        self.metadata_file
            .clone()
            .unwrap_or_else(|| self.normalized_dir.join("metadata.csv"))
    }

    /// `$HOME/.gesture_keypoints/config/settings.json`
    pub fn default_path() -> ConfigResult<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| ConfigError::NoHomeDir)?;

        let mut path = PathBuf::from(home);
        path.push(".gesture_keypoints");
        path.push("config");
        path.push("settings.json");

        Ok(path)
    }
}
