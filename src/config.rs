//! Preparation settings loaded from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of records drawn into `train_all`.
pub const DEFAULT_TRAIN_SIZE: usize = 1000;
/// Default validation partition size.
pub const DEFAULT_VAL_SIZE: usize = 100;
/// Default edge length of the square model input.
pub const DEFAULT_IMAGE_SIZE: u32 = 64;
/// Default number of seed records per class.
pub const DEFAULT_SEED_PER_CLASS: usize = 2;
/// Largest accepted RNG seed. TOML integers are signed 64-bit.
pub const MAX_SEED: u64 = i64::MAX as u64;

/// Settings for one dataset preparation run.
///
/// Every key is optional in the TOML file; missing keys take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    /// Root of the training corpus (one subfolder per class).
    pub train_dir: PathBuf,
    /// Root of the test corpus (same class folders as `train_dir`).
    pub test_dir: PathBuf,
    /// Images are resized to `image_size x image_size`.
    pub image_size: u32,
    /// Per-channel mean subtracted after scaling to `[0, 1]`.
    pub mean: [f32; 3],
    /// Per-channel standard deviation divided out after mean subtraction.
    pub std: [f32; 3],
    /// Size of the `train_all` partition.
    pub train_size: usize,
    /// Size of the validation partition; the pool receives the remainder.
    pub val_size: usize,
    /// Records per class in the balanced initial set.
    pub seed_per_class: usize,
    /// Keep at most this many shuffled test records. `None` keeps all.
    pub test_limit: Option<usize>,
    /// RNG seed, at most [`MAX_SEED`]. `None` draws one from OS entropy and
    /// records it in the run summary.
    pub seed: Option<u64>,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            train_dir: PathBuf::from("dataset/Training"),
            test_dir: PathBuf::from("dataset/Testing"),
            image_size: DEFAULT_IMAGE_SIZE,
            mean: [0.5; 3],
            std: [0.5; 3],
            train_size: DEFAULT_TRAIN_SIZE,
            val_size: DEFAULT_VAL_SIZE,
            seed_per_class: DEFAULT_SEED_PER_CLASS,
            test_limit: None,
            seed: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    #[error("image_size must be at least 1")]
    ZeroImageSize,
    #[error("train_size must be at least 1")]
    ZeroTrainSize,
    #[error("seed_per_class must be at least 1")]
    ZeroSeedPerClass,
    #[error("test_limit must be at least 1 when set")]
    ZeroTestLimit,
    #[error("seed {0} exceeds the largest storable seed ({MAX_SEED})")]
    SeedOutOfRange(u64),
    #[error("seed_per_class ({per_class}) exceeds train_size ({train_size})")]
    SeedLargerThanTrain { per_class: usize, train_size: usize },
    #[error("normalization {field}[{channel}] = {value} is not usable")]
    InvalidNormalization {
        field: &'static str,
        channel: usize,
        value: f32,
    },
}

impl PrepConfig {
    /// Load settings from `path`, returning defaults when the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write settings to `path` as TOML, creating parent folders.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(seed) = self.seed.filter(|&seed| seed > MAX_SEED) {
            return Err(ConfigError::SeedOutOfRange(seed));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let text = toml::to_string_pretty(self).map_err(|source| ConfigError::SerializeToml {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check values that do not depend on the corpus.
    ///
    /// Partition sizes are checked against the scanned corpus later, once its
    /// length is known.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image_size == 0 {
            return Err(ConfigError::ZeroImageSize);
        }
        if self.train_size == 0 {
            return Err(ConfigError::ZeroTrainSize);
        }
        if self.seed_per_class == 0 {
            return Err(ConfigError::ZeroSeedPerClass);
        }
        if self.seed_per_class > self.train_size {
            return Err(ConfigError::SeedLargerThanTrain {
                per_class: self.seed_per_class,
                train_size: self.train_size,
            });
        }
        if self.test_limit == Some(0) {
            return Err(ConfigError::ZeroTestLimit);
        }
        if let Some(seed) = self.seed.filter(|&seed| seed > MAX_SEED) {
            return Err(ConfigError::SeedOutOfRange(seed));
        }
        for (channel, &value) in self.mean.iter().enumerate() {
            if !value.is_finite() {
                return Err(ConfigError::InvalidNormalization {
                    field: "mean",
                    channel,
                    value,
                });
            }
        }
        for (channel, &value) in self.std.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidNormalization {
                    field: "std",
                    channel,
                    value,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = PrepConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, PrepConfig::default());
        assert_eq!(config.val_size, 100);
        assert_eq!(config.train_dir, PathBuf::from("dataset/Training"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prep.toml");
        std::fs::write(
            &path,
            r#"
val_size = 250
seed = 7
train_dir = "data/train"
"#,
        )
        .unwrap();
        let config = PrepConfig::load_from(&path).unwrap();
        assert_eq!(config.val_size, 250);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.train_dir, PathBuf::from("data/train"));
        assert_eq!(config.train_size, DEFAULT_TRAIN_SIZE);
        assert_eq!(config.image_size, DEFAULT_IMAGE_SIZE);
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "val_size = \"many\"").unwrap();
        let err = PrepConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { path: p, .. } if p == path));
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("prep.toml");
        let config = PrepConfig {
            seed: Some(11),
            test_limit: Some(50),
            mean: [0.485, 0.456, 0.406],
            ..PrepConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(PrepConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn largest_seed_round_trips_and_larger_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seeded.toml");
        let config = PrepConfig {
            seed: Some(MAX_SEED),
            ..PrepConfig::default()
        };
        assert!(config.validate().is_ok());
        config.save_to(&path).unwrap();
        assert_eq!(PrepConfig::load_from(&path).unwrap().seed, Some(MAX_SEED));

        let too_big = PrepConfig {
            seed: Some(u64::MAX),
            ..PrepConfig::default()
        };
        assert!(matches!(
            too_big.validate(),
            Err(ConfigError::SeedOutOfRange(u64::MAX))
        ));
        let other = dir.path().join("too_big.toml");
        assert!(matches!(
            too_big.save_to(&other),
            Err(ConfigError::SeedOutOfRange(_))
        ));
        assert!(!other.exists());
    }

    #[test]
    fn validate_rejects_unusable_values() {
        assert!(PrepConfig::default().validate().is_ok());

        let zero_std = PrepConfig {
            std: [0.5, 0.0, 0.5],
            ..PrepConfig::default()
        };
        assert!(matches!(
            zero_std.validate(),
            Err(ConfigError::InvalidNormalization { field: "std", channel: 1, .. })
        ));

        let nan_mean = PrepConfig {
            mean: [f32::NAN, 0.5, 0.5],
            ..PrepConfig::default()
        };
        assert!(matches!(
            nan_mean.validate(),
            Err(ConfigError::InvalidNormalization { field: "mean", channel: 0, .. })
        ));

        let no_size = PrepConfig {
            image_size: 0,
            ..PrepConfig::default()
        };
        assert!(matches!(no_size.validate(), Err(ConfigError::ZeroImageSize)));

        let no_limit = PrepConfig {
            test_limit: Some(0),
            ..PrepConfig::default()
        };
        assert!(matches!(no_limit.validate(), Err(ConfigError::ZeroTestLimit)));

        let greedy_seed = PrepConfig {
            train_size: 3,
            seed_per_class: 4,
            ..PrepConfig::default()
        };
        assert!(matches!(
            greedy_seed.validate(),
            Err(ConfigError::SeedLargerThanTrain { .. })
        ));
    }
}
