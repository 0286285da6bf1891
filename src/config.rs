//! Configuration management for training and detection runs

use crate::constants::{
    DEFAULT_EPS_THRESHOLD, DEFAULT_IMAGE_SIZE, DEFAULT_OUTPUT_DIR, DEFAULT_SPLIT_RATIO, DETECTION_OFFSET,
    FEATURE_POSITION_STRIDE, IMAGE_EXTENSION, WINDOW_SIZE,
};
use crate::dataset::SplitMode;
use crate::haar::FeatureType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dataset loading and splitting
    pub dataset: DatasetConfig,

    /// PCA parameters
    pub pca: PcaConfig,

    /// Generic boosting parameters
    pub boosting: BoostingConfig,

    /// Viola-Jones training and detection parameters
    pub viola_jones: ViolaJonesConfig,

    /// Output configuration
    pub output: OutputConfig,
}

/// Dataset configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Size `(width, height)` images are resized to before flattening
    pub image_size: (u32, u32),

    /// File extension of dataset images
    pub extension: String,

    /// Fraction of samples used for training (0.0-1.0)
    pub split_ratio: f64,

    /// Shuffle samples before splitting instead of taking a prefix
    pub shuffle: bool,

    /// Seed for the shuffle
    pub seed: Option<u64>,

    /// Label mapped to +1 when binarising
    pub positive_label: i32,
}

/// PCA configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcaConfig {
    /// Number of principal components to keep
    pub components: usize,
}

/// Generic boosting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    /// Maximum number of boosting rounds
    pub num_iterations: usize,

    /// Error below which training stops early
    pub eps_threshold: f64,
}

/// Viola-Jones configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViolaJonesConfig {
    /// Side length of the square detector window
    pub window_size: usize,

    /// Step between candidate feature positions
    pub position_stride: usize,

    /// Haar feature type tags to enumerate
    pub feature_types: Vec<(usize, usize)>,

    /// Number of boosting rounds
    pub num_classifiers: usize,

    /// `(x, y)` correction applied to the detected box
    pub detection_offset: (i64, i64),
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory previews and detections are written to
    pub directory: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            image_size: DEFAULT_IMAGE_SIZE,
            extension: IMAGE_EXTENSION.to_string(),
            split_ratio: DEFAULT_SPLIT_RATIO,
            shuffle: false,
            seed: None,
            positive_label: 1,
        }
    }
}

impl Default for PcaConfig {
    fn default() -> Self {
        Self { components: 10 }
    }
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            num_iterations: 5,
            eps_threshold: DEFAULT_EPS_THRESHOLD,
        }
    }
}

impl Default for ViolaJonesConfig {
    fn default() -> Self {
        Self {
            window_size: WINDOW_SIZE,
            position_stride: FEATURE_POSITION_STRIDE,
            feature_types: FeatureType::ALL.iter().map(|t| t.bands()).collect(),
            num_classifiers: 5,
            detection_offset: DETECTION_OFFSET,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl DatasetConfig {
    /// Split mode selected by `shuffle` and `seed`
    #[must_use]
    pub const fn split_mode(&self) -> SplitMode {
        if self.shuffle {
            SplitMode::Shuffled { seed: self.seed }
        } else {
            SplitMode::Prefix
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialised or written
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` describing the first invalid setting, or
    /// `InvalidFeatureType` for an unknown feature tag
    pub fn validate(&self) -> Result<()> {
        // Dataset
        if self.dataset.image_size.0 == 0 || self.dataset.image_size.1 == 0 {
            return Err(Error::ConfigError("Image size must be greater than 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.dataset.split_ratio) {
            return Err(Error::ConfigError(
                "Split ratio must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.dataset.extension.is_empty() {
            return Err(Error::ConfigError("Image extension must not be empty".to_string()));
        }

        // PCA
        if self.pca.components == 0 {
            return Err(Error::ConfigError("PCA components must be greater than 0".to_string()));
        }
        let dims = self.dataset.image_size.0 as usize * self.dataset.image_size.1 as usize;
        if self.pca.components > dims {
            return Err(Error::ConfigError(format!(
                "PCA components ({}) exceed image dimension ({dims})",
                self.pca.components
            )));
        }

        // Boosting
        if !(0.0..1.0).contains(&self.boosting.eps_threshold) {
            return Err(Error::ConfigError(
                "Boosting eps threshold must be in [0.0, 1.0)".to_string(),
            ));
        }

        // Viola-Jones
        if self.viola_jones.window_size == 0 {
            return Err(Error::ConfigError("Window size must be greater than 0".to_string()));
        }
        if self.viola_jones.position_stride == 0 {
            return Err(Error::ConfigError(
                "Feature position stride must be greater than 0".to_string(),
            ));
        }
        if self.viola_jones.feature_types.is_empty() {
            return Err(Error::ConfigError("At least one feature type is required".to_string()));
        }
        for &tag in &self.viola_jones.feature_types {
            FeatureType::try_from(tag)?;
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Face Classifier Configuration

# Dataset loading
dataset:
  image_size: [32, 32]
  extension: "png"
  split_ratio: 0.8
  shuffle: false
  seed: null
  positive_label: 1

# Eigenfaces
pca:
  components: 10

# Generic AdaBoost
boosting:
  num_iterations: 5
  eps_threshold: 0.0001

# Viola-Jones
viola_jones:
  window_size: 24
  position_stride: 4
  feature_types: [[2, 1], [1, 2], [3, 1], [1, 3], [2, 2]]
  num_classifiers: 5
  detection_offset: [3, -3]

# Output
output:
  directory: "output"
"#;
