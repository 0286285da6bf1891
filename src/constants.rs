//! Constants used throughout the library

/// Side length of the square Viola-Jones detector window, in pixels
pub const WINDOW_SIZE: usize = 24;

/// Row/column step between candidate feature positions inside the window
pub const FEATURE_POSITION_STRIDE: usize = 4;

/// Intensity used for the bright bands of a rendered Haar feature
pub const BRIGHT_INTENSITY: u8 = 255;

/// Intensity used for the dark bands of a rendered Haar feature
pub const DARK_INTENSITY: u8 = 126;

/// Default error threshold below which generic boosting stops early
pub const DEFAULT_EPS_THRESHOLD: f64 = 1e-4;

/// Smallest weighted error used when deriving a classifier weight.
///
/// A perfect weak classifier has zero error; its alpha is computed from this
/// floor instead and training terminates.
pub const ERROR_FLOOR: f64 = 1e-10;

/// Empirical `(x, y)` correction applied to the averaged detection box
pub const DETECTION_OFFSET: (i64, i64) = (3, -3);

/// Thickness in pixels of the rectangle drawn around a detected face
pub const BOX_THICKNESS: u32 = 2;

/// Colour of the rectangle drawn around a detected face (RGB)
pub const BOX_COLOR: [u8; 3] = [255, 0, 0];

/// File extension of dataset images
pub const IMAGE_EXTENSION: &str = "png";

/// Number of trailing file-stem characters holding a sample's label
pub const LABEL_SUFFIX_LEN: usize = 2;

/// Default image size `(width, height)` for flattened PCA/boosting samples
pub const DEFAULT_IMAGE_SIZE: (u32, u32) = (32, 32);

/// Default fraction of samples used for training
pub const DEFAULT_SPLIT_RATIO: f64 = 0.8;

/// Default output directory for previews and annotated detections
pub const DEFAULT_OUTPUT_DIR: &str = "output";
