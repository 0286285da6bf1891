use super::{FeatureType, HaarFeature};
use crate::config::ViolaJonesConfig;
use crate::constants::{FEATURE_POSITION_STRIDE, WINDOW_SIZE};
use crate::integral_image::IntegralImage;
use crate::{Error, Result};
use ndarray::Array2;
use rayon::prelude::*;

/// Ordered vocabulary of Haar features for one detector window.
///
/// A feature's identity is its index in the bank; trained classifiers refer
/// to features by that index.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBank {
    window: usize,
    features: Vec<HaarFeature>,
}

impl FeatureBank {
    /// Enumerate every feature of the given type tags inside a `window` x `window` square
    ///
    /// For each type, block heights run from the type's row-band count up to
    /// `window` in steps of that count (likewise widths with the column-band
    /// count), and positions run from 0 to `window - block` in steps of `stride`.
    /// Order is type, block height, block width, row, column. Stored sizes are
    /// `block - 1` in each dimension.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFeatureType` for an unknown tag, before any feature is
    /// generated, and `InvalidInput` for a zero window or stride
    pub fn new(window: usize, stride: usize, tags: &[(usize, usize)]) -> Result<Self> {
        if window == 0 {
            return Err(Error::InvalidInput("Detector window must be at least 1 pixel".to_string()));
        }
        if stride == 0 {
            return Err(Error::InvalidInput("Feature position stride must be greater than 0".to_string()));
        }

        let types = tags
            .iter()
            .map(|&tag| FeatureType::try_from(tag))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::enumerate(window, stride, &types))
    }

    /// Build the bank described by a Viola-Jones configuration section
    ///
    /// # Errors
    ///
    /// See [`FeatureBank::new`]
    pub fn from_config(config: &ViolaJonesConfig) -> Result<Self> {
        Self::new(config.window_size, config.position_stride, &config.feature_types)
    }

    /// Wrap an explicit list of features, e.g. a bank restricted to a few features
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a feature does not fit inside the window
    pub fn from_features(window: usize, features: Vec<HaarFeature>) -> Result<Self> {
        if let Some((index, feature)) = features.iter().enumerate().find(|(_, f)| !f.fits(window, window)) {
            return Err(Error::InvalidInput(format!(
                "Feature {index} ({feature}) does not fit in a {window}x{window} window"
            )));
        }
        Ok(Self { window, features })
    }

    /// A bank with no features for the given window
    #[must_use]
    pub const fn empty(window: usize) -> Self {
        Self {
            window,
            features: Vec::new(),
        }
    }

    fn enumerate(window: usize, stride: usize, types: &[FeatureType]) -> Self {
        let mut features = Vec::new();

        for &feat_type in types {
            let (band_rows, band_cols) = feat_type.bands();
            for block_h in (band_rows..=window).step_by(band_rows) {
                for block_w in (band_cols..=window).step_by(band_cols) {
                    for row in (0..=window - block_h).step_by(stride) {
                        for col in (0..=window - block_w).step_by(stride) {
                            features.push(HaarFeature::new(feat_type, (row, col), (block_h - 1, block_w - 1)));
                        }
                    }
                }
            }
        }

        log::debug!(
            "Generated {} Haar features for a {}x{} window",
            features.len(),
            window,
            window
        );

        Self { window, features }
    }

    /// Side length of the detector window
    #[must_use]
    pub const fn window(&self) -> usize {
        self.window
    }

    /// Number of features
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the bank holds no features
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Feature with the given index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&HaarFeature> {
        self.features.get(index)
    }

    /// All features in bank order
    #[must_use]
    pub fn features(&self) -> &[HaarFeature] {
        &self.features
    }

    /// Iterate over features in bank order
    pub fn iter(&self) -> std::slice::Iter<'_, HaarFeature> {
        self.features.iter()
    }

    /// Check that integral images are large enough for the detector window
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` naming the first image smaller than the window
    pub fn check_images(&self, images: &[IntegralImage]) -> Result<()> {
        for (index, ii) in images.iter().enumerate() {
            if ii.height() < self.window || ii.width() < self.window {
                return Err(Error::ShapeMismatch(format!(
                    "image {index} is {}x{}, smaller than the {}x{} detector window",
                    ii.height(),
                    ii.width(),
                    self.window,
                    self.window
                )));
            }
        }
        Ok(())
    }

    /// Score matrix of this bank over a set of integral images
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if a feature does not fit inside an image
    pub fn scores(&self, images: &[IntegralImage]) -> Result<Array2<f64>> {
        score_matrix(images, &self.features)
    }
}

impl Default for FeatureBank {
    /// Every feature type inside the 24x24 window on a 4-pixel position grid
    fn default() -> Self {
        Self::enumerate(WINDOW_SIZE, FEATURE_POSITION_STRIDE, &FeatureType::ALL)
    }
}

impl<'a> IntoIterator for &'a FeatureBank {
    type Item = &'a HaarFeature;
    type IntoIter = std::slice::Iter<'a, HaarFeature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

/// Evaluate every feature on every integral image
///
/// Cell `(i, f)` is feature `f` evaluated on image `i`. Rows are computed in
/// parallel; each cell depends only on its own (image, feature) pair.
///
/// # Errors
///
/// Returns `ShapeMismatch`, before any feature is evaluated, naming the first
/// image some feature does not fit inside
pub fn score_matrix(images: &[IntegralImage], features: &[HaarFeature]) -> Result<Array2<f64>> {
    // Smallest (rows, cols) every feature fits inside
    let extent = features.iter().fold((0, 0), |(rows, cols), f| {
        let ((r, c), (h, w)) = (f.position(), f.size());
        (rows.max(r + h), cols.max(c + w))
    });
    if let Some((index, ii)) = images
        .iter()
        .enumerate()
        .find(|(_, ii)| ii.height() < extent.0 || ii.width() < extent.1)
    {
        return Err(Error::ShapeMismatch(format!(
            "image {index} is {}x{}, features need at least {}x{}",
            ii.height(),
            ii.width(),
            extent.0,
            extent.1
        )));
    }

    log::debug!(
        "Computing {}x{} score matrix",
        images.len(),
        features.len()
    );

    let cells: Vec<f64> = images
        .par_iter()
        .flat_map_iter(|ii| features.iter().map(move |feature| feature.evaluate(ii)))
        .collect();

    Array2::from_shape_vec((images.len(), features.len()), cells)
        .map_err(|e| Error::ShapeMismatch(format!("Failed to assemble score matrix: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bank_size() {
        let bank = FeatureBank::default();
        assert_eq!(bank.window(), WINDOW_SIZE);
        assert_eq!(bank.len(), 13_188);
    }

    #[test]
    fn test_enumeration_order() {
        let bank = FeatureBank::default();

        // Smallest two-horizontal block is 2x1, stored as size (1, 0)
        let first = bank.get(0).unwrap();
        assert_eq!(first.feat_type(), FeatureType::TwoHorizontal);
        assert_eq!(first.position(), (0, 0));
        assert_eq!(first.size(), (1, 0));

        // Columns vary fastest
        assert_eq!(bank.get(1).unwrap().position(), (0, 4));

        // Last feature is the full-window four-square
        let last = bank.get(bank.len() - 1).unwrap();
        assert_eq!(last.feat_type(), FeatureType::FourSquare);
        assert_eq!(last.position(), (0, 0));
        assert_eq!(last.size(), (23, 23));
    }

    #[test]
    fn test_per_type_counts() {
        let counts: Vec<usize> = FeatureType::ALL
            .iter()
            .map(|t| FeatureBank::new(24, 4, &[t.bands()]).unwrap().len())
            .collect();
        assert_eq!(counts, vec![3528, 3528, 2184, 2184, 1764]);
    }

    #[test]
    fn test_all_features_fit_window() {
        let bank = FeatureBank::default();
        assert!(bank.iter().all(|f| f.fits(24, 24)));
    }

    #[test]
    fn test_invalid_tag_rejected_eagerly() {
        let result = FeatureBank::new(24, 4, &[(2, 1), (5, 5)]);
        assert!(matches!(result, Err(Error::InvalidFeatureType(5, 5))));
    }

    #[test]
    fn test_zero_stride_rejected() {
        assert!(FeatureBank::new(24, 0, &[(2, 1)]).is_err());
        assert!(FeatureBank::new(0, 4, &[(2, 1)]).is_err());
    }

    #[test]
    fn test_from_features_validates_fit() {
        let inside = HaarFeature::new(FeatureType::TwoHorizontal, (0, 0), (4, 4));
        let outside = HaarFeature::new(FeatureType::TwoHorizontal, (22, 0), (4, 4));
        assert!(FeatureBank::from_features(24, vec![inside]).is_ok());
        assert!(FeatureBank::from_features(24, vec![inside, outside]).is_err());
    }

    #[test]
    fn test_score_matrix_layout() {
        let images: Vec<IntegralImage> = (1..=3)
            .map(|v| IntegralImage::new(&Array2::from_elem((6, 6), f64::from(v))))
            .collect();
        let features = vec![
            HaarFeature::new(FeatureType::ThreeHorizontal, (0, 0), (6, 4)),
            HaarFeature::new(FeatureType::TwoVertical, (0, 0), (6, 6)),
        ];

        let scores = score_matrix(&images, &features).unwrap();
        assert_eq!(scores.dim(), (3, 2));
        // Bright area 16 px, dark area 8 px
        assert_eq!(scores[[0, 0]], 8.0);
        assert_eq!(scores[[2, 0]], 24.0);
        assert!(scores.column(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_score_matrix_rejects_image_smaller_than_feature() {
        let images = vec![
            IntegralImage::new(&Array2::from_elem((24, 24), 1.0)),
            IntegralImage::new(&Array2::from_elem((10, 10), 1.0)),
        ];
        let features = vec![HaarFeature::new(FeatureType::TwoHorizontal, (0, 0), (23, 23))];

        match score_matrix(&images, &features) {
            Err(Error::ShapeMismatch(msg)) => assert!(msg.contains("image 1")),
            other => panic!("Expected ShapeMismatch, got {other:?}"),
        }

        // Fits exactly at the bottom-right edge
        let edge = vec![HaarFeature::new(FeatureType::FourSquare, (6, 6), (4, 4))];
        assert!(score_matrix(&images[1..], &edge).is_ok());
        let past_edge = vec![HaarFeature::new(FeatureType::FourSquare, (7, 6), (4, 4))];
        assert!(score_matrix(&images[1..], &past_edge).is_err());
    }

    #[test]
    fn test_scores_reject_small_images() {
        let bank = FeatureBank::default();
        let small = vec![IntegralImage::new(&Array2::zeros((20, 24)))];
        assert!(matches!(bank.scores(&small), Err(Error::ShapeMismatch(_))));
    }
}
