//! Viola-Jones training, prediction and sliding-window face detection.
//!
//! Training scores every Haar feature of the bank on every training image
//! once, then runs a boosting loop over that score matrix. Each round trains
//! one stump on the weighted scores, derives `beta = e / (1 - e)` from its
//! error, weighs it with `alpha = ln(1 / beta)` and multiplies the weight of
//! every correctly classified sample by `beta`.
//!
//! A window is a face when the weighted vote reaches half the total alpha.

use crate::classifiers::{FeatureClassifier, StumpLearner, WeakClassifier, WeakLearner};
use crate::config::ViolaJonesConfig;
use crate::constants::{BOX_COLOR, BOX_THICKNESS, DETECTION_OFFSET, WINDOW_SIZE};
use crate::detection::{self, FaceBox, WindowPosition};
use crate::haar::{FeatureBank, HaarFeature};
use crate::integral_image::{ensure_uniform_shape, IntegralImage};
use crate::training::{self, Ensemble, TrainingState};
use crate::utils::image_conversion::dynamic_to_gray_array;
use crate::utils::OutputWriter;
use crate::{Error, Result};
use image::DynamicImage;
use log::{debug, info, warn};
use ndarray::{Array1, Array2};
use rayon::prelude::*;

/// Viola-Jones face classifier over a fixed Haar feature bank
pub struct ViolaJones<L: WeakLearner = StumpLearner>
where
    L::Classifier: FeatureClassifier,
{
    integral_images: Vec<IntegralImage>,
    labels: Array1<f64>,
    num_pos: usize,
    num_neg: usize,
    bank: FeatureBank,
    learner: L,
    ensemble: Ensemble<L::Classifier>,
    state: TrainingState,
    detection_offset: (i64, i64),
}

impl ViolaJones<StumpLearner> {
    /// Prepare training on positive (face) and negative (non-face) images
    ///
    /// Images are converted to integral images, positives first. The feature
    /// bank starts empty; call [`ViolaJones::create_haar_features`] or
    /// install one with [`ViolaJones::with_feature_bank`] before training.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if either set is empty and `ShapeMismatch` if the
    /// images do not all share one size
    pub fn new(pos: &[Array2<f64>], neg: &[Array2<f64>]) -> Result<Self> {
        Self::with_learner(pos, neg, StumpLearner)
    }
}

impl<L> ViolaJones<L>
where
    L: WeakLearner,
    L::Classifier: FeatureClassifier,
{
    /// Prepare training with a custom weak learner
    ///
    /// # Errors
    ///
    /// See [`ViolaJones::new`]
    pub fn with_learner(pos: &[Array2<f64>], neg: &[Array2<f64>], learner: L) -> Result<Self> {
        if pos.is_empty() || neg.is_empty() {
            return Err(Error::InvalidInput(format!(
                "Viola-Jones needs positive and negative images, got {} and {}",
                pos.len(),
                neg.len()
            )));
        }

        let images: Vec<Array2<f64>> = pos.iter().chain(neg.iter()).cloned().collect();
        ensure_uniform_shape(&images)?;
        let integral_images: Vec<IntegralImage> = images.iter().map(IntegralImage::new).collect();

        let labels = Array1::from_iter(
            std::iter::repeat(1.0)
                .take(pos.len())
                .chain(std::iter::repeat(-1.0).take(neg.len())),
        );

        Ok(Self {
            integral_images,
            labels,
            num_pos: pos.len(),
            num_neg: neg.len(),
            bank: FeatureBank::empty(WINDOW_SIZE),
            learner,
            ensemble: Ensemble::new(),
            state: TrainingState::Uninitialized,
            detection_offset: DETECTION_OFFSET,
        })
    }

    /// Apply a configuration section: feature bank and detection offset
    ///
    /// # Errors
    ///
    /// Returns an error if the configured feature bank is invalid
    pub fn with_config(mut self, config: &ViolaJonesConfig) -> Result<Self> {
        self.set_feature_bank(FeatureBank::from_config(config)?);
        self.detection_offset = config.detection_offset;
        Ok(self)
    }

    /// Install the default 24x24 feature bank
    pub fn create_haar_features(&mut self) {
        self.set_feature_bank(FeatureBank::default());
    }

    /// Install a feature bank, e.g. one restricted to a few features
    #[must_use]
    pub fn with_feature_bank(mut self, bank: FeatureBank) -> Self {
        self.set_feature_bank(bank);
        self
    }

    /// Replace the feature bank, discarding any trained classifiers
    pub fn set_feature_bank(&mut self, bank: FeatureBank) {
        self.bank = bank;
        self.ensemble.clear();
        self.state = TrainingState::Uninitialized;
    }

    /// Change the `(x, y)` correction applied to detected boxes
    pub fn set_detection_offset(&mut self, offset: (i64, i64)) {
        self.detection_offset = offset;
    }

    /// The feature vocabulary classifiers refer to by index
    #[must_use]
    pub const fn haar_features(&self) -> &FeatureBank {
        &self.bank
    }

    /// Train `num_classifiers` rounds from scratch
    ///
    /// A round whose classifier has zero error keeps that classifier and ends
    /// training early.
    ///
    /// # Errors
    ///
    /// Returns an error if the bank is empty, the training images are smaller
    /// than the detector window, the weak learner fails or a round's error is
    /// one or more
    pub fn train(&mut self, num_classifiers: usize) -> Result<()> {
        if self.bank.is_empty() {
            return Err(Error::TrainingError(
                "No Haar features to train on; create the feature bank first".to_string(),
            ));
        }

        self.ensemble.clear();
        self.state = TrainingState::Uninitialized;

        info!(
            "Computing scores of {} features on {} images",
            self.bank.len(),
            self.integral_images.len()
        );
        let scores = self.bank.scores(&self.integral_images)?;

        #[allow(clippy::cast_precision_loss)]
        let mut weights: Array1<f64> = self
            .labels
            .iter()
            .map(|&label| {
                if label > 0.0 {
                    1.0 / (2 * self.num_pos) as f64
                } else {
                    1.0 / (2 * self.num_neg) as f64
                }
            })
            .collect();

        info!("Selecting {num_classifiers} classifiers");
        for round in 0..num_classifiers {
            training::normalize_weights(&mut weights)?;
            self.state = TrainingState::WeightsNormalized;

            let classifier = self
                .learner
                .train(scores.view(), self.labels.view(), weights.view())?;
            self.state = TrainingState::ClassifierTrained;

            let error = classifier.error();
            training::check_round_error(error)?;
            let beta = training::viola_jones_beta(error);
            let alpha = (1.0 / beta).ln();

            debug!(
                "Round {}: {} error={:.6} alpha={:.4}",
                round + 1,
                classifier.describe(),
                error,
                alpha
            );

            if training::is_perfect(error) {
                self.ensemble.push(classifier, alpha);
                self.state = TrainingState::Terminated;
                info!("Round {} found a perfect classifier, stopping", round + 1);
                break;
            }

            for ((w, &label), row) in weights.iter_mut().zip(self.labels.iter()).zip(scores.rows()) {
                if classifier.predict(row) == label {
                    *w *= beta;
                }
            }
            self.ensemble.push(classifier, alpha);
            self.state = TrainingState::WeightsUpdated;
        }

        info!("Viola-Jones trained {} classifiers", self.ensemble.len());
        Ok(())
    }

    /// Predict `+1.0` (face) or `-1.0` for each image
    ///
    /// Only features referenced by trained classifiers are evaluated. An
    /// untrained model predicts `-1.0` everywhere.
    ///
    /// # Errors
    ///
    /// Returns an error if an image is smaller than the detector window
    pub fn predict(&self, images: &[Array2<f64>]) -> Result<Vec<f64>> {
        let integral_images: Vec<IntegralImage> = images.iter().map(IntegralImage::new).collect();
        self.predict_integral(&integral_images)
    }

    /// Predict from precomputed integral images
    ///
    /// # Errors
    ///
    /// See [`ViolaJones::predict`]
    pub fn predict_integral(&self, images: &[IntegralImage]) -> Result<Vec<f64>> {
        if self.ensemble.is_empty() {
            return Ok(vec![-1.0; images.len()]);
        }
        self.bank.check_images(images)?;

        let members = self.members()?;
        let threshold = 0.5 * self.ensemble.total_alpha();

        Ok(images
            .par_iter()
            .map(|ii| Self::vote(&members, threshold, ii, (0, 0)))
            .collect())
    }

    /// Predict every detector window of one scene from the scene's integral image
    ///
    /// Features are evaluated at each window's offset, which gives the same
    /// sums as the integral image of the cropped window.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if a window extends past the scene
    pub fn predict_windows(&self, scene: &IntegralImage, positions: &[WindowPosition]) -> Result<Vec<f64>> {
        let window = self.bank.window();
        if let Some(position) = positions
            .iter()
            .find(|p| p.y + window > scene.height() || p.x + window > scene.width())
        {
            return Err(Error::ShapeMismatch(format!(
                "{window}x{window} window at ({}, {}) exceeds {}x{} scene",
                position.x,
                position.y,
                scene.height(),
                scene.width()
            )));
        }
        if self.ensemble.is_empty() {
            return Ok(vec![-1.0; positions.len()]);
        }

        let members = self.members()?;
        let threshold = 0.5 * self.ensemble.total_alpha();

        Ok(positions
            .par_iter()
            .map(|p| Self::vote(&members, threshold, scene, (p.y, p.x)))
            .collect())
    }

    /// Trained classifiers paired with the features they split on
    fn members(&self) -> Result<Vec<(&HaarFeature, &L::Classifier, f64)>> {
        self.ensemble
            .iter()
            .map(|(classifier, alpha)| {
                self.bank
                    .get(classifier.feature())
                    .map(|feature| (feature, classifier, *alpha))
                    .ok_or_else(|| {
                        Error::InvalidInput(format!(
                            "Classifier refers to feature {} of a {}-feature bank",
                            classifier.feature(),
                            self.bank.len()
                        ))
                    })
            })
            .collect()
    }

    /// `+1.0` when the weighted vote on the window at `origin` reaches `threshold`
    fn vote(
        members: &[(&HaarFeature, &L::Classifier, f64)],
        threshold: f64,
        ii: &IntegralImage,
        origin: (usize, usize),
    ) -> f64 {
        let vote: f64 = members
            .iter()
            .map(|(feature, classifier, alpha)| alpha * classifier.predict_score(feature.evaluate_at(ii, origin)))
            .sum();
        if vote >= threshold {
            1.0
        } else {
            -1.0
        }
    }

    /// Count `(correct, incorrect)` predictions over the training images
    ///
    /// # Errors
    ///
    /// See [`ViolaJones::predict`]
    pub fn evaluate(&self) -> Result<(usize, usize)> {
        let predictions = self.predict_integral(&self.integral_images)?;
        let correct = predictions
            .iter()
            .zip(self.labels.iter())
            .filter(|(p, y)| p == y)
            .count();
        Ok((correct, predictions.len() - correct))
    }

    /// Scan every window position of `image` and average the positive windows
    ///
    /// Returns `None` when no window is classified as a face.
    ///
    /// # Errors
    ///
    /// Returns an error if prediction fails
    pub fn detect(&self, image: &DynamicImage) -> Result<Option<FaceBox>> {
        let gray = dynamic_to_gray_array(image);
        let window = self.bank.window();
        let (height, width) = gray.dim();
        let positions = detection::window_positions(height, width, window);
        debug!("Scanning {} windows of a {}x{} image", positions.len(), width, height);

        let scene = IntegralImage::new(&gray);
        let predictions = self.predict_windows(&scene, &positions)?;

        let positives: Vec<WindowPosition> = positions
            .iter()
            .zip(predictions.iter())
            .filter(|&(_, &prediction)| prediction == 1.0)
            .map(|(&position, _)| position)
            .collect();
        info!("{} of {} windows classified as faces", positives.len(), positions.len());

        detection::mean_box(&positives, window, self.detection_offset)
    }

    /// Detect a face and write `image` with the box drawn on it as `filename`
    ///
    /// Nothing is written when no face is found.
    ///
    /// # Errors
    ///
    /// Returns an error if detection fails or the image cannot be written
    pub fn face_detection(&self, image: &DynamicImage, writer: &OutputWriter, filename: &str) -> Result<Option<FaceBox>> {
        let Some(face) = self.detect(image)? else {
            warn!("No face found, {filename} not written");
            return Ok(None);
        };

        let mut annotated = image.to_rgb8();
        detection::draw_box(&mut annotated, &face, BOX_COLOR, BOX_THICKNESS);
        let path = writer.write_rgb(&annotated, filename)?;
        info!(
            "Face at {:?}-{:?} written to {}",
            face.top_left,
            face.bottom_right,
            path.display()
        );
        Ok(Some(face))
    }

    /// Current position in the training cycle
    #[must_use]
    pub const fn state(&self) -> TrainingState {
        self.state
    }

    /// Trained classifiers and their weights
    #[must_use]
    pub const fn ensemble(&self) -> &Ensemble<L::Classifier> {
        &self.ensemble
    }

    /// Training labels, `+1.0` for positives followed by `-1.0` for negatives
    #[must_use]
    pub const fn labels(&self) -> &Array1<f64> {
        &self.labels
    }
}
