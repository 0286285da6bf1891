//! Generic AdaBoost over raw feature vectors.
//!
//! Each round renormalises the sample weights, trains one weak classifier on
//! the full weighted set, measures its weighted error `e` from its own
//! predictions and weighs it with `alpha = 0.5 * ln((1 - e) / e)`. Weights are
//! then updated with `w *= exp(-alpha * y * h(x))`, unless `e` fell below the
//! early-stop threshold, in which case the round's classifier is kept and
//! training stops.

use crate::classifiers::{WeakClassifier, WeakLearner, WeightedMeanLearner};
use crate::config::BoostingConfig;
use crate::constants::DEFAULT_EPS_THRESHOLD;
use crate::training::{self, Ensemble, TrainingState};
use crate::{Error, Result};
use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// AdaBoost ensemble trained on flattened samples with ±1 labels
pub struct Boosting<L: WeakLearner = WeightedMeanLearner> {
    x_train: Array2<f64>,
    y_train: Array1<f64>,
    num_iterations: usize,
    eps_threshold: f64,
    learner: L,
    weights: Array1<f64>,
    ensemble: Ensemble<L::Classifier>,
    state: TrainingState,
}

impl Boosting<WeightedMeanLearner> {
    /// Set up training on `x` (rows are samples) with ±1 labels `y`
    ///
    /// # Errors
    ///
    /// Returns an error if `x` is empty, `y` does not have one label per row,
    /// or a label is not `+1` or `-1`
    pub fn new(x: Array2<f64>, y: Array1<f64>, num_iterations: usize) -> Result<Self> {
        Self::with_learner(x, y, num_iterations, WeightedMeanLearner)
    }

    /// Set up training with the iteration count and threshold of a configuration section
    ///
    /// # Errors
    ///
    /// See [`Boosting::new`]
    pub fn from_config(x: Array2<f64>, y: Array1<f64>, config: &BoostingConfig) -> Result<Self> {
        Ok(Self::new(x, y, config.num_iterations)?.with_eps_threshold(config.eps_threshold))
    }
}

impl<L: WeakLearner> Boosting<L> {
    /// Set up training with a custom weak learner
    ///
    /// # Errors
    ///
    /// See [`Boosting::new`]
    pub fn with_learner(x: Array2<f64>, y: Array1<f64>, num_iterations: usize, learner: L) -> Result<Self> {
        let (rows, cols) = x.dim();
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidInput(format!("Cannot boost on a {rows}x{cols} data matrix")));
        }
        if y.len() != rows {
            return Err(Error::ShapeMismatch(format!("{} labels for {rows} samples", y.len())));
        }
        if let Some(index) = y.iter().position(|&label| label != 1.0 && label != -1.0) {
            return Err(Error::InvalidInput(format!(
                "Label {} at index {index} is not +1 or -1",
                y[index]
            )));
        }

        #[allow(clippy::cast_precision_loss)]
        let weights = Array1::from_elem(rows, 1.0 / rows as f64);

        Ok(Self {
            x_train: x,
            y_train: y,
            num_iterations,
            eps_threshold: DEFAULT_EPS_THRESHOLD,
            learner,
            weights,
            ensemble: Ensemble::new(),
            state: TrainingState::Uninitialized,
        })
    }

    /// Replace the early-stop error threshold
    #[must_use]
    pub fn with_eps_threshold(mut self, eps_threshold: f64) -> Self {
        self.eps_threshold = eps_threshold;
        self
    }

    /// Run up to `num_iterations` boosting rounds
    ///
    /// # Errors
    ///
    /// Returns an error if the weak learner fails, the weights degenerate or a
    /// round's error is one or more
    pub fn train(&mut self) -> Result<()> {
        info!(
            "Boosting {} samples x {} features for up to {} rounds",
            self.x_train.nrows(),
            self.x_train.ncols(),
            self.num_iterations
        );

        for round in 0..self.num_iterations {
            training::normalize_weights(&mut self.weights)?;
            self.state = TrainingState::WeightsNormalized;

            let classifier = self
                .learner
                .train(self.x_train.view(), self.y_train.view(), self.weights.view())?;
            self.state = TrainingState::ClassifierTrained;

            let predictions: Array1<f64> = self
                .x_train
                .axis_iter(Axis(0))
                .map(|sample| classifier.predict(sample))
                .collect();
            let error = training::weighted_error(predictions.view(), self.y_train.view(), self.weights.view());
            training::check_round_error(error)?;

            let alpha = training::adaboost_alpha(error);
            debug!(
                "Round {}: {} error={:.6} alpha={:.4}",
                round + 1,
                classifier.describe(),
                error,
                alpha
            );
            self.ensemble.push(classifier, alpha);

            if error < self.eps_threshold || training::is_perfect(error) {
                info!(
                    "Stopping after round {}: error {:.2e} below threshold {:.2e}",
                    round + 1,
                    error,
                    self.eps_threshold
                );
                self.state = TrainingState::Terminated;
                break;
            }

            for ((w, &y), &p) in self.weights.iter_mut().zip(self.y_train.iter()).zip(predictions.iter()) {
                *w *= (-alpha * y * p).exp();
            }
            self.state = TrainingState::WeightsUpdated;
        }

        info!("Boosting trained {} weak classifiers", self.ensemble.len());
        Ok(())
    }

    /// Count `(correct, incorrect)` predictions over the training set
    ///
    /// # Errors
    ///
    /// See [`Boosting::predict`]
    pub fn evaluate(&self) -> Result<(usize, usize)> {
        let predictions = self.predict(self.x_train.view())?;
        let correct = predictions
            .iter()
            .zip(self.y_train.iter())
            .filter(|(p, y)| p == y)
            .count();
        Ok((correct, predictions.len() - correct))
    }

    /// Predict one label per row of `x`
    ///
    /// The label is the sign of the weighted vote (`0.0` when the vote is
    /// exactly zero). An untrained ensemble predicts `-1.0` everywhere.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `x` has a different number of columns than
    /// the training data
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.x_train.ncols() {
            return Err(Error::ShapeMismatch(format!(
                "{} features per sample, model was trained on {}",
                x.ncols(),
                self.x_train.ncols()
            )));
        }

        if self.ensemble.is_empty() {
            return Ok(Array1::from_elem(x.nrows(), -1.0));
        }

        Ok(x.axis_iter(Axis(0))
            .map(|sample| {
                let vote = self.ensemble.decision(sample);
                if vote > 0.0 {
                    1.0
                } else if vote < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            })
            .collect())
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

    /// Current sample weights
    #[must_use]
    pub const fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Configured number of rounds
    #[must_use]
    pub const fn num_iterations(&self) -> usize {
        self.num_iterations
    }

    /// Early-stop error threshold
    #[must_use]
    pub const fn eps_threshold(&self) -> f64 {
        self.eps_threshold
    }
}
