//! Pieces shared by the boosting training loops.

use crate::classifiers::WeakClassifier;
use crate::constants::ERROR_FLOOR;
use crate::{Error, Result};
use ndarray::{Array1, ArrayView1};
use std::fmt;

/// Position of an engine in its per-round training cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrainingState {
    /// No round has started
    #[default]
    Uninitialized,
    /// Sample weights were renormalised to sum to one
    WeightsNormalized,
    /// A weak classifier was trained for the current round
    ClassifierTrained,
    /// Sample weights were updated from the round's outcome
    WeightsUpdated,
    /// Training stopped before the requested number of rounds
    Terminated,
}

impl fmt::Display for TrainingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrainingState::Uninitialized => "uninitialized",
            TrainingState::WeightsNormalized => "weights_normalized",
            TrainingState::ClassifierTrained => "classifier_trained",
            TrainingState::WeightsUpdated => "weights_updated",
            TrainingState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Weighted vote of weak classifiers, in training round order
#[derive(Debug, Clone)]
pub struct Ensemble<C> {
    members: Vec<(C, f64)>,
}

impl<C> Ensemble<C> {
    /// An ensemble with no members
    #[must_use]
    pub const fn new() -> Self {
        Self { members: Vec::new() }
    }

    pub(crate) fn push(&mut self, classifier: C, alpha: f64) {
        self.members.push((classifier, alpha));
    }

    pub(crate) fn clear(&mut self) {
        self.members.clear();
    }

    /// Number of trained rounds
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether no round has been trained
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// `(classifier, alpha)` pairs in round order
    pub fn iter(&self) -> impl Iterator<Item = &(C, f64)> {
        self.members.iter()
    }

    /// Classifier weights in round order
    #[must_use]
    pub fn alphas(&self) -> Vec<f64> {
        self.members.iter().map(|(_, alpha)| *alpha).collect()
    }

    /// Classifiers in round order
    #[must_use]
    pub fn classifiers(&self) -> Vec<&C> {
        self.members.iter().map(|(classifier, _)| classifier).collect()
    }

    /// Sum of all classifier weights
    #[must_use]
    pub fn total_alpha(&self) -> f64 {
        self.members.iter().map(|(_, alpha)| alpha).sum()
    }
}

impl<C: WeakClassifier> Ensemble<C> {
    /// Weighted vote `S = sum(alpha_j * h_j(x))` for one sample
    #[must_use]
    pub fn decision(&self, sample: ArrayView1<'_, f64>) -> f64 {
        self.members
            .iter()
            .map(|(classifier, alpha)| alpha * classifier.predict(sample))
            .sum()
    }
}

impl<C> Default for Ensemble<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Rescale weights in place so they sum to one
///
/// # Errors
///
/// Returns `TrainingError` if the weights are empty or their sum is not a
/// positive finite number
pub fn normalize_weights(weights: &mut Array1<f64>) -> Result<()> {
    let total = weights.sum();
    if weights.is_empty() || !total.is_finite() || total <= 0.0 {
        return Err(Error::TrainingError(format!(
            "Cannot normalise {} sample weights summing to {total}",
            weights.len()
        )));
    }
    weights.mapv_inplace(|w| w / total);
    Ok(())
}

/// Sum of the weights of samples whose prediction differs from the label
#[must_use]
pub fn weighted_error(predictions: ArrayView1<'_, f64>, labels: ArrayView1<'_, f64>, weights: ArrayView1<'_, f64>) -> f64 {
    predictions
        .iter()
        .zip(labels.iter())
        .zip(weights.iter())
        .filter(|((p, y), _)| p != y)
        .map(|(_, w)| w)
        .sum()
}

/// Reject a round error that makes the classifier weight undefined
///
/// # Errors
///
/// Returns `TrainingError` for a NaN error or an error of one or more
pub fn check_round_error(error: f64) -> Result<()> {
    if error.is_nan() || error >= 1.0 {
        return Err(Error::TrainingError(format!(
            "Weak classifier error {error} leaves no usable classifier weight"
        )));
    }
    Ok(())
}

/// Whether a round error is low enough to count as a perfect classifier
#[must_use]
pub fn is_perfect(error: f64) -> bool {
    error <= ERROR_FLOOR
}

/// AdaBoost classifier weight `0.5 * ln((1 - e) / e)`, with `e` floored
#[must_use]
pub fn adaboost_alpha(error: f64) -> f64 {
    let e = error.max(ERROR_FLOOR);
    0.5 * ((1.0 - e) / e).ln()
}

/// Viola-Jones `beta = e / (1 - e)`, with `e` floored
#[must_use]
pub fn viola_jones_beta(error: f64) -> f64 {
    let e = error.max(ERROR_FLOOR);
    e / (1.0 - e)
}
