//! Weak classifiers combined by the boosting engines.
//!
//! Training a weak classifier is an injected strategy: a [`WeakLearner`]
//! receives the full weighted training set and returns a trained
//! [`WeakClassifier`]. Engines only depend on these traits, so alternate
//! learners can be substituted without touching the boosting loop.

/// Decision stumps over Haar feature scores (Viola-Jones)
pub mod stump;

/// Weighted-mean threshold classifiers over raw features (generic boosting)
pub mod threshold;

use crate::{Error, Result};
use ndarray::{ArrayView1, ArrayView2};

pub use stump::{DecisionStump, StumpLearner};
pub use threshold::{ThresholdClassifier, WeightedMeanLearner};

/// A trained classifier predicting `+1.0` or `-1.0` for one sample
pub trait WeakClassifier: Send + Sync {
    /// Predict the label of a sample (one row of the training matrix)
    fn predict(&self, sample: ArrayView1<'_, f64>) -> f64;

    /// Weighted training error reported by the learner
    fn error(&self) -> f64;

    /// Short human readable description
    fn describe(&self) -> String;
}

/// A weak classifier that splits on a single feature column
pub trait FeatureClassifier: WeakClassifier {
    /// Index of the column the classifier splits on
    fn feature(&self) -> usize;

    /// Predict from the value of that column alone
    fn predict_score(&self, score: f64) -> f64;
}

/// Strategy that trains one weak classifier per boosting round
pub trait WeakLearner {
    /// Classifier produced by this learner
    type Classifier: WeakClassifier;

    /// Train on `data` (rows are samples) with ±1 `labels` and sample `weights`
    ///
    /// # Errors
    ///
    /// Returns an error if the inputs are empty or disagree in length
    fn train(
        &self,
        data: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, f64>,
        weights: ArrayView1<'_, f64>,
    ) -> Result<Self::Classifier>;
}

/// Validate the shapes handed to a weak learner
///
/// # Errors
///
/// Returns `InvalidInput` for an empty matrix and `ShapeMismatch` when the
/// label or weight count differs from the number of rows
pub fn check_training_inputs(
    data: ArrayView2<'_, f64>,
    labels: ArrayView1<'_, f64>,
    weights: ArrayView1<'_, f64>,
) -> Result<()> {
    let (rows, cols) = data.dim();
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidInput(format!(
            "Cannot train a weak classifier on a {rows}x{cols} matrix"
        )));
    }
    if labels.len() != rows {
        return Err(Error::ShapeMismatch(format!(
            "{} labels for {rows} samples",
            labels.len()
        )));
    }
    if weights.len() != rows {
        return Err(Error::ShapeMismatch(format!(
            "{} weights for {rows} samples",
            weights.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_check_training_inputs() {
        let data = Array2::<f64>::zeros((3, 2));
        let labels = array![1.0, -1.0, 1.0];
        let weights = array![0.2, 0.3, 0.5];
        assert!(check_training_inputs(data.view(), labels.view(), weights.view()).is_ok());

        let short = array![1.0, -1.0];
        assert!(matches!(
            check_training_inputs(data.view(), short.view(), weights.view()),
            Err(Error::ShapeMismatch(_))
        ));

        let empty = Array2::<f64>::zeros((0, 2));
        let none = ndarray::Array1::<f64>::zeros(0);
        assert!(matches!(
            check_training_inputs(empty.view(), none.view(), none.view()),
            Err(Error::InvalidInput(_))
        ));
    }
}
