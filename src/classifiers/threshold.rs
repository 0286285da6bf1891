//! Weighted-mean threshold classifiers for boosting over raw pixel features.

use super::{check_training_inputs, FeatureClassifier, WeakClassifier, WeakLearner};
use crate::Result;
use ndarray::{ArrayView1, ArrayView2};

/// Predicts `sign * (x[feature] > threshold ? +1 : -1)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdClassifier {
    feature: usize,
    threshold: f64,
    sign: f64,
    error: f64,
}

impl ThresholdClassifier {
    /// Create a classifier directly from its parameters
    #[must_use]
    pub fn new(feature: usize, threshold: f64, sign: f64, error: f64) -> Self {
        Self {
            feature,
            threshold,
            sign: if sign < 0.0 { -1.0 } else { 1.0 },
            error,
        }
    }

    /// Decision threshold
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `+1.0` when large values are positive, `-1.0` otherwise
    #[must_use]
    pub const fn sign(&self) -> f64 {
        self.sign
    }
}

impl WeakClassifier for ThresholdClassifier {
    fn predict(&self, sample: ArrayView1<'_, f64>) -> f64 {
        self.predict_score(sample[self.feature])
    }

    fn error(&self) -> f64 {
        self.error
    }

    fn describe(&self) -> String {
        format!(
            "threshold(feature={}, threshold={:.3}, sign={:+})",
            self.feature, self.threshold, self.sign
        )
    }
}

impl FeatureClassifier for ThresholdClassifier {
    fn feature(&self) -> usize {
        self.feature
    }

    fn predict_score(&self, score: f64) -> f64 {
        if score > self.threshold {
            self.sign
        } else {
            -self.sign
        }
    }
}

/// Per column, thresholds halfway between the weighted class means and keeps
/// the column with the lowest weighted error
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedMeanLearner;

impl WeakLearner for WeightedMeanLearner {
    type Classifier = ThresholdClassifier;

    fn train(
        &self,
        data: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, f64>,
        weights: ArrayView1<'_, f64>,
    ) -> Result<ThresholdClassifier> {
        check_training_inputs(data, labels, weights)?;

        let mut best: Option<ThresholdClassifier> = None;

        for (feature, column) in data.columns().into_iter().enumerate() {
            let mut pos = (0.0, 0.0); // (weight, weighted sum)
            let mut neg = (0.0, 0.0);
            for ((&x, &label), &w) in column.iter().zip(labels.iter()).zip(weights.iter()) {
                if label > 0.0 {
                    pos = (pos.0 + w, pos.1 + w * x);
                } else {
                    neg = (neg.0 + w, neg.1 + w * x);
                }
            }

            let mean_pos = if pos.0 > 0.0 { pos.1 / pos.0 } else { 0.0 };
            let mean_neg = if neg.0 > 0.0 { neg.1 / neg.0 } else { 0.0 };
            let threshold = (mean_pos + mean_neg) / 2.0;
            let sign = if mean_pos >= mean_neg { 1.0 } else { -1.0 };

            let mut candidate = ThresholdClassifier::new(feature, threshold, sign, 0.0);
            candidate.error = column
                .iter()
                .zip(labels.iter())
                .zip(weights.iter())
                .filter(|&((&x, &label), _)| candidate.predict_score(x) != label)
                .map(|(_, &w)| w)
                .sum();

            if best.map_or(true, |b| candidate.error < b.error) {
                best = Some(candidate);
            }
        }

        best.ok_or_else(|| crate::Error::TrainingError("No feature columns to split on".to_string()))
    }
}
