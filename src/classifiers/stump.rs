//! Decision stumps: the weak classifier of the Viola-Jones trainer.
//!
//! A stump looks at one score column and predicts `+1` when
//! `polarity * x < polarity * threshold`. Training sweeps every column in
//! sorted order and keeps the split with the lowest weighted error.

use super::{check_training_inputs, FeatureClassifier, WeakClassifier, WeakLearner};
use crate::{Error, Result};
use ndarray::{ArrayView1, ArrayView2};
use rayon::prelude::*;
use std::cmp::Ordering;

/// A trained single-feature threshold classifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionStump {
    feature: usize,
    threshold: f64,
    polarity: f64,
    error: f64,
}

impl DecisionStump {
    /// Create a stump directly from its parameters
    ///
    /// `polarity` is normalised to `+1.0` or `-1.0` by its sign.
    #[must_use]
    pub fn new(feature: usize, threshold: f64, polarity: f64, error: f64) -> Self {
        Self {
            feature,
            threshold,
            polarity: if polarity < 0.0 { -1.0 } else { 1.0 },
            error,
        }
    }

    /// Decision threshold
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `+1.0` if values below the threshold are positive, `-1.0` otherwise
    #[must_use]
    pub const fn polarity(&self) -> f64 {
        self.polarity
    }
}

impl WeakClassifier for DecisionStump {
    fn predict(&self, sample: ArrayView1<'_, f64>) -> f64 {
        self.predict_score(sample[self.feature])
    }

    fn error(&self) -> f64 {
        self.error
    }

    fn describe(&self) -> String {
        format!(
            "stump(feature={}, threshold={:.3}, polarity={:+})",
            self.feature, self.threshold, self.polarity
        )
    }
}

impl FeatureClassifier for DecisionStump {
    fn feature(&self) -> usize {
        self.feature
    }

    fn predict_score(&self, score: f64) -> f64 {
        if self.polarity * score < self.polarity * self.threshold {
            1.0
        } else {
            -1.0
        }
    }
}

/// Trains [`DecisionStump`]s by exhaustive search over every column
#[derive(Debug, Clone, Copy, Default)]
pub struct StumpLearner;

impl StumpLearner {
    /// Create a stump learner
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl WeakLearner for StumpLearner {
    type Classifier = DecisionStump;

    fn train(
        &self,
        data: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, f64>,
        weights: ArrayView1<'_, f64>,
    ) -> Result<DecisionStump> {
        check_training_inputs(data, labels, weights)?;

        let (total_pos, total_neg) = labels
            .iter()
            .zip(weights.iter())
            .fold((0.0, 0.0), |(pos, neg), (&label, &weight)| {
                if label > 0.0 {
                    (pos + weight, neg)
                } else {
                    (pos, neg + weight)
                }
            });

        (0..data.ncols())
            .into_par_iter()
            .map(|feature| best_split(feature, data.column(feature), labels, weights, total_pos, total_neg))
            .reduce_with(|a, b| match a.error.total_cmp(&b.error) {
                Ordering::Less => a,
                Ordering::Greater => b,
                Ordering::Equal => {
                    if a.feature <= b.feature {
                        a
                    } else {
                        b
                    }
                }
            })
            .ok_or_else(|| Error::TrainingError("No feature columns to split on".to_string()))
    }
}

/// Lowest-error split of a single column.
///
/// Candidate thresholds sit halfway between consecutive distinct sorted
/// values, plus one below the minimum and one above the maximum, so no
/// training sample ever lies on a threshold.
fn best_split(
    feature: usize,
    column: ArrayView1<'_, f64>,
    labels: ArrayView1<'_, f64>,
    weights: ArrayView1<'_, f64>,
    total_pos: f64,
    total_neg: f64,
) -> DecisionStump {
    let n = column.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| column[a].total_cmp(&column[b]));

    let mut best = DecisionStump::new(feature, 0.0, 1.0, f64::INFINITY);
    let mut below_pos = 0.0;
    let mut below_neg = 0.0;

    for k in 0..=n {
        let boundary = k == 0 || k == n || column[order[k]] != column[order[k - 1]];
        if boundary {
            let threshold = if k == 0 {
                column[order[0]] - 1.0
            } else if k == n {
                column[order[n - 1]] + 1.0
            } else {
                (column[order[k - 1]] + column[order[k]]) / 2.0
            };

            // Positives below the threshold
            let error_below = below_neg + (total_pos - below_pos);
            if error_below < best.error {
                best = DecisionStump::new(feature, threshold, 1.0, error_below);
            }
            // Positives above the threshold
            let error_above = below_pos + (total_neg - below_neg);
            if error_above < best.error {
                best = DecisionStump::new(feature, threshold, -1.0, error_above);
            }
        }

        if k < n {
            let index = order[k];
            if labels[index] > 0.0 {
                below_pos += weights[index];
            } else {
                below_neg += weights[index];
            }
        }
    }

    best
}
