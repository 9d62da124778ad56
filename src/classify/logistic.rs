// Pairwise logistic regression — separates two users' tweet vectors.
//
// Fit by full-batch gradient descent from a zero start. There is no random
// state anywhere (no shuffling, no random init), so the same training set
// always yields bit-identical weights and therefore identical predictions.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Which side of a pair a vector (or a prediction) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Label {
    Zero,
    One,
}

impl Label {
    pub fn as_index(self) -> usize {
        match self {
            Label::Zero => 0,
            Label::One => 1,
        }
    }

    pub fn flip(self) -> Self {
        match self {
            Label::Zero => Label::One,
            Label::One => Label::Zero,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_index())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// One class has no vectors at all.
    #[error("class {0} has no training vectors")]
    InsufficientData(Label),

    /// Bad input shape or a numerically broken fit.
    #[error("{0}")]
    Training(String),
}

/// Hyperparameters for the gradient descent fit.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    /// Base step size. Scaled down automatically for large-norm inputs.
    pub learning_rate: f64,
    /// Maximum number of full passes over the training set.
    pub epochs: usize,
    /// L2 penalty on the weights (not the bias).
    pub l2: f64,
    /// Stop once the gradient norm falls below this.
    pub tolerance: f64,
    /// Weight each sample by n / (2 * n_class) so a user with many more
    /// tweets doesn't shift the decision boundary toward the other user.
    pub balance_classes: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            epochs: 500,
            l2: 1e-3,
            tolerance: 1e-6,
            balance_classes: false,
        }
    }
}

/// Fits a fresh `PairModel` per call. Holds only configuration.
#[derive(Debug, Clone, Default)]
pub struct LogisticTrainer {
    config: TrainerConfig,
}

impl LogisticTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Fit a classifier where `class_zero` vectors are label 0 and
    /// `class_one` vectors are label 1.
    pub fn fit(&self, class_zero: &[Vec<f64>], class_one: &[Vec<f64>]) -> Result<PairModel, FitError> {
        if class_zero.is_empty() {
            return Err(FitError::InsufficientData(Label::Zero));
        }
        if class_one.is_empty() {
            return Err(FitError::InsufficientData(Label::One));
        }

        let dim = class_zero[0].len();
        if dim == 0 {
            return Err(FitError::Training("vectors have zero dimensions".to_string()));
        }

        let samples: Vec<(&[f64], f64)> = class_zero
            .iter()
            .map(|v| (v.as_slice(), 0.0))
            .chain(class_one.iter().map(|v| (v.as_slice(), 1.0)))
            .collect();

        for (x, _) in &samples {
            if x.len() != dim {
                return Err(FitError::Training(format!(
                    "vector dimension mismatch: expected {dim}, got {}",
                    x.len()
                )));
            }
            if x.iter().any(|v| !v.is_finite()) {
                return Err(FitError::Training(
                    "training vectors contain non-finite values".to_string(),
                ));
            }
        }

        let n = samples.len() as f64;
        let (weight_zero, weight_one) = if self.config.balance_classes {
            (
                n / (2.0 * class_zero.len() as f64),
                n / (2.0 * class_one.len() as f64),
            )
        } else {
            (1.0, 1.0)
        };
        let total_weight =
            weight_zero * class_zero.len() as f64 + weight_one * class_one.len() as f64;

        // The logistic loss gradient is Lipschitz with constant at most
        // 0.25 * max ||(x, 1)||^2, so shrinking the step by that keeps
        // descent stable for any input scale.
        let max_sq_norm = samples
            .iter()
            .map(|(x, _)| x.iter().map(|v| v * v).sum::<f64>())
            .fold(0.0_f64, f64::max);
        let step = self.config.learning_rate / (0.25 * (max_sq_norm + 1.0)).max(1.0);

        let mut weights = vec![0.0_f64; dim];
        let mut bias = 0.0_f64;
        let mut grad_w = vec![0.0_f64; dim];
        let mut epochs_run = 0;

        for _ in 0..self.config.epochs {
            epochs_run += 1;
            grad_w.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_b = 0.0_f64;

            for &(x, y) in &samples {
                let sample_weight = if y > 0.5 { weight_one } else { weight_zero };
                let err = (sigmoid(dot(&weights, x) + bias) - y) * sample_weight;
                for (g, &xi) in grad_w.iter_mut().zip(x) {
                    *g += err * xi;
                }
                grad_b += err;
            }

            let mut grad_norm_sq = 0.0_f64;
            for (g, &w) in grad_w.iter_mut().zip(&weights) {
                *g = *g / total_weight + self.config.l2 * w;
                grad_norm_sq += *g * *g;
            }
            grad_b /= total_weight;
            grad_norm_sq += grad_b * grad_b;

            for (w, &g) in weights.iter_mut().zip(&grad_w) {
                *w -= step * g;
            }
            bias -= step * grad_b;

            if grad_norm_sq.sqrt() < self.config.tolerance {
                break;
            }
        }

        if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(FitError::Training(
                "gradient descent diverged (non-finite weights)".to_string(),
            ));
        }

        debug!(
            class_zero = class_zero.len(),
            class_one = class_one.len(),
            dim = dim,
            epochs = epochs_run,
            balanced = self.config.balance_classes,
            "Fitted pairwise logistic regression"
        );

        Ok(PairModel { weights, bias })
    }
}

/// A fitted binary linear classifier. Ephemeral — built per comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct PairModel {
    weights: Vec<f64>,
    bias: f64,
}

impl PairModel {
    pub fn dimension(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Signed distance-like score: positive leans toward label 1.
    pub fn decision(&self, x: &[f64]) -> f64 {
        dot(&self.weights, x) + self.bias
    }

    /// Probability that `x` belongs to label 1.
    pub fn probability(&self, x: &[f64]) -> f64 {
        sigmoid(self.decision(x))
    }

    /// Label 1 only when the decision is strictly positive; an exact tie
    /// goes to label 0.
    pub fn predict(&self, x: &[f64]) -> Label {
        if self.decision(x) > 0.0 {
            Label::One
        } else {
            Label::Zero
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Numerically stable logistic function.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
