// Pairwise classification — a fresh binary model per user pair.

pub mod logistic;

pub use logistic::{FitError, Label, LogisticTrainer, PairModel, TrainerConfig};
