use std::num::NonZeroUsize;

use machine_learning::{
    Result,
    arch::{Sequential, loss::CrossEntropy},
    dataset::Dataset,
    optimization::{GradientDescent, Optimizer},
    training::{ModelTrainer, StepMetrics},
};
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    classifier,
    snapshot::{self, WeightsSnapshot},
};

/// The maximum amount of samples per parameter update.
pub const BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(64).unwrap();

/// The learning rate of a freshly initialized optimizer.
pub const DEFAULT_LEARNING_RATE: f32 = 0.001;

type Trainer = ModelTrainer<Sequential, GradientDescent, CrossEntropy>;

/// Everything a reset replaces: the classifier's parameters, the optimizer bound to them and the
/// source of the epoch shuffles.
#[derive(Debug)]
pub struct TrainingState {
    trainer: Trainer,
    rng: StdRng,
}

impl TrainingState {
    /// Creates a freshly initialized state, deriving its own randomness from `seeds`.
    pub fn new(seeds: &mut StdRng) -> Result<Self> {
        let init_rng = StdRng::from_rng(seeds);
        let rng = StdRng::from_rng(seeds);

        let model = classifier::build();
        let params = classifier::init_params(&model, init_rng)?;
        let optimizer = GradientDescent::new(DEFAULT_LEARNING_RATE)?;
        let trainer = ModelTrainer::new(model, params, optimizer, CrossEntropy::new(), BATCH_SIZE)?;

        Ok(Self { trainer, rng })
    }

    /// Sets the optimizer's learning rate, which stays in effect for the next steps, and trains
    /// for `epochs` epochs over `dataset`.
    pub fn step(
        &mut self,
        dataset: &Dataset,
        epochs: NonZeroUsize,
        learning_rate: f32,
    ) -> Result<StepMetrics> {
        self.trainer.optimizer_mut().set_learning_rate(learning_rate)?;
        self.trainer.train(dataset, epochs, &mut self.rng)
    }

    pub fn learning_rate(&self) -> f32 {
        self.trainer.optimizer().learning_rate()
    }

    pub fn updates(&self) -> u64 {
        self.trainer.updates()
    }

    /// Copies a bounded view of the current parameters.
    pub fn snapshot(&self, limit: NonZeroUsize) -> Result<WeightsSnapshot> {
        snapshot::extract(
            self.trainer.model(),
            self.trainer.params(),
            limit,
            self.updates(),
        )
    }
}
