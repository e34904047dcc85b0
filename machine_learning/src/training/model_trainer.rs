use std::num::NonZeroUsize;

use rand::{Rng, seq::SliceRandom};

use super::StepMetrics;
use crate::{
    MlErr, Result,
    arch::{Model, loss::LossFn},
    dataset::Dataset,
    optimization::Optimizer,
};

/// A model `Trainer`. Owns the model, its parameters and the optimizer that updates them, so the
/// three of them are always created and replaced together.
#[derive(Debug)]
pub struct ModelTrainer<M, O, L>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
{
    model: M,
    optimizer: O,
    loss_fn: L,

    params: Vec<f32>,
    grad: Vec<f32>,
    batch_size: NonZeroUsize,
    order: Vec<usize>,
    updates: u64,
}

impl<M, O, L> ModelTrainer<M, O, L>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
{
    /// Returns a new `ModelTrainer`.
    ///
    /// # Arguments
    /// * `model` - The model that will be trained.
    /// * `params` - The model's initial parameters.
    /// * `optimizer` - The optimizer that dictates how to update the parameters.
    /// * `loss_fn` - The loss function used to measure the difference between a model's output and the expected one.
    /// * `batch_size` - The maximum amount of samples per parameter update.
    ///
    /// # Returns
    /// A new `ModelTrainer`, or an error if `params` doesn't fit the model.
    pub fn new(
        model: M,
        params: Vec<f32>,
        optimizer: O,
        loss_fn: L,
        batch_size: NonZeroUsize,
    ) -> Result<Self> {
        if params.len() != model.size() {
            return Err(MlErr::SizeMismatch {
                what: "model params",
                got: params.len(),
                expected: model.size(),
            });
        }

        Ok(Self {
            grad: vec![0.; params.len()],
            model,
            optimizer,
            loss_fn,
            params,
            batch_size,
            order: Vec::new(),
            updates: 0,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn params(&self) -> &[f32] {
        &self.params
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    pub fn optimizer_mut(&mut self) -> &mut O {
        &mut self.optimizer
    }

    /// Returns the amount of parameter updates applied since construction.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Performs `epochs` epochs of training over `dataset`, each one a fresh shuffle split into
    /// mini-batches with one parameter update per batch.
    ///
    /// # Arguments
    /// * `dataset` - The samples to train with.
    /// * `epochs` - The amount of full passes over the dataset.
    /// * `rng` - The source of the per-epoch shuffles.
    ///
    /// # Returns
    /// The mean batch loss of the last epoch and the accuracy over every epoch.
    pub fn train<R>(
        &mut self,
        dataset: &Dataset,
        epochs: NonZeroUsize,
        rng: &mut R,
    ) -> Result<StepMetrics>
    where
        R: Rng + ?Sized,
    {
        if dataset.is_empty() {
            return Err(MlErr::EmptyDataset);
        }

        if self.order.len() != dataset.len() {
            self.order = (0..dataset.len()).collect();
        }

        let mut loss = 0.;
        let mut correct = 0;
        let mut seen = 0;

        for _ in 0..epochs.get() {
            self.order.shuffle(rng);

            let mut epoch_loss = 0.;
            let mut batches = 0;

            for (x, y) in dataset.batches(&self.order, self.batch_size.get()) {
                let stats = self.model.backprop(
                    &mut self.params,
                    &mut self.grad,
                    &self.loss_fn,
                    &mut self.optimizer,
                    x.view(),
                    y.view(),
                )?;

                self.updates += 1;
                epoch_loss += stats.loss;
                batches += 1;
                correct += stats.correct;
                seen += stats.samples;
            }

            loss = epoch_loss / batches as f32;
        }

        Ok(StepMetrics {
            loss,
            accuracy: correct as f32 / seen as f32,
        })
    }
}
