use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::{Result, arch::loss::LossFn, optimization::Optimizer};

/// What a single batch pass observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchStats {
    /// The mean loss over the batch.
    pub loss: f32,
    /// The amount of samples whose arg-max prediction matched their label.
    pub correct: usize,
    /// The amount of samples in the batch.
    pub samples: usize,
}

pub trait Model {
    /// Returns the amount of parameters in the model.
    fn size(&self) -> usize;

    /// Makes a forward pass through the model.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `x` - The input batch, one sample per row.
    ///
    /// # Returns
    /// The model's output for every sample of the batch.
    fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Computes the gradient of the loss function with respect to the parameters of the model
    /// over a single batch. **`params` gets updated** according to the optimization algorithm.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `grad` - A buffer for writing the computed gradient.
    /// * `loss_fn` - The loss function.
    /// * `optimizer` - The optimizer that dictates how to update the parameters.
    /// * `x` - The batch's samples.
    /// * `y` - The batch's expected labels.
    ///
    /// # Returns
    /// The batch loss and the amount of samples the model got right before the update.
    fn backprop<L, O>(
        &mut self,
        params: &mut [f32],
        grad: &mut [f32],
        loss_fn: &L,
        optimizer: &mut O,
        x: ArrayView2<f32>,
        y: ArrayView1<usize>,
    ) -> Result<BatchStats>
    where
        L: LossFn,
        O: Optimizer;
}
