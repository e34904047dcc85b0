use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::Result;

/// A loss function over a batch of logits and their expected class labels.
pub trait LossFn {
    /// Returns the mean loss of the batch.
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView1<usize>) -> Result<f32>;

    /// Returns the derivative of the mean loss with respect to `y_pred`.
    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView1<usize>) -> Result<Array2<f32>>;
}
