use std::ops::Range;

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use super::{BatchStats, Model, layers::Dense, loss::LossFn};
use crate::{MlErr, Result, optimization::Optimizer};

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers.
///
/// The parameters of every layer live in a single flat buffer, one contiguous span per layer in
/// the order the layers were given.
#[derive(Clone, Debug)]
pub struct Sequential {
    layers: Vec<Dense>,
}

impl Sequential {
    /// Creates a new `Sequential`.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    ///
    /// # Returns
    /// A new `Sequential` instance.
    pub fn new<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Dense>,
    {
        Self {
            layers: layers.into_iter().collect(),
        }
    }

    /// Returns the layers of the model.
    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    /// Gives a view of the weights and biases of the `idx`-th layer.
    ///
    /// # Arguments
    /// * `params` - The whole model's parameters.
    /// * `idx` - The index of the layer.
    ///
    /// # Returns
    /// The `[out, in]` weights and the biases, or an error if there's no such layer or the
    /// parameters don't fit the model.
    pub fn layer_params<'a>(
        &self,
        params: &'a [f32],
        idx: usize,
    ) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
        self.check_len(params.len())?;

        let layer = self.layers.get(idx).ok_or(MlErr::SizeMismatch {
            what: "layers",
            got: idx,
            expected: self.layers.len(),
        })?;

        let span = self.spans().nth(idx).unwrap_or_default();
        layer.view_params(&params[span])
    }

    /// The span each layer takes in the flat parameter buffer.
    fn spans(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.layers.iter().scan(0, |start, layer| {
            let span = *start..*start + layer.size();
            *start = span.end;
            Some(span)
        })
    }

    fn check_len(&self, got: usize) -> Result<()> {
        let expected = self.size();

        if got != expected {
            return Err(MlErr::SizeMismatch {
                what: "model params",
                got,
                expected,
            });
        }

        Ok(())
    }
}

/// Returns the index of the largest value in `row`, the first one on ties.
pub(crate) fn argmax(row: ArrayView1<f32>) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, max), (i, &v)| {
            if v > max { (i, v) } else { (best, max) }
        })
        .0
}

impl Model for Sequential {
    fn size(&self) -> usize {
        self.layers.iter().map(Dense::size).sum()
    }

    fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_len(params.len())?;

        let spans: Vec<_> = self.spans().collect();
        let mut layers = self.layers.iter_mut().zip(spans);

        let Some((first, span)) = layers.next() else {
            return Ok(x.to_owned());
        };

        let mut a = first.forward(&params[span], x)?;
        for (layer, span) in layers {
            a = layer.forward(&params[span], a.view())?;
        }

        Ok(a)
    }

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
        O: Optimizer,
    {
        if grad.len() != params.len() {
            return Err(MlErr::SizeMismatch {
                what: "gradient",
                got: grad.len(),
                expected: params.len(),
            });
        }

        let y_pred = self.forward(params, x)?;
        let loss = loss_fn.loss(y_pred.view(), y)?;
        let correct = y_pred
            .axis_iter(Axis(0))
            .zip(y.iter())
            .filter(|(row, label)| argmax(row.view()) == **label)
            .count();

        let spans: Vec<_> = self.spans().collect();
        let mut d = loss_fn.loss_prime(y_pred.view(), y)?;

        for (layer, span) in self.layers.iter_mut().zip(spans).rev() {
            d = layer.backward(&params[span.clone()], &mut grad[span], d)?;
        }

        optimizer.update_params(grad, params)?;

        Ok(BatchStats {
            loss,
            correct,
            samples: y.len(),
        })
    }
}
