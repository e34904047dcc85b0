use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use super::LossFn;
use crate::{MlErr, Result};

/// Softmax cross-entropy computed straight from the logits.
#[derive(Default, Clone, Copy, Debug)]
pub struct CrossEntropy;

impl CrossEntropy {
    /// Returns a new `CrossEntropy`.
    pub fn new() -> Self {
        Self
    }

    fn check(&self, y_pred: &ArrayView2<f32>, y: &ArrayView1<usize>) -> Result<()> {
        if y_pred.nrows() != y.len() {
            return Err(MlErr::SizeMismatch {
                what: "labels",
                got: y.len(),
                expected: y_pred.nrows(),
            });
        }

        let classes = y_pred.ncols();
        match y.iter().find(|&&label| label >= classes) {
            Some(&label) => Err(MlErr::LabelOutOfRange { label, classes }),
            None => Ok(()),
        }
    }
}

/// Row-wise softmax, shifted by each row's maximum to keep `exp` bounded.
fn softmax(y_pred: ArrayView2<f32>) -> Array2<f32> {
    let mut probs = y_pred.to_owned();

    for mut row in probs.axis_iter_mut(Axis(0)) {
        let max = row.fold(f32::NEG_INFINITY, |m, &z| m.max(z));
        row.mapv_inplace(|z| (z - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|p| p / sum);
    }

    probs
}

impl LossFn for CrossEntropy {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView1<usize>) -> Result<f32> {
        self.check(&y_pred, &y)?;

        if y.is_empty() {
            return Ok(0.);
        }

        let total: f32 = y_pred
            .axis_iter(Axis(0))
            .zip(y.iter())
            .map(|(row, &label)| {
                let max = row.fold(f32::NEG_INFINITY, |m, &z| m.max(z));
                let lse = max + row.iter().map(|&z| (z - max).exp()).sum::<f32>().ln();
                lse - row[label]
            })
            .sum();

        Ok(total / y.len() as f32)
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView1<usize>) -> Result<Array2<f32>> {
        self.check(&y_pred, &y)?;

        let n = y.len().max(1) as f32;
        let mut d = softmax(y_pred);

        for (mut row, &label) in d.axis_iter_mut(Axis(0)).zip(y.iter()) {
            row[label] -= 1.;
            row.mapv_inplace(|g| g / n);
        }

        Ok(d)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array1, array};

    use super::*;

    #[test]
    fn uniform_logits_give_log_classes() {
        let y_pred = Array2::<f32>::zeros((4, 5));
        let y = Array1::from_vec(vec![0, 1, 2, 4]);

        let loss = CrossEntropy::new().loss(y_pred.view(), y.view()).unwrap();
        assert!((loss - 5f32.ln()).abs() < 1e-6);
    }

    #[test]
    fn confident_prediction_has_small_loss() {
        let y_pred = array![[10., -10.], [-10., 10.]];
        let y = array![0, 1];

        let loss = CrossEntropy::new().loss(y_pred.view(), y.view()).unwrap();
        assert!(loss < 1e-6);
    }

    #[test]
    fn large_logits_stay_finite() {
        let y_pred = array![[1000., 0.], [0., 1000.]];
        let y = array![1, 0];

        let loss = CrossEntropy::new().loss(y_pred.view(), y.view()).unwrap();
        assert!(loss.is_finite());
        assert!((loss - 1000.).abs() < 1e-3);
    }

    #[test]
    fn prime_rows_sum_to_zero() {
        let y_pred = array![[0.5, -1., 2.], [3., 0., -0.25]];
        let y = array![2, 0];

        let d = CrossEntropy::new().loss_prime(y_pred.view(), y.view()).unwrap();
        for row in d.axis_iter(Axis(0)) {
            assert!(row.sum().abs() < 1e-6);
        }

        // softmax(0, 0) - onehot(0), scaled by 1 / batch.
        let d = CrossEntropy::new()
            .loss_prime(array![[0., 0.]].view(), array![0].view())
            .unwrap();
        assert!((d[[0, 0]] + 0.5).abs() < 1e-6);
        assert!((d[[0, 1]] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn rejects_out_of_range_labels() {
        let y_pred = Array2::<f32>::zeros((1, 5));
        let y = array![5];

        let err = CrossEntropy::new().loss(y_pred.view(), y.view()).unwrap_err();
        assert!(matches!(err, MlErr::LabelOutOfRange { label: 5, classes: 5 }));
    }

    #[test]
    fn rejects_mismatched_batches() {
        let y_pred = Array2::<f32>::zeros((2, 5));
        let y = array![1];

        let err = CrossEntropy::new().loss(y_pred.view(), y.view()).unwrap_err();
        assert!(matches!(err, MlErr::SizeMismatch { what: "labels", .. }));
    }
}
