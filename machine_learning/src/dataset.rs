use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::{MlErr, Result};

/// An in-memory labeled dataset: one feature row and one class label per sample.
///
/// It's immutable once built, batches are gathered from a permutation of sample indices instead
/// of shuffling the data itself, so it can be shared between callers without synchronization.
#[derive(Debug, Clone)]
pub struct Dataset {
    x_size: usize,
    features: Vec<f32>,
    labels: Vec<usize>,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Arguments
    /// * `features` - The row-major features of every sample.
    /// * `labels` - The label of every sample.
    /// * `x_size` - The amount of features per sample.
    ///
    /// # Returns
    /// A new `Dataset` instance, or an error if the features don't split into one row per label.
    pub fn new(features: Vec<f32>, labels: Vec<usize>, x_size: usize) -> Result<Self> {
        let expected = labels.len() * x_size;

        if features.len() != expected {
            return Err(MlErr::SizeMismatch {
                what: "dataset features",
                got: features.len(),
                expected,
            });
        }

        Ok(Self {
            x_size,
            features,
            labels,
        })
    }

    /// Returns the amount of samples.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns the amount of features per sample.
    pub fn x_size(&self) -> usize {
        self.x_size
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Returns a `[len, x_size]` view of the features.
    pub fn features(&self) -> ArrayView2<'_, f32> {
        // `new` checked `features.len() == labels.len() * x_size`, the shape always fits.
        ArrayView2::from_shape((self.len(), self.x_size), &self.features).unwrap()
    }

    /// Gathers the samples at `indices` into a batch.
    ///
    /// # Panics
    /// If any index is out of bounds.
    pub fn batch(&self, indices: &[usize]) -> (Array2<f32>, Array1<usize>) {
        let x = self.features().select(Axis(0), indices);
        let y = indices.iter().map(|&i| self.labels[i]).collect();
        (x, y)
    }

    /// Splits `order` into contiguous chunks of `batch_size` and gathers each of them, the last
    /// batch being smaller whenever `order.len()` is not a multiple of `batch_size`.
    ///
    /// # Arguments
    /// * `order` - The order in which to visit the samples.
    /// * `batch_size` - The maximum amount of samples per batch.
    pub fn batches<'a>(
        &'a self,
        order: &'a [usize],
        batch_size: usize,
    ) -> impl Iterator<Item = (Array2<f32>, Array1<usize>)> + 'a {
        order
            .chunks(batch_size.max(1))
            .map(move |indices| self.batch(indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let features = (0..10).map(|i| i as f32).collect();
        Dataset::new(features, vec![0, 1, 2, 3, 4], 2).unwrap()
    }

    #[test]
    fn shape() {
        let ds = dataset();
        assert_eq!(ds.len(), 5);
        assert_eq!(ds.x_size(), 2);
        assert_eq!(ds.features().dim(), (5, 2));
    }

    #[test]
    fn rejects_ragged_features() {
        let err = Dataset::new(vec![0.; 9], vec![0; 5], 2).unwrap_err();
        assert!(matches!(err, MlErr::SizeMismatch { got: 9, expected: 10, .. }));
    }

    #[test]
    fn batch_follows_indices() {
        let (x, y) = dataset().batch(&[3, 0]);
        assert_eq!(x, ndarray::array![[6., 7.], [0., 1.]]);
        assert_eq!(y.to_vec(), [3, 0]);
    }

    #[test]
    fn batches_keep_the_remainder() {
        let ds = dataset();
        let order = [4, 2, 0, 1, 3];

        let sizes: Vec<_> = ds.batches(&order, 2).map(|(x, y)| (x.nrows(), y.len())).collect();
        assert_eq!(sizes, [(2, 2), (2, 2), (1, 1)]);

        let labels: Vec<_> = ds.batches(&order, 2).flat_map(|(_, y)| y.to_vec()).collect();
        assert_eq!(labels, order);
    }

    #[test]
    fn batch_larger_than_dataset() {
        let ds = dataset();
        let order = [0, 1, 2, 3, 4];

        let batches: Vec<_> = ds.batches(&order, 64).collect();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].0.nrows(), 5);
    }
}
