use std::num::NonZeroUsize;

use machine_learning::{Result, arch::Sequential};
use ndarray::{ArrayView1, ArrayView2, s};
use serde::Serialize;

/// A bounded copy of one layer's weights and biases.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSnapshot {
    /// `[out][in]`, rows are the layer's units.
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

impl LayerSnapshot {
    /// Copies the top-left `rows × cols` corner of `weights` and the first `rows` biases,
    /// clamping both bounds to the actual dimensions.
    pub fn bounded(
        weights: ArrayView2<f32>,
        bias: ArrayView1<f32>,
        rows: usize,
        cols: usize,
    ) -> Self {
        let rows = rows.min(weights.nrows());
        let cols = cols.min(weights.ncols());

        Self {
            weights: weights
                .slice(s![..rows, ..cols])
                .outer_iter()
                .map(|row| row.to_vec())
                .collect(),
            bias: bias.iter().take(rows).copied().collect(),
        }
    }

    /// The (rows, cols) of the copied weights.
    pub fn shape(&self) -> (usize, usize) {
        let cols = self.weights.first().map_or(0, Vec::len);
        (self.weights.len(), cols)
    }
}

/// A read-only view of the classifier used for visualization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightsSnapshot {
    pub layer1: LayerSnapshot,
    pub layer2: LayerSnapshot,
    pub output: LayerSnapshot,
    /// The amount of parameter updates the copied parameters had gone through.
    #[serde(skip)]
    pub updates: u64,
}

/// Copies a `limit`-bounded view of the three layers: the top-left `limit × limit` corner of
/// both hidden layers, and every output unit over the first `limit` inputs with the full output
/// bias.
pub fn extract(
    model: &Sequential,
    params: &[f32],
    limit: NonZeroUsize,
    updates: u64,
) -> Result<WeightsSnapshot> {
    let limit = limit.get();

    let (w1, b1) = model.layer_params(params, 0)?;
    let (w2, b2) = model.layer_params(params, 1)?;
    let (wo, bo) = model.layer_params(params, 2)?;

    Ok(WeightsSnapshot {
        layer1: LayerSnapshot::bounded(w1, b1, limit, limit),
        layer2: LayerSnapshot::bounded(w2, b2, limit, limit),
        output: LayerSnapshot::bounded(wo, bo, usize::MAX, limit),
        updates,
    })
}
