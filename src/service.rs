use std::{mem, num::NonZeroUsize};

use log::{debug, info};
use machine_learning::{dataset::Dataset, training::StepMetrics};
use parking_lot::Mutex;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    classifier::ARCHITECTURE,
    error::{Result, ServiceErr},
    snapshot::WeightsSnapshot,
    state::TrainingState,
};

/// Bounds the rows and columns of the visualized hidden weights and the columns of the visualized
/// output weights.
pub const VIS_LIMIT: NonZeroUsize = NonZeroUsize::new(32).unwrap();

/// The amount of epochs of a step when none is given.
pub const DEFAULT_EPOCHS: usize = 1;

/// Owns the dataset and the single live training state.
///
/// Steps, snapshots and resets all go through the same lock, so a snapshot always observes the
/// parameters either before or after a whole training step, never a mix of both.
#[derive(Debug)]
pub struct ModelService {
    dataset: Option<Dataset>,
    state: Mutex<TrainingState>,
    seeds: Mutex<StdRng>,
}

impl ModelService {
    /// Creates a new `ModelService` with a freshly initialized model.
    ///
    /// # Arguments
    /// * `dataset` - The samples to train with, if they could be loaded.
    /// * `seed` - Makes every initialization and shuffle reproducible, drawn from the OS if absent.
    pub fn new(dataset: Option<Dataset>, seed: Option<u64>) -> Result<Self> {
        let mut seeds = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let state = TrainingState::new(&mut seeds)?;

        Ok(Self {
            dataset,
            state: Mutex::new(state),
            seeds: Mutex::new(seeds),
        })
    }

    /// Whether there's a dataset to train with.
    pub fn is_ready(&self) -> bool {
        self.dataset.is_some()
    }

    pub fn architecture(&self) -> [usize; 4] {
        ARCHITECTURE
    }

    /// Trains the live model for `epochs` epochs with `learning_rate`, which stays in effect for
    /// the following steps.
    ///
    /// # Returns
    /// The last epoch's mean loss and the accuracy over every epoch, or an error if there's no
    /// dataset or the arguments are out of their domain. Nothing is mutated on error.
    pub fn step(&self, epochs: usize, learning_rate: f32) -> Result<StepMetrics> {
        let dataset = self.dataset.as_ref().ok_or(ServiceErr::DataUnavailable)?;

        let epochs = NonZeroUsize::new(epochs).ok_or_else(|| ServiceErr::InvalidParameter {
            name: "epochs",
            reason: "must be at least 1".to_string(),
        })?;

        if !learning_rate.is_finite() || learning_rate <= 0. {
            return Err(ServiceErr::InvalidParameter {
                name: "lr",
                reason: format!("must be positive and finite, got {learning_rate}"),
            });
        }

        let mut state = self.state.lock();
        let metrics = state.step(dataset, epochs, learning_rate)?;

        info!(
            epochs = epochs.get(),
            lr = learning_rate,
            loss = metrics.loss,
            accuracy = metrics.accuracy,
            updates = state.updates();
            "training step"
        );

        Ok(metrics)
    }

    /// Copies a `limit`-bounded view of the live parameters.
    pub fn snapshot(&self, limit: NonZeroUsize) -> Result<WeightsSnapshot> {
        let snapshot = self.state.lock().snapshot(limit)?;
        debug!(updates = snapshot.updates; "weights snapshot");
        Ok(snapshot)
    }

    /// Replaces the live model and optimizer with freshly initialized ones.
    ///
    /// The new state is built before taking the lock, concurrent snapshots see either the old
    /// state or the new one.
    pub fn reset(&self) -> Result<()> {
        let fresh = TrainingState::new(&mut self.seeds.lock())?;
        let stale = mem::replace(&mut *self.state.lock(), fresh);

        info!(discarded_updates = stale.updates(); "model reset");
        Ok(())
    }

    /// The learning rate of the last step, or the initial one if there were none since the last
    /// reset.
    pub fn learning_rate(&self) -> f32 {
        self.state.lock().learning_rate()
    }

    /// The amount of parameter updates of the live model.
    pub fn updates(&self) -> u64 {
        self.state.lock().updates()
    }
}
