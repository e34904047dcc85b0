use crate::Result;

/// Defines the strategy for updating model parameters based on calculated gradients.
///
/// Implementors hold whatever state the rule needs between updates, so an instance must be
/// paired with exactly one parameter buffer.
pub trait Optimizer {
    /// Updates the provided slice of parameters using the given gradient.
    ///
    /// # Arguments
    /// * `grad` - A reference to the model's gradient.
    /// * `params` - The parameters to update.
    ///
    /// # Returns
    /// An error if there's a mismatch in the sizes of `grad` and `params`.
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()>;

    /// Returns the learning rate used by the next updates.
    fn learning_rate(&self) -> f32;

    /// Replaces the learning rate for every following update.
    ///
    /// # Returns
    /// An error if `learning_rate` is not positive and finite.
    fn set_learning_rate(&mut self, learning_rate: f32) -> Result<()>;
}
