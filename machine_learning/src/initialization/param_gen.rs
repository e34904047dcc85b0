use crate::{MlErr, Result};

/// A `ParamGen` generates values for the initial state of the model's parameters.
pub trait ParamGen {
    /// Should sample at most `n` parameters.
    ///
    /// # Arguments
    /// * `n` - The upper limit of samples to generate.
    ///
    /// # Returns
    /// An option whether the generator is exhausted.
    fn sample(&mut self, n: usize) -> Option<Vec<f32>>;
}

/// Draws exactly `n` parameters from `param_gen`.
///
/// # Returns
/// The parameters, or an error if the generator ran out before producing all of them.
pub fn generate<G>(param_gen: &mut G, n: usize) -> Result<Vec<f32>>
where
    G: ParamGen + ?Sized,
{
    let mut params = Vec::with_capacity(n);

    while params.len() < n {
        match param_gen.sample(n - params.len()) {
            Some(sample) if !sample.is_empty() => params.extend(sample),
            _ => {
                return Err(MlErr::ParamGenExhausted {
                    got: params.len(),
                    expected: n,
                });
            }
        }
    }

    Ok(params)
}
