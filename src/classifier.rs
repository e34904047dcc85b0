use std::{cell::RefCell, rc::Rc};

use machine_learning::{
    Result,
    arch::{Model, Sequential, activations::ActFn, layers::Dense},
    initialization::{ChainedParamGen, ParamGen, RandParamGen, generate},
};
use rand::Rng;

pub const INPUT_DIM: usize = 205;
pub const HIDDEN_DIM: usize = 512;
pub const NUM_CLASSES: usize = 5;

/// Units per layer, input first.
pub const ARCHITECTURE: [usize; 4] = [INPUT_DIM, HIDDEN_DIM, HIDDEN_DIM, NUM_CLASSES];

/// Builds the fixed `205 → 512 → 512 → 5` network: two ReLU hidden layers and a linear output
/// producing the class logits.
pub fn build() -> Sequential {
    Sequential::new([
        Dense::new((INPUT_DIM, HIDDEN_DIM), Some(ActFn::relu())),
        Dense::new((HIDDEN_DIM, HIDDEN_DIM), Some(ActFn::relu())),
        Dense::new((HIDDEN_DIM, NUM_CLASSES), None),
    ])
}

/// Draws a fresh set of parameters for `model`, every weight and bias of a layer sampled from
/// `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`.
pub fn init_params<R>(model: &Sequential, rng: R) -> Result<Vec<f32>>
where
    R: Rng + 'static,
{
    let rng = Rc::new(RefCell::new(rng));
    let mut param_gens: Vec<Box<dyn ParamGen>> = Vec::with_capacity(2 * model.layers().len());

    for layer in model.layers() {
        let (fan_in, fan_out) = layer.dim();
        let weights = RandParamGen::fan_in_uniform(Rc::clone(&rng), fan_in * fan_out, fan_in)?;
        let biases = RandParamGen::fan_in_uniform(Rc::clone(&rng), fan_out, fan_in)?;
        param_gens.push(Box::new(weights));
        param_gens.push(Box::new(biases));
    }

    generate(&mut ChainedParamGen::new(param_gens), model.size())
}
