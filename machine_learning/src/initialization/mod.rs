mod chained;
mod error;
mod param_gen;
mod random;

pub use chained::ChainedParamGen;
pub use error::RandErr;
pub use param_gen::{ParamGen, generate};
pub use random::RandParamGen;
