use std::{
    error::Error,
    fmt::{self, Display},
};

use ndarray::ShapeError;

use crate::initialization::RandErr;

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    Shape(ShapeError),
    LabelOutOfRange {
        label: usize,
        classes: usize,
    },
    EmptyDataset,
    InvalidLearningRate(f32),
    ParamGenExhausted {
        got: usize,
        expected: usize,
    },
    Rand(RandErr),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch in {what}, got {got} and expected {expected}"
            ),
            MlErr::Shape(e) => write!(f, "Invalid array shape: {e}"),
            MlErr::LabelOutOfRange { label, classes } => write!(
                f,
                "The label {label} is out of range for a model with {classes} classes"
            ),
            MlErr::EmptyDataset => write!(f, "Tried to train over an empty dataset"),
            MlErr::InvalidLearningRate(lr) => {
                write!(f, "The learning rate must be positive and finite, got {lr}")
            }
            MlErr::ParamGenExhausted { got, expected } => write!(
                f,
                "The parameter generator got exhausted after {got} of the expected {expected} parameters"
            ),
            MlErr::Rand(e) => write!(f, "Failed to build a random generator: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Shape(e) => Some(e),
            MlErr::Rand(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ShapeError> for MlErr {
    fn from(value: ShapeError) -> Self {
        Self::Shape(value)
    }
}

impl From<RandErr> for MlErr {
    fn from(value: RandErr) -> Self {
        Self::Rand(value)
    }
}
