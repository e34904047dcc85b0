use std::{error::Error, fmt, io};

use machine_learning::MlErr;

/// The service's result type.
pub type Result<T> = std::result::Result<T, ServiceErr>;

/// Failures of the operations that touch the training state.
#[derive(Debug)]
pub enum ServiceErr {
    /// There's no dataset to train with.
    DataUnavailable,
    /// A request argument was out of its domain, nothing was mutated.
    InvalidParameter {
        name: &'static str,
        reason: String,
    },
    Ml(MlErr),
}

impl fmt::Display for ServiceErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceErr::DataUnavailable => write!(f, "Data not loaded"),
            ServiceErr::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter {name}: {reason}")
            }
            ServiceErr::Ml(e) => write!(f, "training failed: {e}"),
        }
    }
}

impl Error for ServiceErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ServiceErr::Ml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlErr> for ServiceErr {
    fn from(value: MlErr) -> Self {
        Self::Ml(value)
    }
}

/// Failures while loading the dataset.
#[derive(Debug)]
pub enum DataErr {
    Io(io::Error),
    Csv(csv::Error),
    /// A row doesn't have one id, every feature and one label.
    ShapeMismatch {
        row: usize,
        got: usize,
        expected: usize,
    },
    InvalidValue {
        row: usize,
        column: usize,
        value: String,
    },
    InvalidLabel {
        row: usize,
        value: String,
    },
    Empty,
    Dataset(MlErr),
}

impl fmt::Display for DataErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataErr::Io(e) => write!(f, "io error: {e}"),
            DataErr::Csv(e) => write!(f, "csv error: {e}"),
            DataErr::ShapeMismatch { row, got, expected } => {
                write!(f, "row {row}: expected {expected} columns, got {got}")
            }
            DataErr::InvalidValue { row, column, value } => {
                write!(f, "row {row}, column {column}: cannot parse '{value}' as a number")
            }
            DataErr::InvalidLabel { row, value } => {
                write!(f, "row {row}: '{value}' is not a valid class label")
            }
            DataErr::Empty => write!(f, "the dataset has no rows"),
            DataErr::Dataset(e) => write!(f, "invalid dataset: {e}"),
        }
    }
}

impl Error for DataErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DataErr::Io(e) => Some(e),
            DataErr::Csv(e) => Some(e),
            DataErr::Dataset(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DataErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for DataErr {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<MlErr> for DataErr {
    fn from(value: MlErr) -> Self {
        Self::Dataset(value)
    }
}

/// Failures while reading the configuration.
#[derive(Debug)]
pub enum ConfigErr {
    InvalidVar { name: &'static str, value: String },
}

impl fmt::Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErr::InvalidVar { name, value } => {
                write!(f, "invalid value for {name}: '{value}'")
            }
        }
    }
}

impl Error for ConfigErr {}
