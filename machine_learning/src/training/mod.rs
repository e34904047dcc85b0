mod metrics;
mod model_trainer;

pub use metrics::StepMetrics;
pub use model_trainer::ModelTrainer;
