//! Backend of the mystery solver: a fixed feed-forward classifier trained on request, whose
//! weights can be inspected while it learns.

pub mod classifier;
pub mod config;
pub mod data;
pub mod error;
pub mod http;
pub mod service;
pub mod snapshot;
pub mod state;

pub use config::Config;
pub use error::{ConfigErr, DataErr, Result, ServiceErr};
pub use service::ModelService;
