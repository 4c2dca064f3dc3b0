//! Library exports for the preparer CLI, benchmarks and tests.
/// Application directory resolution.
pub mod app_dirs;
/// Preparation settings.
pub mod config;
/// Folder scanning, preprocessing, splitting and seed sampling.
pub mod dataset;
/// `.npy` export of prepared arrays.
pub mod export;
/// Tracing subscriber setup.
pub mod logging;
/// End-to-end dataset preparation.
pub mod prepare;

pub use config::PrepConfig;
pub use prepare::{ActiveLearningData, PrepareError, PreparedArrays};
