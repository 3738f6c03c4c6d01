//! File loaders for the data the detectors and deciders consume.
//!
//! - [`matrix`] - Tab-separated numeric matrices (confusion and correction matrices)
//! - [`cases`] - Benchmark case sets in TOML
//! - [`taxonomy`] - Structure-to-group index in CSV

pub mod cases;
mod error;
pub mod matrix;
pub mod taxonomy;

pub use error::ModelLoadError;
