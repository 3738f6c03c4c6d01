//! # Core Models Module
//!
//! Data structures exchanged between the external alignment engine, the detectors and the
//! reporting layers.
//!
//! - [`alignment`] - The read-only self-alignment and its derived rotation geometry
//! - [`order`] - Order estimates and symmetry-group labels
//! - [`case`] - Benchmark cases pairing an alignment with its ground truth

pub mod alignment;
pub mod case;
pub mod order;
