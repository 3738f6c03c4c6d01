//! # Core Module
//!
//! Stateless building blocks shared by every detector and decider.
//!
//! - **Data Models** ([`models`]) - Self-alignments, rotation geometry, order estimates and
//!   benchmark cases
//! - **Geometry** ([`utils`]) - Rotations about arbitrary axes and structural similarity
//! - **Fitting** ([`fitting`]) - Linear least squares and LOESS smoothing
//! - **File I/O** ([`io`]) - Confusion matrices, benchmark case sets and taxonomy indices

pub mod fitting;
pub mod io;
pub mod models;
pub mod utils;
