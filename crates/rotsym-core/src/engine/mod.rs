//! # Engine Module
//!
//! The decision core of rotsym: everything that turns a self-alignment into a symmetry order
//! and a population of orders into a group consensus.
//!
//! ## Architecture
//!
//! - **Detectors** ([`detectors`]) - The [`detectors::OrderDetector`] family and its catalogue
//! - **Consensus** ([`consensus`]) - Mode, error-kernel and error-matrix deciders over histograms
//! - **Axis Registry** ([`axes`]) - Symmetry axes and their per-unit composition
//! - **Configuration** ([`config`]) - Detector tunables and benchmark inputs, built with validation
//! - **Context** ([`context`]) - Read-only confusion models and taxonomy passed to workflows
//! - **Progress Monitoring** ([`progress`]) - Progress reporting callbacks
//! - **Error Handling** ([`error`]) - Engine error taxonomy
//!
//! Returning order 1 is a result meaning "checked, no symmetry". Failing to compute an order is
//! an [`error::EngineError`], never a silently substituted default.

pub mod axes;
pub mod config;
pub mod consensus;
pub mod context;
pub mod detectors;
pub mod error;
pub mod progress;
