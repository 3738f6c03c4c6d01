//! # Workflows Module
//!
//! High-level entry points that run the detectors and consensus deciders over whole sets of
//! structures.
//!
//! ## Overview
//!
//! Workflows load nothing themselves: callers hand in the parsed cases, a validated
//! configuration and a [`DecisionContext`](crate::engine::context::DecisionContext) with the
//! optional error models. Each workflow reports progress through a
//! [`ProgressReporter`](crate::engine::progress::ProgressReporter) and logs, rather than aborts
//! on, per-structure detector failures.
//!
//! ## Architecture
//!
//! - **Detection** ([`detect`]) - Runs a panel of detectors over a list of structures.
//! - **Benchmark** ([`benchmark`]) - Detection plus accuracy scoring against expected orders,
//!   confusion tallies and per-group consensus.
//! - **Consensus** ([`consensus`]) - Accumulates per-group order histograms and applies the
//!   mode, error-kernel and error-matrix deciders once accumulation has finished.

pub mod benchmark;
pub mod consensus;
pub mod detect;
