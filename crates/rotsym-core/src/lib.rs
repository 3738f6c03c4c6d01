//! # rotsym Core Library
//!
//! Decides how many-fold rotationally symmetric a macromolecule is, given a self-alignment of the
//! structure against a rotated copy of itself, and composes multiple symmetry axes when a molecule
//! shows hierarchical symmetry.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`SelfAlignment`, `OrderEstimate`),
//!   geometry helpers, numerical fitting (least squares, LOESS) and file loaders.
//!
//! - **[`engine`]: The Decision Core.** The order detector family behind the `OrderDetector`
//!   trait, the consensus deciders, the symmetry axis registry, configuration and errors.
//!
//! - **[`workflows`]: The Public API.** Batch detection over a set of cases, benchmarking of
//!   detectors against ground truth and per-group consensus aggregation.
//!
//! The structural self-alignment itself is computed elsewhere; this crate consumes its result.

pub mod core;
pub mod engine;
pub mod workflows;
