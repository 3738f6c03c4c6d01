//! # Consensus Deciders
//!
//! Turn the per-structure orders observed across a taxonomic or structural group into one
//! consensus order for the whole group.
//!
//! - [`mode`] - Most frequent order, the uncorrected baseline
//! - [`kernel`] - Corrects sub-multiple bias with a confusion kernel composed over divisor steps
//! - [`matrix`] - Linear correction of the histogram by a precomputed matrix
//!
//! Deciders read a fully accumulated [`GroupOrderHistogram`] and never fail: an empty or
//! all-zero histogram yields order 1.

pub mod kernel;
pub mod matrix;
pub mod mode;

pub use kernel::{ConfusionModel, ErrorKernelDecider};
pub use matrix::{CorrectionMatrix, ErrorMatrixDecider};
pub use mode::ModeDecider;

pub trait ConsensusDecider: Send + Sync {
    fn name(&self) -> &'static str;

    fn decide(&self, histogram: &GroupOrderHistogram) -> u32;
}

/// Occurrence count of each order `1..=max_order` within one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOrderHistogram {
    max_order: u32,
    counts: Vec<u64>,
}

impl GroupOrderHistogram {
    pub fn new(max_order: u32) -> Self {
        let max_order = max_order.max(1);
        Self {
            max_order,
            counts: vec![0; max_order as usize],
        }
    }

    /// Builds a histogram from counts indexed by `order - 1`.
    pub fn from_counts(counts: Vec<u64>) -> Self {
        if counts.is_empty() {
            return Self::new(1);
        }
        Self {
            max_order: counts.len() as u32,
            counts,
        }
    }

    /// Records one observed order. Orders outside `1..=max_order` are ignored and `false` is
    /// returned.
    pub fn add(&mut self, order: u32) -> bool {
        self.add_count(order, 1)
    }

    pub fn add_count(&mut self, order: u32, count: u64) -> bool {
        if order == 0 || order > self.max_order {
            return false;
        }
        self.counts[order as usize - 1] += count;
        true
    }

    pub fn count(&self, order: u32) -> u64 {
        if order == 0 || order > self.max_order {
            0
        } else {
            self.counts[order as usize - 1]
        }
    }

    pub fn max_order(&self) -> u32 {
        self.max_order
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Counts as floats, index 0 holding order 1.
    pub fn as_vector(&self) -> Vec<f64> {
        self.counts.iter().map(|&c| c as f64).collect()
    }
}
