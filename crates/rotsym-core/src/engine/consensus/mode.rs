use super::{ConsensusDecider, GroupOrderHistogram};
use crate::engine::config::DEFAULT_MAX_ORDER;

/// Returns the most frequent order in `2..=max_order`, preferring the lowest order on ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeDecider {
    max_order: u32,
}

impl ModeDecider {
    pub fn new(max_order: u32) -> Self {
        Self { max_order }
    }
}

impl Default for ModeDecider {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ORDER)
    }
}

impl ConsensusDecider for ModeDecider {
    fn name(&self) -> &'static str {
        "mode"
    }

    fn decide(&self, histogram: &GroupOrderHistogram) -> u32 {
        let mut best_order = 1;
        let mut best_count = 0;
        for order in 2..=self.max_order {
            let count = histogram.count(order);
            if count > best_count {
                best_order = order;
                best_count = count;
            }
        }
        best_order
    }
}
