use crate::core::io::ModelLoadError;
use crate::engine::consensus::{
    ConsensusDecider, ErrorKernelDecider, ErrorMatrixDecider, GroupOrderHistogram, ModeDecider,
};
use crate::engine::context::DecisionContext;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Consensus orders decided for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupConsensus {
    pub group: String,
    /// Number of structures that contributed to the histogram.
    pub structures: u64,
    pub mode: u32,
    /// Error-kernel decision, when a confusion kernel was loaded.
    pub kernel: Option<u32>,
    /// Error-matrix decision, when a correction matrix was loaded.
    pub matrix: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct HistogramRecord {
    group: String,
    order: u32,
    count: u64,
}

/// Per-group order histograms accumulated over a run.
///
/// Accumulation and decision are separate phases: [`GroupHistograms::decide`] consumes the
/// accumulator, so no histogram can still be growing while it is being decided on.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupHistograms {
    max_order: u32,
    groups: BTreeMap<String, GroupOrderHistogram>,
}

impl GroupHistograms {
    pub fn new(max_order: u32) -> Self {
        Self {
            max_order,
            groups: BTreeMap::new(),
        }
    }

    /// Records one structure's order for `group`; orders beyond `max_order` are dropped.
    pub fn add(&mut self, group: &str, order: u32) -> bool {
        self.add_count(group, order, 1)
    }

    pub fn add_count(&mut self, group: &str, order: u32, count: u64) -> bool {
        let max_order = self.max_order;
        self.groups
            .entry(group.to_string())
            .or_insert_with(|| GroupOrderHistogram::new(max_order))
            .add_count(order, count)
    }

    pub fn max_order(&self) -> u32 {
        self.max_order
    }

    /// Non-zero `(group, order, count)` entries, groups in lexical order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, u32, u64)> + '_ {
        self.groups.iter().flat_map(|(group, histogram)| {
            (1..=histogram.max_order()).filter_map(move |order| {
                let count = histogram.count(order);
                (count > 0).then_some((group.as_str(), order, count))
            })
        })
    }

    pub fn get(&self, group: &str) -> Option<&GroupOrderHistogram> {
        self.groups.get(group)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Reads `group,order,count` rows; counts for repeated group/order pairs are summed.
    pub fn load_csv(path: &Path, max_order: u32) -> Result<Self, ModelLoadError> {
        let path_str = path.to_string_lossy().to_string();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| ModelLoadError::Csv {
                path: path_str.clone(),
                source: e,
            })?;

        let mut histograms = Self::new(max_order);
        for result in reader.deserialize::<HistogramRecord>() {
            let record = result.map_err(|e| ModelLoadError::Csv {
                path: path_str.clone(),
                source: e,
            })?;
            if !histograms.add_count(&record.group, record.order, record.count) {
                warn!(
                    group = %record.group,
                    order = record.order,
                    "Ignoring histogram row with order outside 1..={}",
                    max_order
                );
            }
        }
        Ok(histograms)
    }

    /// Runs every available decider on every group.
    #[instrument(skip_all, name = "group_consensus", fields(groups = self.groups.len()))]
    pub fn decide(self, context: &DecisionContext) -> Vec<GroupConsensus> {
        let mode = ModeDecider::new(self.max_order);
        let kernel = context.kernel.as_ref().map(ErrorKernelDecider::new);
        let matrix = context.correction.as_ref().map(ErrorMatrixDecider::new);

        let decide_group = |(group, histogram): (String, GroupOrderHistogram)| {
            let consensus = GroupConsensus {
                structures: histogram.total(),
                mode: mode.decide(&histogram),
                kernel: kernel.as_ref().map(|d| d.decide(&histogram)),
                matrix: matrix.as_ref().map(|d| d.decide(&histogram)),
                group,
            };
            debug!(group = %consensus.group, mode = consensus.mode, "Group decided");
            consensus
        };

        #[cfg(feature = "parallel")]
        let decided = self.groups.into_par_iter().map(decide_group).collect();
        #[cfg(not(feature = "parallel"))]
        let decided = self.groups.into_iter().map(decide_group).collect();

        decided
    }
}
