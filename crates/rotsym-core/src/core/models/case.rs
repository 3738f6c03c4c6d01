use super::alignment::{ResidueMapping, SelfAlignment};

/// One structure submitted to the benchmark harness.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkCase {
    pub id: String,
    /// Taxonomic or structural group the structure belongs to, if known.
    pub group: Option<String>,
    /// Ground-truth order, if known.
    pub expected_order: Option<u32>,
    pub alignment: SelfAlignment,
    /// Further self-alignments recorded from the aligner, replayed by the iterative detector.
    pub alternatives: Vec<ResidueMapping>,
}

impl BenchmarkCase {
    pub fn new(id: impl Into<String>, alignment: SelfAlignment) -> Self {
        Self {
            id: id.into(),
            group: None,
            expected_order: None,
            alignment,
            alternatives: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_expected_order(mut self, order: u32) -> Self {
        self.expected_order = Some(order);
        self
    }

    pub fn with_alternatives(mut self, alternatives: Vec<ResidueMapping>) -> Self {
        self.alternatives = alternatives;
        self
    }
}
