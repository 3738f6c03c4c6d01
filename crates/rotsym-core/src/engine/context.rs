use super::config::BenchmarkConfig;
use super::consensus::{ConfusionModel, CorrectionMatrix};
use super::error::EngineError;
use crate::core::io::taxonomy::TaxonomyIndex;
use tracing::info;

/// Read-only models consulted when turning observations into group decisions.
///
/// Loaded once and passed explicitly to the workflows that need it.
#[derive(Debug, Clone, Default)]
pub struct DecisionContext {
    pub kernel: Option<ConfusionModel>,
    pub correction: Option<CorrectionMatrix>,
    pub taxonomy: TaxonomyIndex,
}

impl DecisionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kernel(mut self, kernel: ConfusionModel) -> Self {
        self.kernel = Some(kernel);
        self
    }

    pub fn with_correction(mut self, correction: CorrectionMatrix) -> Self {
        self.correction = Some(correction);
        self
    }

    pub fn with_taxonomy(mut self, taxonomy: TaxonomyIndex) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    /// Loads every model file named in `config`.
    pub fn load(config: &BenchmarkConfig) -> Result<Self, EngineError> {
        let mut context = Self::new();
        if let Some(path) = &config.kernel_path {
            let kernel = ConfusionModel::load(path)?;
            info!(path = %path.display(), max_order = kernel.max_order(), "Loaded confusion kernel");
            context.kernel = Some(kernel);
        }
        if let Some(path) = &config.correction_path {
            let correction = CorrectionMatrix::load(path)?;
            info!(path = %path.display(), "Loaded correction matrix");
            context.correction = Some(correction);
        }
        if let Some(path) = &config.taxonomy_path {
            context.taxonomy = TaxonomyIndex::load(path)?;
            info!(path = %path.display(), entries = context.taxonomy.len(), "Loaded taxonomy index");
        }
        Ok(context)
    }

    /// Group of a structure: the taxonomy entry if present, otherwise `fallback`.
    pub fn group_of<'a>(&'a self, id: &str, fallback: Option<&'a str>) -> Option<&'a str> {
        self.taxonomy.group_of(id).or(fallback)
    }
}
