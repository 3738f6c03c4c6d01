use rotsym::engine::detectors::DetectorKind;

/// Selections used when neither the command line nor the config file names them.
///
/// Numeric detector settings fall back to the library's own defaults.
pub struct DefaultsConfig {
    pub detectors: Vec<DetectorKind>,
    pub consensus_detector: DetectorKind,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            detectors: DetectorKind::ALL.to_vec(),
            consensus_detector: DetectorKind::Cycle,
        }
    }
}
