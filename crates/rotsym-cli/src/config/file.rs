use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileDetectionConfig {
    pub max_order: Option<u32>,
    pub angle_threshold_degrees: Option<f64>,
    pub normalized_angle_threshold: Option<f64>,
    pub min_metric_change: Option<f64>,
    pub angle_step_degrees: Option<f64>,
    pub similarity_d0: Option<f64>,
    pub loess_bandwidth: Option<f64>,
    pub loess_robustness_iterations: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileBenchmarkConfig {
    pub detectors: Option<Vec<String>>,
    pub consensus_detector: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileModelsConfig {
    pub kernel: Option<PathBuf>,
    pub correction: Option<PathBuf>,
    pub taxonomy: Option<PathBuf>,
}

/// Contents of a `rotsym` TOML configuration file; every section and key is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub detection: Option<FileDetectionConfig>,
    pub benchmark: Option<FileBenchmarkConfig>,
    pub models: Option<FileModelsConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        if let Some(base) = path.parent() {
            config.resolve_relative_paths(base);
        }
        Ok(config)
    }

    /// Model paths in a config file are relative to the file itself.
    fn resolve_relative_paths(&mut self, base: &Path) {
        let Some(models) = self.models.as_mut() else {
            return;
        };
        for path in [
            &mut models.kernel,
            &mut models.correction,
            &mut models.taxonomy,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn from_file_reads_every_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rotsym.toml");
        fs::write(
            &path,
            r#"
            [detection]
            max-order = 12
            loess-bandwidth = 0.2

            [benchmark]
            detectors = ["cycle", "angle"]
            consensus-detector = "angle"

            [models]
            kernel = "kernel.tsv"
            taxonomy = "/data/taxonomy.csv"
            "#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();

        let detection = config.detection.unwrap();
        assert_eq!(detection.max_order, Some(12));
        assert_eq!(detection.loess_bandwidth, Some(0.2));
        assert_eq!(detection.min_metric_change, None);
        let benchmark = config.benchmark.unwrap();
        assert_eq!(benchmark.consensus_detector.as_deref(), Some("angle"));
        let models = config.models.unwrap();
        assert_eq!(models.kernel, Some(dir.path().join("kernel.tsv")));
        assert_eq!(models.taxonomy, Some(PathBuf::from("/data/taxonomy.csv")));
    }

    #[test]
    fn from_file_rejects_unknown_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rotsym.toml");
        fs::write(&path, "[detection]\nmax-orders = 12\n").unwrap();

        assert!(matches!(
            FileConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn from_file_reports_missing_file_as_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            FileConfig::from_file(&dir.path().join("absent.toml")),
            Err(CliError::Io(_))
        ));
    }
}
