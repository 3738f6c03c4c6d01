use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileDetectionConfig};
use super::models::AppConfig;
use crate::cli::DetectionOptions;
use crate::error::{CliError, Result};
use crate::utils::parser;
use rotsym::engine::config as core_config;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Benchmark-only settings given on the command line.
#[derive(Debug, Default, Clone)]
pub struct ModelOverrides {
    pub kernel: Option<PathBuf>,
    pub correction: Option<PathBuf>,
    pub taxonomy: Option<PathBuf>,
    pub consensus_detector: Option<String>,
}

/// Merges built-in defaults, the config file, `-S` settings and command-line flags, in
/// increasing order of precedence.
pub fn build_config(
    cases_path: &Path,
    options: &DetectionOptions,
    overrides: &ModelOverrides,
) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = match &options.config {
        Some(config_path) => FileConfig::from_file(config_path)?,
        None => FileConfig::default(),
    };
    let mut file_config = apply_set_values(file_config, &options.set_values)?;

    let detection_file = file_config.detection.take().unwrap_or_default();
    let benchmark_file = file_config.benchmark.take().unwrap_or_default();
    let models_file = file_config.models.take().unwrap_or_default();

    let detectors = if !options.detectors.is_empty() {
        parser::parse_detectors(&options.detectors)
    } else if let Some(names) = &benchmark_file.detectors {
        parser::parse_detectors(names)
    } else {
        Ok(defaults.detectors.clone())
    }
    .map_err(|e| CliError::Argument(e.to_string()))?;

    let consensus_detector = match overrides
        .consensus_detector
        .as_deref()
        .or(benchmark_file.consensus_detector.as_deref())
    {
        Some(name) => {
            parser::parse_detector(name).map_err(|e| CliError::Argument(e.to_string()))?
        }
        None => defaults.consensus_detector,
    };

    let detector_config = merge_detection(detection_file, options.max_order)?;

    let mut builder = core_config::BenchmarkConfigBuilder::new()
        .detectors(detectors)
        .consensus_detector(consensus_detector)
        .detector_config(detector_config);
    if let Some(path) = overrides.kernel.clone().or(models_file.kernel) {
        builder = builder.kernel_path(path);
    }
    if let Some(path) = overrides.correction.clone().or(models_file.correction) {
        builder = builder.correction_path(path);
    }
    if let Some(path) = overrides.taxonomy.clone().or(models_file.taxonomy) {
        builder = builder.taxonomy_path(path);
    }

    let core_config = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        cases_path: cases_path.to_path_buf(),
        core_config,
    })
}

fn merge_detection(
    file: FileDetectionConfig,
    cli_max_order: Option<u32>,
) -> Result<core_config::DetectorConfig> {
    let mut builder = core_config::DetectorConfigBuilder::new();
    if let Some(order) = cli_max_order.or(file.max_order) {
        builder = builder.max_order(order);
    }
    if let Some(degrees) = file.angle_threshold_degrees {
        builder = builder.angle_threshold_degrees(degrees);
    }
    if let Some(fraction) = file.normalized_angle_threshold {
        builder = builder.normalized_angle_threshold(fraction);
    }
    if let Some(change) = file.min_metric_change {
        builder = builder.min_metric_change(change);
    }
    if let Some(step) = file.angle_step_degrees {
        builder = builder.angle_step_degrees(step);
    }
    if let Some(d0) = file.similarity_d0 {
        builder = builder.similarity_d0(d0);
    }
    if let Some(bandwidth) = file.loess_bandwidth {
        builder = builder.loess_bandwidth(bandwidth);
    }
    if let Some(iterations) = file.loess_robustness_iterations {
        builder = builder.loess_robustness_iterations(iterations);
    }
    builder.build().map_err(|e| CliError::Config(e.to_string()))
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let (key, value) =
            parser::parse_set_value(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

        if let Some(field) = key.strip_prefix("detection.") {
            let detection = config.detection.get_or_insert_with(Default::default);
            match field {
                "max-order" => detection.max_order = Some(parse_value(key, value, "integer")?),
                "angle-threshold-degrees" => {
                    detection.angle_threshold_degrees = Some(parse_value(key, value, "float")?)
                }
                "normalized-angle-threshold" => {
                    detection.normalized_angle_threshold = Some(parse_value(key, value, "float")?)
                }
                "min-metric-change" => {
                    detection.min_metric_change = Some(parse_value(key, value, "float")?)
                }
                "angle-step-degrees" => {
                    detection.angle_step_degrees = Some(parse_value(key, value, "float")?)
                }
                "similarity-d0" => {
                    detection.similarity_d0 = Some(parse_value(key, value, "float")?)
                }
                "loess-bandwidth" => {
                    detection.loess_bandwidth = Some(parse_value(key, value, "float")?)
                }
                "loess-robustness-iterations" => {
                    detection.loess_robustness_iterations =
                        Some(parse_value(key, value, "integer")?)
                }
                _ => return Err(unsupported_key(key)),
            }
            continue;
        }

        match key {
            "benchmark.detectors" => {
                config
                    .benchmark
                    .get_or_insert_with(Default::default)
                    .detectors = Some(vec![value.to_string()]);
            }
            "benchmark.consensus-detector" => {
                config
                    .benchmark
                    .get_or_insert_with(Default::default)
                    .consensus_detector = Some(value.to_string());
            }
            "models.kernel" => {
                config.models.get_or_insert_with(Default::default).kernel = Some(value.into());
            }
            "models.correction" => {
                config.models.get_or_insert_with(Default::default).correction =
                    Some(value.into());
            }
            "models.taxonomy" => {
                config.models.get_or_insert_with(Default::default).taxonomy = Some(value.into());
            }
            _ => return Err(unsupported_key(key)),
        }
    }
    Ok(config)
}

fn unsupported_key(key: &str) -> CliError {
    CliError::Config(format!("Unsupported configuration key for --set: '{}'", key))
}
