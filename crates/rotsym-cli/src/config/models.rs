use rotsym::engine::config as core_config;
use std::path::PathBuf;

pub struct AppConfig {
    pub cases_path: PathBuf,
    pub core_config: core_config::BenchmarkConfig,
}
