mod builder;
mod defaults;
mod file;
mod models;

pub use builder::{ModelOverrides, build_config};
pub use models::AppConfig;
