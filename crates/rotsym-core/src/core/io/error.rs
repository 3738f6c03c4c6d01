use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid number '{value}' on line {line} of '{path}'")]
    Number {
        path: String,
        line: u64,
        value: String,
    },
    #[error("Malformed data in '{path}': {reason}")]
    Invalid { path: String, reason: String },
}
