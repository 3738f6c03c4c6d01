use rotsym::engine::detectors::DetectorKind;
use thiserror::Error;

/// Selects every detector.
pub const ALL_DETECTORS: &str = "all";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown detector '{0}'. Known detectors: {known}", known = known_detectors())]
    UnknownDetector(String),

    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidSetValue(String),
}

fn known_detectors() -> String {
    DetectorKind::ALL
        .iter()
        .map(DetectorKind::name)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn parse_detector(name: &str) -> Result<DetectorKind, ParseError> {
    name.parse()
        .map_err(|_| ParseError::UnknownDetector(name.trim().to_string()))
}

/// Parses detector names, each entry possibly a comma separated list. `all` expands to every
/// detector; duplicates keep their first position.
pub fn parse_detectors<S: AsRef<str>>(names: &[S]) -> Result<Vec<DetectorKind>, ParseError> {
    let mut kinds = Vec::new();
    let tokens = names
        .iter()
        .flat_map(|entry| entry.as_ref().split(','))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    for token in tokens {
        let selected = if token.eq_ignore_ascii_case(ALL_DETECTORS) {
            DetectorKind::ALL.to_vec()
        } else {
            vec![parse_detector(token)?]
        };
        for kind in selected {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
    }
    Ok(kinds)
}

/// Splits a `KEY=VALUE` override at the first `=`.
pub fn parse_set_value(kv_pair: &str) -> Result<(&str, &str), ParseError> {
    match kv_pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(ParseError::InvalidSetValue(kv_pair.to_string())),
    }
}
