use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Prefix used for cyclic symmetry group labels.
pub const CYCLIC_PREFIX: char = 'C';

/// Diagnostic values a detector attaches to its estimate.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Diagnostics {
    #[default]
    None,
    /// Running metric per cycle length, starting at one application of the mapping.
    CycleMetrics(Vec<f64>),
    /// Deviation of the measured angle from the chosen order's ideal angle.
    AngleDeviation(f64),
    /// Fitted coefficient per candidate order, starting at order 1.
    Coefficients(Vec<f64>),
    /// Residual sum of squares per candidate order, starting at order 1.
    FitErrors(Vec<f64>),
    PeakCount(usize),
    Realignments(usize),
}

/// Integer rotational symmetry order produced by one detector invocation.
///
/// An order of 1 is a result, not a failure: the structure was checked and no rotational
/// symmetry was found.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEstimate {
    order: u32,
    pub diagnostics: Diagnostics,
}

impl OrderEstimate {
    pub fn new(order: u32) -> Self {
        Self {
            order: order.max(1),
            diagnostics: Diagnostics::None,
        }
    }

    pub fn no_symmetry() -> Self {
        Self::new(1)
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    #[inline]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[inline]
    pub fn is_symmetric(&self) -> bool {
        self.order > 1
    }

    pub fn label(&self) -> SymmetryLabel {
        SymmetryLabel::cyclic(self.order)
    }
}

/// Symmetry-group label such as `C4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymmetryLabel {
    order: u32,
}

impl SymmetryLabel {
    pub fn cyclic(order: u32) -> Self {
        Self {
            order: order.max(1),
        }
    }

    pub fn order(&self) -> u32 {
        self.order
    }
}

impl fmt::Display for SymmetryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CYCLIC_PREFIX, self.order)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LabelParseError {
    #[error("Symmetry label '{0}' must start with 'C'")]
    MissingPrefix(String),
    #[error("Symmetry label '{0}' does not carry a positive integer order")]
    InvalidOrder(String),
}

impl FromStr for SymmetryLabel {
    type Err = LabelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix(CYCLIC_PREFIX)
            .or_else(|| trimmed.strip_prefix(CYCLIC_PREFIX.to_ascii_lowercase()))
            .ok_or_else(|| LabelParseError::MissingPrefix(s.to_string()))?;
        match digits.parse::<u32>() {
            Ok(order) if order >= 1 => Ok(Self::cyclic(order)),
            _ => Err(LabelParseError::InvalidOrder(s.to_string())),
        }
    }
}
