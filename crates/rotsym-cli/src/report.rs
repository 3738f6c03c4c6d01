use crate::error::Result;
use rotsym::workflows::benchmark::DetectorScore;
use rotsym::workflows::consensus::{GroupConsensus, GroupHistograms};
use rotsym::workflows::detect::Prediction;
use serde::Serialize;
use std::io;
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct PredictionRow<'a> {
    pub id: &'a str,
    pub detector: &'static str,
    pub order: u32,
    pub label: String,
    pub expected: Option<u32>,
    pub correct: Option<bool>,
    pub group: Option<&'a str>,
}

impl<'a> From<&'a Prediction> for PredictionRow<'a> {
    fn from(p: &'a Prediction) -> Self {
        Self {
            id: &p.case_id,
            detector: p.detector.name(),
            order: p.order(),
            label: p.estimate.label().to_string(),
            expected: p.expected,
            correct: p.is_correct(),
            group: p.group.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryRow {
    pub detector: &'static str,
    pub predictions: usize,
    pub evaluated: usize,
    pub correct: usize,
    pub failures: usize,
    pub accuracy: Option<f64>,
}

impl From<&DetectorScore> for SummaryRow {
    fn from(s: &DetectorScore) -> Self {
        Self {
            detector: s.detector.name(),
            predictions: s.predictions,
            evaluated: s.evaluated,
            correct: s.correct,
            failures: s.failures,
            accuracy: s.accuracy(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConsensusRow<'a> {
    pub group: &'a str,
    pub structures: u64,
    pub mode: u32,
    pub kernel: Option<u32>,
    pub matrix: Option<u32>,
}

impl<'a> From<&'a GroupConsensus> for ConsensusRow<'a> {
    fn from(c: &'a GroupConsensus) -> Self {
        Self {
            group: &c.group,
            structures: c.structures,
            mode: c.mode,
            kernel: c.kernel,
            matrix: c.matrix,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistogramRow<'a> {
    pub group: &'a str,
    pub order: u32,
    pub count: u64,
}

pub fn histogram_rows(histograms: &GroupHistograms) -> Vec<HistogramRow<'_>> {
    histograms
        .rows()
        .map(|(group, order, count)| HistogramRow {
            group,
            order,
            count,
        })
        .collect()
}

fn write_rows<W: io::Write, T: Serialize>(writer: W, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `rows` as CSV with a header line to `path`, or to stdout when `path` is `None`.
pub fn write_csv<T: Serialize>(path: Option<&Path>, rows: impl IntoIterator<Item = T>) -> Result<()> {
    match path {
        Some(path) => {
            write_rows(std::fs::File::create(path)?, rows)?;
            info!("Wrote {}", path.display());
        }
        None => write_rows(io::stdout().lock(), rows)?,
    }
    Ok(())
}
