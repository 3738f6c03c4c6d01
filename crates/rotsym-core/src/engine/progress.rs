use super::detectors::DetectorKind;

/// Events emitted while a batch of structures moves through detection, scoring and consensus.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    /// One step per structure.
    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    /// A detector could not produce an order for one structure; the run goes on without it.
    StructureSkipped {
        case_id: String,
        detector: DetectorKind,
    },
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Optional sink for progress events. Shared by reference across the worker threads of a run.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Runs `work` between a `PhaseStart` and a `PhaseFinish` event.
    pub fn phase<R>(&self, name: &'static str, work: impl FnOnce() -> R) -> R {
        self.report(Progress::PhaseStart { name });
        let result = work();
        self.report(Progress::PhaseFinish);
        result
    }
}
