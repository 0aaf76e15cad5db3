use crate::error::Result;

/// Receives progress while an archive tool runs.
///
/// Calls happen synchronously on the thread that consumes the tool's output,
/// one line at a time. An error returned from either method aborts the run.
pub trait ProgressSink {
    /// Called once before the run with an estimate of the number of items.
    fn set_total(&mut self, total: u64) -> Result<()>;

    /// Called for each processed item, `index` counting up from zero.
    fn update(&mut self, index: u64, label: &str) -> Result<()>;
}

/// One recorded `update` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub index: u64,
    pub total: Option<u64>,
    pub label: String,
}

/// Keeps every event in memory. Handy for scripting and for tests.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    total: Option<u64>,
    events: Vec<ProgressEvent>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn events(&self) -> &[ProgressEvent] {
        &self.events
    }
}

impl ProgressSink for RecordingProgress {
    fn set_total(&mut self, total: u64) -> Result<()> {
        self.total = Some(total);
        Ok(())
    }

    fn update(&mut self, index: u64, label: &str) -> Result<()> {
        self.events.push(ProgressEvent {
            index,
            total: self.total,
            label: label.to_string(),
        });
        Ok(())
    }
}
