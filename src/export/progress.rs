use std::fmt;

use serde::Serialize;
use tokio::sync::watch;

/// Aggregate export progress: which item is being processed out of how many.
///
/// Progress is reported per item, never per format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExportProgress {
    /// 1-based index of the item being processed
    pub current: usize,
    pub total: usize,
}

impl ExportProgress {
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ExportProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Processing Image {}/{}", self.current, self.total)
    }
}

/// Publishes progress on a watch channel; `None` means no export is running.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    tx: Option<watch::Sender<Option<ExportProgress>>>,
}

impl ProgressReporter {
    pub fn new(tx: watch::Sender<Option<ExportProgress>>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A reporter nobody listens to
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn begin_item(&self, current: usize, total: usize) {
        self.publish(Some(ExportProgress { current, total }));
    }

    pub fn clear(&self) {
        self.publish(None);
    }

    fn publish(&self, value: Option<ExportProgress>) {
        if let Some(tx) = &self.tx {
            tx.send_replace(value);
        }
    }
}
