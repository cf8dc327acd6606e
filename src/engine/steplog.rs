//! Step logging.
//!
//! Collects one record per executed (or skipped) step and prints each as
//! it arrives. The newline-joined message text feeds rule evaluation as
//! the accumulated output of the run.

use parking_lot::Mutex;

/// A log record for one step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepLog {
    /// Resource id the step belongs to
    pub resource_id: String,

    /// Step name
    pub step_name: String,

    /// Command line that ran (empty for rule-only steps)
    pub command: String,

    /// Captured output, or a status note such as `Step skipped.`
    pub message: String,

    /// Stack node the step was resolved for
    pub target: String,
}

#[derive(Debug, Default)]
struct Inner {
    entries: Vec<StepLog>,
    closed: bool,
}

/// Thread-safe, append-only log of step records.
///
/// Once closed, further `add` calls are silently dropped; a logger never
/// reopens.
#[derive(Debug, Default)]
pub struct StepLogger {
    inner: Mutex<Inner>,
}

impl StepLogger {
    /// Create an open, empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and print its formatted block. No-op when closed.
    pub fn add(&self, entry: StepLog) {
        let mut inner = self.inner.lock();
        if inner.closed {
            return;
        }
        println!("{}", format_entry(&entry));
        inner.entries.push(entry);
    }

    /// Seal the logger.
    pub fn close(&self) {
        self.inner.lock().closed = true;
    }

    /// Check whether the logger was sealed.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Snapshot of all records in insertion order.
    pub fn entries(&self) -> Vec<StepLog> {
        self.inner.lock().entries.clone()
    }

    /// The newline-joined message text of every record, in insertion
    /// order. This is the accumulated output rules match against.
    pub fn messages_string(&self) -> String {
        let inner = self.inner.lock();
        inner.entries.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join("\n")
    }
}

/// Format a record as the five-line emoji block printed on add.
pub fn format_entry(entry: &StepLog) -> String {
    [
        "\n".to_string(),
        format!("📦 Id: {}", entry.resource_id),
        format!("📛 Step: {}", entry.step_name),
        format!("📝 Command: {}", entry.command),
        format!("\n{}", entry.message),
    ]
    .join("\n")
}
