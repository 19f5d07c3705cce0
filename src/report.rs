//! Shared output surface.
//!
//! Query results and adjacency reports are operator-facing text, not log
//! records, so they bypass `tracing` and go to one shared sink. Every actor
//! holds a clone; writes from concurrently scheduled actors may interleave
//! and that is accepted. Tests swap the stdout sink for a capturing one.

use std::sync::Arc;

use parking_lot::Mutex;

/// Destination for operator-facing result lines.
#[derive(Debug, Clone)]
pub enum ReportSink {
    /// Production sink: one `println!` per block, no locking.
    Stdout,
    /// Test sink: collect emitted blocks for assertions.
    Capture(Arc<Mutex<Vec<String>>>),
}

impl ReportSink {
    /// New capturing sink plus the shared buffer behind it.
    pub fn capture() -> (Self, Arc<Mutex<Vec<String>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        (Self::Capture(Arc::clone(&buffer)), buffer)
    }

    /// Emit one block: a result line or a whole adjacency report.
    pub fn emit(&self, block: String) {
        match self {
            Self::Stdout => println!("{block}"),
            Self::Capture(buffer) => buffer.lock().push(block),
        }
    }
}
