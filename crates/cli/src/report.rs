//! User-facing progress lines.
//!
//! Commands narrate what they are doing through a [`Reporter`] instead
//! of printing directly, so tests can capture the narration verbatim.

use std::sync::{Arc, Mutex};

pub trait ReportSink: Send + Sync {
    fn line(&self, message: &str);
}

/// Cheap handle over a shared sink.
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn ReportSink>,
}

impl Reporter {
    pub fn new(sink: Arc<dyn ReportSink>) -> Self {
        Self { sink }
    }

    /// Reporter writing to stdout, the normal configuration.
    pub fn stdout() -> Self {
        Self::new(Arc::new(StdoutSink))
    }

    pub fn say(&self, message: impl AsRef<str>) {
        self.sink.line(message.as_ref());
    }
}

struct StdoutSink;

impl ReportSink for StdoutSink {
    fn line(&self, message: &str) {
        println!("{message}");
    }
}

/// Collects lines in memory. Test support.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ReportSink for MemorySink {
    fn line(&self, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_records_in_order() {
        let sink = Arc::new(MemorySink::default());
        let reporter = Reporter::new(sink.clone());

        reporter.say("one");
        reporter.say("two");

        assert_eq!(sink.lines(), vec!["one", "two"]);
    }
}
