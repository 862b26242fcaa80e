use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Urgent,
    Info,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    Silent,
    Urgent,
    #[default]
    All,
}

impl Verbosity {
    fn admits(self, severity: Severity) -> bool {
        match (self, severity) {
            (Verbosity::Silent, _) => false,
            (Verbosity::Urgent, Severity::Urgent) => true,
            (Verbosity::Urgent, Severity::Info) => false,
            (Verbosity::All, _) => true,
        }
    }
}

/// Destination for the non-fatal conditions the scene layer reports instead of failing.
pub trait DiagnosticSink {
    fn emit(&self, severity: Severity, event: &'static str, detail: &str);
}

/// Forwards diagnostics to `tracing`: urgent as `warn`, informational as `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, severity: Severity, event: &'static str, detail: &str) {
        match severity {
            Severity::Urgent => warn!(event, detail, "diagnostic"),
            Severity::Info => info!(event, detail, "diagnostic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedDiagnostic {
    pub severity: Severity,
    pub event: &'static str,
    pub detail: String,
}

/// Keeps every admitted diagnostic in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: RefCell<Vec<CapturedDiagnostic>>,
}

impl MemorySink {
    pub fn entries(&self) -> Vec<CapturedDiagnostic> {
        self.entries.borrow().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| entry.event == event)
            .count()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, severity: Severity, event: &'static str, detail: &str) {
        self.entries.borrow_mut().push(CapturedDiagnostic {
            severity,
            event,
            detail: detail.to_string(),
        });
    }
}

/// Cheap-to-clone handle pairing a sink with the configured verbosity.
#[derive(Clone)]
pub struct Diagnostics {
    sink: Rc<dyn DiagnosticSink>,
    verbosity: Verbosity,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(Rc::new(TracingSink), Verbosity::default())
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("verbosity", &self.verbosity)
            .finish_non_exhaustive()
    }
}

impl Diagnostics {
    pub fn new(sink: Rc<dyn DiagnosticSink>, verbosity: Verbosity) -> Self {
        Self { sink, verbosity }
    }

    pub fn silent() -> Self {
        Self::new(Rc::new(TracingSink), Verbosity::Silent)
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: Verbosity) {
        self.verbosity = verbosity;
    }

    pub fn urgent(&self, event: &'static str, detail: impl fmt::Display) {
        self.emit(Severity::Urgent, event, detail);
    }

    pub fn info(&self, event: &'static str, detail: impl fmt::Display) {
        self.emit(Severity::Info, event, detail);
    }

    fn emit(&self, severity: Severity, event: &'static str, detail: impl fmt::Display) {
        if !self.verbosity.admits(severity) {
            return;
        }
        self.sink.emit(severity, event, &detail.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(verbosity: Verbosity) -> (Rc<MemorySink>, Diagnostics) {
        let sink = Rc::new(MemorySink::default());
        let diagnostics = Diagnostics::new(sink.clone(), verbosity);
        (sink, diagnostics)
    }

    #[test]
    fn all_verbosity_keeps_both_severities() {
        let (sink, diagnostics) = capture(Verbosity::All);
        diagnostics.urgent("a", "first");
        diagnostics.info("b", 2);

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].severity, Severity::Urgent);
        assert_eq!(entries[1].detail, "2");
    }

    #[test]
    fn urgent_verbosity_drops_info() {
        let (sink, diagnostics) = capture(Verbosity::Urgent);
        diagnostics.info("chatty", "ignored");
        diagnostics.urgent("broken", "kept");
        assert_eq!(sink.count("chatty"), 0);
        assert_eq!(sink.count("broken"), 1);
    }

    #[test]
    fn silent_verbosity_drops_everything() {
        let (sink, diagnostics) = capture(Verbosity::Silent);
        diagnostics.urgent("broken", "ignored");
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn verbosity_parses_from_snake_case() {
        let parsed: Verbosity = serde_json::from_str("\"urgent\"").expect("parse");
        assert_eq!(parsed, Verbosity::Urgent);
    }
}
