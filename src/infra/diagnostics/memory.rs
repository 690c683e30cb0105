//! In-memory diagnostic log.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::core::{Diagnostic, DiagnosticLog};

/// Bounded diagnostic buffer for testing and dev tooling.
pub struct InMemoryDiagnostics {
    diagnostics: Mutex<VecDeque<Diagnostic>>,
    max_diagnostics: usize,
}

impl InMemoryDiagnostics {
    /// Create a buffer holding at most `max_diagnostics` entries.
    pub fn new(max_diagnostics: usize) -> Self {
        Self {
            diagnostics: Mutex::new(VecDeque::with_capacity(max_diagnostics.min(1024))),
            max_diagnostics,
        }
    }

    /// Snapshot of buffered diagnostics, oldest first.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().iter().cloned().collect()
    }

    /// Count diagnostics matching `pred`.
    pub fn count(&self, pred: impl Fn(&Diagnostic) -> bool) -> usize {
        self.diagnostics.lock().iter().filter(|d| pred(d)).count()
    }

    /// Drop everything buffered so far.
    pub fn clear(&self) {
        self.diagnostics.lock().clear();
    }
}

impl DiagnosticLog for InMemoryDiagnostics {
    fn emit(&self, diagnostic: Diagnostic) {
        let mut buf = self.diagnostics.lock();
        if buf.len() >= self.max_diagnostics {
            buf.pop_front();
        }
        buf.push_back(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_evicts_oldest() {
        let log = InMemoryDiagnostics::new(2);
        log.emit(Diagnostic::AnalyticsFailed("1".into()));
        log.emit(Diagnostic::AnalyticsFailed("2".into()));
        log.emit(Diagnostic::AnalyticsFailed("3".into()));

        let buf = log.diagnostics();
        assert_eq!(buf.len(), 2);
        assert_eq!(buf[0], Diagnostic::AnalyticsFailed("2".into()));
        assert_eq!(
            log.count(|d| matches!(d, Diagnostic::AnalyticsFailed(_))),
            2
        );
    }
}
