//! Tests for diagnostic logs

use adaptive_vitals::core::{Diagnostic, DiagnosticLog, TracingLog};
use adaptive_vitals::infra::InMemoryDiagnostics;

#[test]
fn test_in_memory_diagnostics_count_and_clear() {
    let log = InMemoryDiagnostics::new(8);
    log.emit(Diagnostic::HighMemory {
        used_mb: 120.0,
        limit_mb: 100.0,
    });
    log.emit(Diagnostic::AnalyticsFailed("offline".into()));

    assert_eq!(log.count(|d| matches!(d, Diagnostic::HighMemory { .. })), 1);
    log.clear();
    assert!(log.diagnostics().is_empty());
}

#[test]
fn test_tracing_log_accepts_every_variant() {
    adaptive_vitals::util::init_tracing();
    let log = TracingLog;
    log.emit(Diagnostic::LoaderFailed {
        unit: 1,
        reason: "boom".into(),
    });
    log.emit(Diagnostic::OversizedBundle {
        resource: "/app.js".into(),
        transfer_bytes: 300_000,
        budget_bytes: 250_000,
    });
    log.emit(Diagnostic::InvalidValue {
        name: "x".into(),
        value: -1.0,
    });
}
