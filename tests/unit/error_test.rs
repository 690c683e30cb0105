//! Tests for error types

use adaptive_vitals::core::{EngineError, ObservationKind};

#[test]
fn test_unsupported_capability_error() {
    let err = EngineError::UnsupportedCapability(ObservationKind::LayoutShift);
    assert_eq!(format!("{}", err), "unsupported capability: LayoutShift");
}

#[test]
fn test_loader_failed_error() {
    let err = EngineError::LoaderFailed {
        unit: 7,
        reason: "chunk 404".to_string(),
    };
    assert_eq!(format!("{}", err), "unit 7 failed to load: chunk 404");
}

#[test]
fn test_region_disposed_error() {
    let err = EngineError::RegionDisposed(3);
    assert_eq!(
        format!("{}", err),
        "region disposed before unit 3 started loading"
    );
}

#[test]
fn test_config_error() {
    let err = EngineError::Config("sample_rate must be within [0, 1], got 2".to_string());
    assert_eq!(
        format!("{}", err),
        "config error: sample_rate must be within [0, 1], got 2"
    );
}

#[test]
fn test_unknown_unit_error() {
    assert_eq!(
        format!("{}", EngineError::UnknownUnit(42)),
        "unknown unit 42"
    );
}
