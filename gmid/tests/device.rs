use common::{char_db, device};
use float_eq::assert_float_eq;
use gmid::device::{DeviceStatus, LookupMode};
use gmid::error::ErrorSource;
use gmid::store::error::StoreError;
use gmid::store::query::Query;
use gmid::store::CharStore;

mod common;

#[test]
fn test_golden_nch_10um() {
    let db = char_db();
    let params = device("nch", 20., 10e-6, 0.6).with_id(1e-6);
    let dev = params.solve(&db, LookupMode::Standard).unwrap();

    assert_eq!(dev.status(), DeviceStatus::Resolved);
    // 20 is tabulated, so the next lower entry is selected
    assert_float_eq!(dev.op().gm_id, 18., abs <= 0.);
    assert_float_eq!(dev.gm(), 18e-6, r2nd <= 1e-12);
    assert_float_eq!(dev.ro(), 1.25e7, r2nd <= 1e-12);
    assert_float_eq!(dev.ft(), 6e7, r2nd <= 1e-12);
    assert_float_eq!(dev.width(), 1e-6 / 0.6, r2nd <= 1e-12);
}

#[test]
fn test_resolution_is_deterministic() {
    let db = char_db();
    let params = device("pch", 15.5, 5e-6, 0.3).with_id(3e-6);

    let a = params.solve(&db, LookupMode::Standard).unwrap();
    let b = params.solve(&db, LookupMode::Standard).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.gm(), b.gm());
    assert_eq!(a.ro(), b.ro());
    assert_eq!(a.ft(), b.ft());
    assert_eq!(a.width(), b.width());
    assert_float_eq!(a.op().gm_id, 14., abs <= 0.);
}

#[test]
fn test_resolve_after_changing_inputs() {
    let db = char_db();
    let mut params = device("nch", 25., 1e-6, 0.5).with_id(1e-6);
    let before = params.solve(&db, LookupMode::Standard).unwrap();

    params.id = 4e-6;
    params.length = 2e-6;
    let after = params.solve(&db, LookupMode::Standard).unwrap();

    assert_float_eq!(after.gm(), 4. * before.gm(), r2nd <= 1e-12);
    assert_float_eq!(after.params().length, 2e-6, abs <= 0.);
    assert!(after.ro() != before.ro());
}

#[test]
fn test_off_grid_query_fails() {
    let db = char_db();
    let err = device("nch", 20., 3e-6, 0.6)
        .with_id(1e-6)
        .solve(&db, LookupMode::Standard)
        .unwrap_err();
    assert!(matches!(
        err.source(),
        ErrorSource::Store(StoreError::GridPointNotFound { .. })
    ));

    let err = device("nmos_lvt", 20., 1e-6, 0.6)
        .with_id(1e-6)
        .solve(&db, LookupMode::Legacy)
        .unwrap_err();
    assert!(matches!(
        err.source(),
        ErrorSource::Store(StoreError::ModelNotFound(_))
    ));
}

#[test]
fn test_store_axes() {
    let db = char_db();
    let lut = db.sweep(&Query::new("nch", 0.3, 1e-6)).unwrap();
    assert_eq!(lut.len(), common::POINTS);
    assert_eq!(lut.keys().first(), Some(&28.));
    assert_eq!(lut.keys().last(), Some(&6.));
}
