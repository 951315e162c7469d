use super::*;

#[test]
fn default_timings() {
    let opts = SessionOpts::default();
    assert_eq!(opts.debounce_ms, 300);
    assert_eq!(opts.batch_pause_ms, 1000);
    assert_eq!(opts.frame_interval_ms, 16);
    assert_eq!(opts.fuzz_policy, FuzzPolicy::PreferCached);
    opts.validate().unwrap();
}

#[test]
fn partial_json_keeps_defaults() {
    let opts = SessionOpts::from_reader(
        br#"{"seed": 42, "fuzzPolicy": "alwaysRebuild", "bundle": {"secondaryAsset": "logo"}}"#
            .as_slice(),
    )
    .unwrap();
    assert_eq!(opts.seed, 42);
    assert_eq!(opts.fuzz_policy, FuzzPolicy::AlwaysRebuild);
    assert_eq!(opts.bundle.secondary_asset, "logo");
    assert_eq!(opts.bundle.asset_ext, "svg");
    assert_eq!(opts.debounce_ms, 300);
    assert_eq!(opts.viewport, Size::new(1280, 720));
}

#[test]
fn rejects_zero_frame_interval_and_bad_json() {
    let err = SessionOpts::from_reader(br#"{"frameIntervalMs": 0}"#.as_slice()).unwrap_err();
    assert!(err.to_string().contains("frameIntervalMs"));
    assert!(SessionOpts::from_reader(b"[1, 2]".as_slice()).is_err());
}

#[test]
fn from_path_reports_missing_file() {
    let err = SessionOpts::from_path("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, GenSceneError::Validation(_)));
}
