use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        GenSceneError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        GenSceneError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    let build: GenSceneError = BuildError::degenerate(LayerKind::MeshField, "faces.x is 0").into();
    assert!(build.to_string().starts_with("build error:"));
    assert!(build.to_string().contains("faces.x is 0"));

    let fetch: GenSceneError = FetchError::new("./index.css", "404").into();
    assert_eq!(
        fetch.to_string(),
        "fetch error: failed to fetch './index.css': 404"
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = GenSceneError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn only_build_and_batch_errors_are_recoverable() {
    assert!(GenSceneError::from(BuildError::Unsupported(LayerKind::Other)).is_recoverable());
    assert!(GenSceneError::from(BatchError::AlreadyRunning { step: 1 }).is_recoverable());
    assert!(!GenSceneError::from(EncodeError::Archive("x".into())).is_recoverable());
    assert!(!GenSceneError::from(FetchError::new("a", "b")).is_recoverable());
}
