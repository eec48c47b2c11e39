use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        BridgeError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(BridgeError::device("x").to_string().contains("device error:"));
    assert!(BridgeError::camera("x").to_string().contains("camera error:"));
    assert!(BridgeError::engine("x").to_string().contains("engine error:"));
    assert!(
        BridgeError::allocation("x")
            .to_string()
            .contains("allocation error:")
    );
    assert!(
        BridgeError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = BridgeError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn only_device_and_camera_are_setup_failures() {
    assert!(BridgeError::device("no gpu").is_setup_failure());
    assert!(BridgeError::camera("no camera").is_setup_failure());
    assert!(!BridgeError::engine("crash").is_setup_failure());
    assert!(!BridgeError::validation("bad").is_setup_failure());
}
