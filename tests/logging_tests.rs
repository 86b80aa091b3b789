use ygg_updater::setup_logging;

#[test]
fn test_logging_setup() {
    // setup_logging must tolerate being called after a subscriber is installed
    let result = std::panic::catch_unwind(|| {
        setup_logging();
        setup_logging();
    });

    assert!(result.is_ok(), "setup_logging function should not panic");
}
