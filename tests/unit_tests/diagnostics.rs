use fenris_scatter::diagnostics::{log_device_capabilities, report_async_error, report_async_errors, DeviceInfo};
use fenris_scatter::error::ScatterIndexError;
use std::error::Error;

#[derive(Debug, thiserror::Error)]
#[error("kernel launch failed")]
struct KernelLaunchError {
    #[source]
    source: std::io::Error,
}

#[test]
fn device_capabilities_serialize() {
    let device = DeviceInfo {
        name: "Test GPU".to_string(),
        max_compute_units: 64,
        driver_version: "1.2.3".to_string(),
    };
    log_device_capabilities(&device);

    let json = serde_json::to_string(&device).unwrap();
    let deserialized: DeviceInfo = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, device);
}

#[test]
fn async_errors_are_reported_without_propagating() {
    let launch_error = KernelLaunchError {
        source: std::io::Error::new(std::io::ErrorKind::Other, "device lost"),
    };
    report_async_error(&launch_error);

    let errors: Vec<Box<dyn Error>> = vec![
        Box::new(launch_error),
        Box::new(ScatterIndexError::EmptyInput),
    ];
    let reported = report_async_errors(errors.iter().map(|err| &**err));
    assert_eq!(reported, 2);
    assert_eq!(report_async_errors(std::iter::empty()), 0);
}
