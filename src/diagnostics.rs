//! Logging of accelerator device information and asynchronous device errors.
//!
//! These helpers only emit records through the [`log`] facade. Which logger (if any) consumes
//! them is up to the application.
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::error::Error;

/// Basic capabilities of a compute device, as reported by its runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub max_compute_units: u32,
    pub driver_version: String,
}

pub fn log_device_capabilities(device: &DeviceInfo) {
    info!(
        "Running on {} (compute units: {}, driver version: {})",
        device.name, device.max_compute_units, device.driver_version
    );
}

/// Logs an error raised asynchronously by a device runtime.
///
/// The error and its chain of sources are logged at error level. The error is not propagated.
pub fn report_async_error(err: &(dyn Error + 'static)) {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    error!("Caught asynchronous device error: {}", message);
}

/// Reports a batch of asynchronous errors, returning how many were reported.
pub fn report_async_errors<'a, I>(errors: I) -> usize
where
    I: IntoIterator<Item = &'a (dyn Error + 'static)>,
{
    errors
        .into_iter()
        .inspect(|err| report_async_error(*err))
        .count()
}
