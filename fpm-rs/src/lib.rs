#![warn(clippy::all)]

mod confirmation;
mod device;
mod discovered_device;
mod errors;
mod led;
mod params;
mod transport;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use crate::{
    confirmation::*, device::*, discovered_device::*, errors::*, led::*, params::*, transport::*,
};
pub use fpm_sys::{cmd, code, SerialPort, DEFAULT_ADDRESS, DEFAULT_BAUD, DEFAULT_PASSWORD};

pub type Result<T> = std::result::Result<T, SensorError>;

/// Opens the module on `path`, or on the first serial port where a module
/// answers the handshake for `address` and `password` when `path` is `None`.
/// An explicit path is opened without a handshake.
///
/// Set `RUST_LOG=fpm_rs=trace` to see every packet exchanged with the module.
pub fn open(
    path: Option<&std::path::Path>,
    baud: u32,
    timeout: std::time::Duration,
    address: u32,
    password: u32,
) -> Result<Sensor<Uart<SerialPort>>> {
    match path {
        Some(path) => DiscoveredDevice::new(path)
            .open(baud, timeout)
            .map(|sensor| sensor.with_address(address).with_password(password)),
        None => DiscoveredDevices::scan().find_module(baud, timeout, address, password),
    }
}
