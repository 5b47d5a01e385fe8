use crate::{Sensor, SensorError, Transport, Uart};
use fpm_sys::SerialPort;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Device node prefixes a module is usually wired to, most likely first:
/// the board's primary UART, SoC UARTs, USB serial bridges, legacy ports.
const CANDIDATE_PREFIXES: &[&str] = &["serial", "ttyAMA", "ttyS0", "ttyUSB", "ttyACM", "ttyS"];

/// A serial device node that may have a fingerprint module behind it.
///
/// Nothing is known about the node until it is probed: the module may be
/// unpowered, wired to another port, or the node may belong to a different
/// peripheral entirely.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DiscoveredDevice {
    path: PathBuf,
}

impl DiscoveredDevice {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        DiscoveredDevice { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the port without talking to the module.
    pub fn open(&self, baud: u32, timeout: Duration) -> crate::Result<Sensor<Uart<SerialPort>>> {
        let port = SerialPort::open(&self.path, baud, timeout)
            .map_err(|e| SensorError::Open(self.path.display().to_string(), e))?;

        Ok(Sensor::new(Uart::new(port)))
    }

    /// Opens the port and performs the password handshake with the module
    /// configured at `address` with `password`.
    pub fn probe(
        &self,
        baud: u32,
        timeout: Duration,
        address: u32,
        password: u32,
    ) -> crate::Result<Sensor<Uart<SerialPort>>> {
        handshake(self.open(baud, timeout)?, address, password)
    }
}

/// Points `sensor` at `address` and checks `password` against the module.
pub fn handshake<T: Transport>(
    sensor: Sensor<T>,
    address: u32,
    password: u32,
) -> crate::Result<Sensor<T>> {
    let mut sensor = sensor.with_address(address).with_password(password);
    sensor.verify_password()?;

    Ok(sensor)
}

/// Serial device nodes found on the system, in probing order.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredDevices {
    inner: Vec<PathBuf>,
    current_item_number: usize,
}

impl Iterator for DiscoveredDevices {
    type Item = DiscoveredDevice;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.get(self.current_item_number)?;
        self.current_item_number += 1;

        Some(item)
    }
}

impl DiscoveredDevices {
    /// Scans `/dev` for serial device nodes.
    pub fn scan() -> Self {
        Self::scan_dir("/dev")
    }

    /// Scans `dir` for entries named like serial device nodes. An unreadable
    /// directory yields an empty list.
    pub fn scan_dir<P: AsRef<Path>>(dir: P) -> Self {
        let names: Vec<String> = match fs::read_dir(dir.as_ref()) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| entry.file_name().into_string().ok())
                .collect(),
            Err(error) => {
                log::debug!("cannot list {}: {}", dir.as_ref().display(), error);
                Vec::new()
            }
        };

        let mut ranked: Vec<(usize, String)> = names
            .into_iter()
            .filter_map(|name| rank(&name).map(|rank| (rank, name)))
            .collect();
        ranked.sort();

        Self::with_devices(
            ranked
                .into_iter()
                .map(|(_, name)| dir.as_ref().join(name))
                .collect(),
        )
    }

    pub fn with_devices(devices: Vec<PathBuf>) -> Self {
        DiscoveredDevices {
            inner: devices,
            current_item_number: 0,
        }
    }

    pub fn get(&self, index: usize) -> Option<DiscoveredDevice> {
        self.inner.get(index).map(DiscoveredDevice::new)
    }

    pub fn count(&self) -> usize {
        self.inner.len()
    }

    /// Probes every node in order and returns the first module that completes
    /// the handshake.
    pub fn find_module(
        self,
        baud: u32,
        timeout: Duration,
        address: u32,
        password: u32,
    ) -> crate::Result<Sensor<Uart<SerialPort>>> {
        let tried = self.inner.clone();

        for device in self {
            match device.probe(baud, timeout, address, password) {
                Ok(sensor) => {
                    log::info!("fingerprint module found on {}", device.path().display());
                    return Ok(sensor);
                }
                Err(error) => log::debug!("{}: {}", device.path().display(), error),
            }
        }

        Err(SensorError::NoModule(tried))
    }
}

fn rank(name: &str) -> Option<usize> {
    CANDIDATE_PREFIXES
        .iter()
        .position(|prefix| name.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedSensor;
    use crate::{Confirmation, DEFAULT_ADDRESS, DEFAULT_PASSWORD};

    #[test]
    fn serial_nodes_are_ranked_and_others_ignored() {
        let dir = tempfile::tempdir().unwrap();
        for name in &["ttyUSB0", "null", "ttyS3", "serial0", "ttyAMA0", "sda"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let found: Vec<PathBuf> = DiscoveredDevices::scan_dir(dir.path())
            .map(|device| device.path().to_path_buf())
            .collect();

        let names: Vec<&str> = found
            .iter()
            .map(|path| path.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["serial0", "ttyAMA0", "ttyUSB0", "ttyS3"]);
    }

    #[test]
    fn missing_directory_finds_nothing() {
        let devices = DiscoveredDevices::scan_dir("/definitely/not/here");

        assert_eq!(devices.count(), 0);
    }

    #[test]
    fn no_module_lists_what_was_tried() {
        let devices = DiscoveredDevices::with_devices(vec![PathBuf::from("/definitely/not/ttyUSB9")]);

        match devices.find_module(
            57_600,
            Duration::from_millis(100),
            DEFAULT_ADDRESS,
            DEFAULT_PASSWORD,
        ) {
            Err(SensorError::NoModule(tried)) => assert_eq!(tried.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn handshake_uses_configured_credentials() {
        let module = SimulatedSensor::new(127).with_credentials(0x0000_0042, 0x1234);

        let sensor = handshake(Sensor::new(module), 0x0000_0042, 0x1234).unwrap();

        assert_eq!(sensor.transport().instructions(), &[fpm_sys::cmd::VERIFY_PASSWORD]);
    }

    #[test]
    fn handshake_with_defaults_misses_a_readdressed_module() {
        let module = SimulatedSensor::new(127).with_credentials(0x0000_0042, 0x1234);

        match handshake(Sensor::new(module), DEFAULT_ADDRESS, DEFAULT_PASSWORD) {
            Err(SensorError::Packet(fpm_sys::PacketError::Timeout)) => {}
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn handshake_with_wrong_password_is_rejected() {
        let module = SimulatedSensor::new(127).with_credentials(DEFAULT_ADDRESS, 0x1234);

        let error = handshake(Sensor::new(module), DEFAULT_ADDRESS, 0x4321)
            .map(|_| ())
            .unwrap_err();

        assert_eq!(error.confirmation(), Some(Confirmation::PasswordFail));
    }
}
