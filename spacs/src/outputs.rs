use crate::config::OutputConfig;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

const GPIO_ROOT: &str = "/sys/class/gpio";

/// A single digital output line.
pub trait OutputPin {
    fn set(&mut self, high: bool) -> io::Result<()>;
}

/// A GPIO line driven through the sysfs interface.
#[derive(Debug)]
pub struct SysfsPin {
    line: u32,
    value: PathBuf,
}

impl SysfsPin {
    pub fn export(line: u32) -> io::Result<Self> {
        Self::export_under(Path::new(GPIO_ROOT), line)
    }

    /// Exports `line` under a gpio class directory and makes it an output.
    pub fn export_under(root: &Path, line: u32) -> io::Result<Self> {
        let dir = root.join(format!("gpio{}", line));
        if !dir.exists() {
            fs::write(root.join("export"), line.to_string())?;
        }
        fs::write(dir.join("direction"), "out")?;

        Ok(SysfsPin {
            line,
            value: dir.join("value"),
        })
    }

    pub fn line(&self) -> u32 {
        self.line
    }
}

impl OutputPin for SysfsPin {
    fn set(&mut self, high: bool) -> io::Result<()> {
        fs::write(&self.value, if high { "1" } else { "0" })
    }
}

/// Stands in for an unwired output; level changes only show up in the log.
#[derive(Debug)]
pub struct LoggedPin {
    name: &'static str,
}

impl LoggedPin {
    pub fn new(name: &'static str) -> Self {
        LoggedPin { name }
    }
}

impl OutputPin for LoggedPin {
    fn set(&mut self, high: bool) -> io::Result<()> {
        log::debug!("{} -> {}", self.name, if high { "high" } else { "low" });
        Ok(())
    }
}

/// The door relay. Most relay boards switch on a low input.
pub struct Relay {
    pin: Box<dyn OutputPin>,
    active_low: bool,
}

impl Relay {
    pub fn new(pin: Box<dyn OutputPin>, active_low: bool) -> Self {
        Relay { pin, active_low }
    }

    pub fn on(&mut self) {
        self.drive(true);
        log::info!("Relay ON");
    }

    pub fn off(&mut self) {
        self.drive(false);
        log::info!("Relay OFF");
    }

    /// Switches on for `hold`, then off again.
    pub fn pulse(&mut self, hold: Duration) {
        self.on();
        thread::sleep(hold);
        self.off();
    }

    fn drive(&mut self, energized: bool) {
        if let Err(e) = self.pin.set(energized != self.active_low) {
            log::error!("Can not drive relay: {}", e);
        }
    }
}

/// On/off timing of a status LED signal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Blink {
    pub times: u32,
    pub on_ms: u64,
    pub off_ms: u64,
}

impl Blink {
    pub const LINK_DOWN: Blink = Blink::new(5, 200, 200);
    pub const SENSOR_MISSING: Blink = Blink::new(10, 100, 100);
    pub const FAILED: Blink = Blink::new(3, 300, 150);
    pub const INVALID_INPUT: Blink = Blink::new(2, 200, 100);
    pub const REPORTED: Blink = Blink::new(2, 100, 50);

    pub const fn new(times: u32, on_ms: u64, off_ms: u64) -> Self {
        Blink {
            times,
            on_ms,
            off_ms,
        }
    }
}

/// Feedback LED next to the sensor, separate from the sensor's ring LED.
pub struct StatusLed {
    pin: Box<dyn OutputPin>,
}

impl StatusLed {
    pub fn new(pin: Box<dyn OutputPin>) -> Self {
        StatusLed { pin }
    }

    pub fn blink(&mut self, blink: Blink) {
        for _ in 0..blink.times {
            if let Err(e) = self.pin.set(true) {
                log::error!("Can not drive status LED: {}", e);
                return;
            }
            thread::sleep(Duration::from_millis(blink.on_ms));
            if let Err(e) = self.pin.set(false) {
                log::error!("Can not drive status LED: {}", e);
                return;
            }
            thread::sleep(Duration::from_millis(blink.off_ms));
        }
    }
}

pub struct Outputs {
    pub relay: Relay,
    pub status_led: StatusLed,
}

impl Outputs {
    /// Exports the configured GPIO lines and leaves the relay released.
    pub fn from_config(config: &OutputConfig) -> io::Result<Self> {
        let relay_pin: Box<dyn OutputPin> = match config.relay_gpio {
            Some(line) => Box::new(SysfsPin::export(line)?),
            None => Box::new(LoggedPin::new("relay")),
        };
        let led_pin: Box<dyn OutputPin> = match config.status_led_gpio {
            Some(line) => Box::new(SysfsPin::export(line)?),
            None => Box::new(LoggedPin::new("status-led")),
        };

        let mut outputs = Outputs {
            relay: Relay::new(relay_pin, config.relay_active_low),
            status_led: StatusLed::new(led_pin),
        };
        outputs.relay.off();

        Ok(outputs)
    }

    pub fn logged() -> Self {
        Outputs {
            relay: Relay::new(Box::new(LoggedPin::new("relay")), true),
            status_led: StatusLed::new(Box::new(LoggedPin::new("status-led"))),
        }
    }
}
