use crate::config::LinkConfig;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

/// State of the network uplink used for reporting.
pub trait Link {
    fn is_up(&self) -> bool;

    fn name(&self) -> &str;
}

/// Follows the kernel's operational state of a network interface.
#[derive(Debug)]
pub struct InterfaceLink {
    interface: String,
    operstate: PathBuf,
}

impl InterfaceLink {
    pub fn new(interface: &str) -> Self {
        Self::under("/sys/class/net", interface)
    }

    pub fn under<P: Into<PathBuf>>(root: P, interface: &str) -> Self {
        InterfaceLink {
            interface: interface.to_string(),
            operstate: root.into().join(interface).join("operstate"),
        }
    }
}

impl Link for InterfaceLink {
    fn is_up(&self) -> bool {
        fs::read_to_string(&self.operstate)
            .map(|state| state.trim() == "up")
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        &self.interface
    }
}

/// For hosts on wired networks or when no interface is configured.
#[derive(Debug, Default)]
pub struct AlwaysUp;

impl Link for AlwaysUp {
    fn is_up(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "default"
    }
}

pub fn from_config(config: &LinkConfig) -> Box<dyn Link> {
    match &config.interface {
        Some(interface) => Box::new(InterfaceLink::new(interface)),
        None => Box::new(AlwaysUp),
    }
}

/// Polls the link until it is up or `attempts` polls have failed.
pub fn wait_for_link(link: &dyn Link, attempts: u32, interval: Duration) -> bool {
    log::info!("Waiting for link {}", link.name());

    for attempt in 0..=attempts {
        if link.is_up() {
            log::info!("Link {} is up", link.name());
            return true;
        }
        if attempt < attempts {
            thread::sleep(interval);
        }
    }

    log::warn!(
        "Link {} did not come up after {} attempts",
        link.name(),
        attempts
    );
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_sysfs(state: Option<&str>) -> TempDir {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("wlan0")).unwrap();
        if let Some(state) = state {
            fs::write(root.path().join("wlan0/operstate"), state).unwrap();
        }
        root
    }

    #[test]
    fn operstate_up_means_up() {
        let root = fake_sysfs(Some("up\n"));
        let link = InterfaceLink::under(root.path(), "wlan0");

        assert!(link.is_up());
        assert!(wait_for_link(&link, 0, Duration::from_millis(0)));
    }

    #[test]
    fn dormant_or_missing_interface_is_down() {
        let root = fake_sysfs(Some("dormant\n"));

        assert!(!InterfaceLink::under(root.path(), "wlan0").is_up());
        assert!(!InterfaceLink::under(root.path(), "eth9").is_up());
        assert!(!wait_for_link(
            &InterfaceLink::under(root.path(), "wlan0"),
            2,
            Duration::from_millis(0)
        ));
    }

    #[test]
    fn interface_without_operstate_is_down() {
        let root = fake_sysfs(None);

        assert!(!InterfaceLink::under(root.path(), "wlan0").is_up());
    }

    #[test]
    fn unconfigured_link_is_always_up() {
        let link = from_config(&LinkConfig::default());

        assert!(link.is_up());
    }
}
