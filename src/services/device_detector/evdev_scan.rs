use crate::error::{MonitorError, Result};
use std::path::Path;
use tracing::debug;

use super::identifier::UsbDevice;
use super::r#trait::DeviceScanner;

const INPUT_DIR: &str = "/dev/input";

/// Резервный источник: input-устройства на шине USB через evdev.
/// Работает там, где sysfs не смонтирован, но /dev/input доступен.
pub struct EvdevScanner;

impl EvdevScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EvdevScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceScanner for EvdevScanner {
    fn name(&self) -> &'static str {
        "evdev"
    }

    fn scan(&self) -> Result<Vec<UsbDevice>> {
        if !Path::new(INPUT_DIR).exists() {
            return MonitorError::device_scan(format!("Директория {} не существует", INPUT_DIR));
        }

        let mut devices = Vec::new();
        for (path, device) in evdev::enumerate() {
            let input_id = device.input_id();
            if input_id.bus_type() != evdev::BusType::BUS_USB {
                continue;
            }

            let mut usb = UsbDevice::new(input_id.vendor(), input_id.product(), path.to_string_lossy());
            if let Some(name) = device.name() {
                usb = usb.with_name(name);
            }
            crate::debug_if_enabled!("evdev: {}", usb);
            devices.push(usb);
        }

        debug!("evdev: найдено {} USB input-устройств", devices.len());
        Ok(devices)
    }
}
