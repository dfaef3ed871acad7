use crate::error::{MonitorError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::identifier::UsbDevice;
use super::r#trait::DeviceScanner;

const SYSFS_USB_DEVICES: &str = "/sys/bus/usb/devices";

/// Перечисление через sysfs: те же атрибуты idVendor/idProduct, из которых
/// udev строит ID_VENDOR_ID/ID_MODEL_ID.
pub struct SysfsScanner {
    root: PathBuf,
}

impl SysfsScanner {
    pub fn new() -> Self {
        Self::with_root(SYSFS_USB_DEVICES)
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_device(path: &Path) -> Option<UsbDevice> {
        // У интерфейсов (1-4:1.0) этих атрибутов нет
        let vendor = read_hex_attr(path, "idVendor")?;
        let product = read_hex_attr(path, "idProduct")?;

        let mut device = UsbDevice::new(vendor, product, path.to_string_lossy());
        if let Ok(name) = fs::read_to_string(path.join("product")) {
            let name = name.trim();
            if !name.is_empty() {
                device = device.with_name(name);
            }
        }
        Some(device)
    }
}

impl Default for SysfsScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn read_hex_attr(dir: &Path, attr: &str) -> Option<u16> {
    let raw = fs::read_to_string(dir.join(attr)).ok()?;
    u16::from_str_radix(raw.trim(), 16).ok()
}

impl DeviceScanner for SysfsScanner {
    fn name(&self) -> &'static str {
        "sysfs"
    }

    fn scan(&self) -> Result<Vec<UsbDevice>> {
        if !self.root.exists() {
            return MonitorError::device_scan(format!("Директория {:?} не существует", self.root));
        }

        let entries = fs::read_dir(&self.root).map_err(|e| {
            crate::monitor_error!(permission, "Нет доступа к {:?}: {}", self.root, e)
        })?;

        let mut devices = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            match Self::read_device(&path) {
                Some(device) => devices.push(device),
                None => crate::debug_if_enabled!("Пропускаем {:?}: нет idVendor/idProduct", path),
            }
        }

        devices.sort_by(|a, b| a.path.cmp(&b.path));
        debug!("sysfs: найдено {} USB-устройств", devices.len());
        Ok(devices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_device(root: &Path, name: &str, vendor: &str, product: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("idVendor"), format!("{}\n", vendor)).unwrap();
        fs::write(dir.join("idProduct"), format!("{}\n", product)).unwrap();
    }

    #[test]
    fn test_scan_reads_vendor_and_product() {
        let root = tempfile::tempdir().unwrap();
        fake_device(root.path(), "1-4", "046d", "c31c");
        fs::write(root.path().join("1-4").join("product"), "USB Keyboard\n").unwrap();
        fake_device(root.path(), "usb1", "1d6b", "0002");
        // Интерфейс без атрибутов устройства
        fs::create_dir_all(root.path().join("1-4:1.0")).unwrap();

        let devices = SysfsScanner::with_root(root.path()).scan().unwrap();
        assert_eq!(devices.len(), 2);

        let keyboard = devices.iter().find(|d| d.composite_key() == "046d:c31c").unwrap();
        assert_eq!(keyboard.name.as_deref(), Some("USB Keyboard"));
    }

    #[test]
    fn test_scan_missing_root_is_error() {
        let root = tempfile::tempdir().unwrap();
        let scanner = SysfsScanner::with_root(root.path().join("absent"));
        assert!(scanner.scan().is_err());
    }
}
