use crate::config::Config;
use crate::error::Result;
use async_trait::async_trait;

use super::identifier::{KeyboardId, UsbDevice};

/// Источник списка USB-устройств (sysfs, evdev, ...)
pub trait DeviceScanner: Send + Sync {
    fn name(&self) -> &'static str;

    /// Текущий список устройств; ошибка означает, что источник недоступен
    fn scan(&self) -> Result<Vec<UsbDevice>>;
}

/// Trait for presence detectors that can run in different modes
#[async_trait]
pub trait PresenceDetector: Send + Sync {
    /// Whether the keyboard is currently attached. Never fails: enumeration
    /// errors degrade to `false`.
    async fn is_present(&self, keyboard: &KeyboardId) -> bool;
}

/// Factory function to create an appropriate presence detector based on the dry_run flag
pub fn create_presence_detector(config: &Config, dry_run: bool) -> Box<dyn PresenceDetector> {
    if dry_run {
        Box::new(super::dry_run::DryRunDetector::new(config.timing.dry_run_period()))
    } else {
        Box::new(super::detector::RealPresenceDetector::with_default_scanners(
            config.timing.detect_attempts,
            config.timing.detect_retry_delay(),
        ))
    }
}
