use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::evdev_scan::EvdevScanner;
use super::identifier::{KeyboardId, UsbDevice};
use super::r#trait::{DeviceScanner, PresenceDetector};
use super::sysfs::SysfsScanner;

pub struct RealPresenceDetector {
    scanners: Vec<Box<dyn DeviceScanner>>,
    attempts: u32,
    retry_delay: Duration,
}

impl RealPresenceDetector {
    pub fn new(scanners: Vec<Box<dyn DeviceScanner>>, attempts: u32, retry_delay: Duration) -> Self {
        Self {
            scanners,
            attempts: attempts.max(1),
            retry_delay,
        }
    }

    /// sysfs первым, evdev как запасной вариант
    pub fn with_default_scanners(attempts: u32, retry_delay: Duration) -> Self {
        Self::new(
            vec![Box::new(SysfsScanner::new()), Box::new(EvdevScanner::new())],
            attempts,
            retry_delay,
        )
    }

    /// Первый источник, который смог перечислить устройства, отвечает за всех
    fn scan(&self) -> Result<Vec<UsbDevice>> {
        let mut last_error = None;

        for scanner in &self.scanners {
            match scanner.scan() {
                Ok(devices) => {
                    debug!("Источник {} вернул {} устройств", scanner.name(), devices.len());
                    return Ok(devices);
                }
                Err(e) => {
                    debug!("Источник {} недоступен: {}", scanner.name(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            crate::monitor_error!(device_scan, "не настроено ни одного источника устройств")
        }))
    }
}

#[async_trait]
impl PresenceDetector for RealPresenceDetector {
    async fn is_present(&self, keyboard: &KeyboardId) -> bool {
        for attempt in 1..=self.attempts {
            match self.scan() {
                Ok(devices) => return keyboard.matches_any(&devices),
                Err(e) => {
                    warn!(
                        "Ошибка перечисления USB-устройств (попытка {}/{}): {}",
                        attempt, self.attempts, e
                    );
                    if attempt < self.attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        error!(
            "Не удалось перечислить USB-устройства после {} попыток, считаем клавиатуру {} отключённой",
            self.attempts, keyboard
        );
        false
    }
}
