use crate::error::{MonitorError, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const SYSFS_USB_DEVICES: &str = "/sys/bus/usb/devices";
const INPUT_DIR: &str = "/dev/input";

/// Проверить доступ к источникам списка устройств.
///
/// Ошибка возвращается только если недоступны оба источника; детектор в
/// этом случае всегда будет сообщать, что клавиатура отключена.
pub fn check_permissions() -> Result<()> {
    info!("Проверка прав доступа...");

    let sysfs = check_dir_access(SYSFS_USB_DEVICES);
    let input = check_dir_access(INPUT_DIR);

    check_not_root();

    summarize(sysfs, input)
}

type Access = std::result::Result<(), String>;

fn summarize(sysfs: Access, input: Access) -> Result<()> {
    match (sysfs, input) {
        (Err(sysfs_reason), Err(input_reason)) => Err(MonitorError::Permission(format!(
            "{}; {}. Клавиатура не будет обнаружена",
            sysfs_reason, input_reason
        ))),
        (Err(reason), Ok(())) | (Ok(()), Err(reason)) => {
            warn!("{}", reason);
            info!("Проверка прав доступа завершена, используется доступный источник");
            Ok(())
        }
        (Ok(()), Ok(())) => {
            info!("Проверка прав доступа завершена успешно");
            Ok(())
        }
    }
}

/// `Err` содержит причину без префикса ошибки
fn check_dir_access(dir: &str) -> Access {
    if !Path::new(dir).exists() {
        return Err(format!("Директория {} не существует", dir));
    }

    match fs::read_dir(dir) {
        Ok(_) => {
            info!("Доступ к {} подтвержден", dir);
            Ok(())
        }
        Err(e) => Err(format!("Нет доступа к {}: {}", dir, e)),
    }
}

fn check_not_root() {
    // Проверяем переменную окружения USER
    match std::env::var("USER") {
        Ok(user) if user == "root" => {
            warn!("⚠️  Приложение запущено от имени root!");
            warn!("   Для ddcutil достаточно группы 'i2c':");
            warn!("   sudo usermod -a -G i2c $USER");
            warn!("   (затем перезайдите в систему)");
        }
        Ok(user) => {
            info!("Приложение запущено от имени пользователя: {}", user);
        }
        Err(_) => {
            warn!("Не удалось определить пользователя");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dir_reason_is_bare() {
        let reason = check_dir_access("/nonexistent/usb-monitor-test").unwrap_err();
        assert_eq!(reason, "Директория /nonexistent/usb-monitor-test не существует");
    }

    #[test]
    fn test_both_sources_missing_has_single_prefix() {
        let sysfs = check_dir_access("/nonexistent/usb-monitor-test/sys");
        let input = check_dir_access("/nonexistent/usb-monitor-test/input");
        let message = summarize(sysfs, input).unwrap_err().to_string();

        assert_eq!(message.matches("Недостаточно прав доступа").count(), 1);
        assert!(message.contains("Директория /nonexistent/usb-monitor-test/sys не существует"));
    }

    #[test]
    fn test_one_available_source_is_enough() {
        let dir = tempfile::tempdir().unwrap();
        let available = check_dir_access(dir.path().to_str().unwrap());
        let missing = check_dir_access("/nonexistent/usb-monitor-test");
        assert!(summarize(missing, available).is_ok());
    }

    #[test]
    fn test_readable_dir_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_dir_access(dir.path().to_str().unwrap()).is_ok());
    }
}
