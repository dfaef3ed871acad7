use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ошибка D-Bus: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Ошибка перечисления устройств: {0}")]
    DeviceScan(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Неверные настройки: {0}")]
    InvalidSettings(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl MonitorError {
    pub fn device_scan<T>(msg: impl Into<String>) -> Result<T> {
        Err(MonitorError::DeviceScan(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! monitor_error {
    (device_scan, $($arg:tt)*) => {
        $crate::error::MonitorError::DeviceScan(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::MonitorError::Permission(format!($($arg)*))
    };
    (invalid_settings, $($arg:tt)*) => {
        $crate::error::MonitorError::InvalidSettings(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::MonitorError::ServiceUnavailable(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::MonitorError::Internal(format!($($arg)*))
    };
}
