pub mod capability;
pub mod lock_file;
pub mod log_file;
pub mod permissions;
pub mod shutdown;

pub use lock_file::LockGuard;
pub use log_file::{LineFormat, RotatingFile};

// ✅ Макросы условного логирования для оптимизации производительности
#[macro_export]
macro_rules! debug_if_enabled {
    ($($arg:tt)*) => {
        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!($($arg)*);
        }
    };
}
