use crate::error::Result;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Блокировка единственного экземпляра. Файл содержит PID и удаляется при
/// уничтожении guard'а (обычный выход, ошибка, раскрутка паники).
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    /// `Ok(None)` - другой экземпляр уже запущен
    pub fn acquire(path: &Path) -> Result<Option<Self>> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let owner = fs::read_to_string(path).unwrap_or_default();
                info!(
                    "Файл блокировки {:?} уже существует (PID {}), другой экземпляр запущен",
                    path,
                    owner.trim()
                );
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let guard = Self {
            path: path.to_path_buf(),
        };
        write!(file, "{}", std::process::id())?;
        debug!("Файл блокировки создан: {:?}", path);

        Ok(Some(guard))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Файл блокировки удалён: {:?}", self.path),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Не удалось удалить файл блокировки {:?}: {}", self.path, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usb_monitor.lock");

        let guard = LockGuard::acquire(&path).unwrap().unwrap();
        assert_eq!(
            fs::read_to_string(guard.path()).unwrap(),
            std::process::id().to_string()
        );
        assert!(LockGuard::acquire(&path).unwrap().is_none());

        drop(guard);
        assert!(!path.exists());
        assert!(LockGuard::acquire(&path).unwrap().is_some());
        assert!(!path.exists());
    }

    #[test]
    fn test_lock_removed_on_error_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run").join("usb_monitor.lock");

        let failing = || -> Result<()> {
            let _guard = LockGuard::acquire(&path)?.unwrap();
            assert!(path.exists());
            Err(crate::monitor_error!(internal, "сбой"))
        };

        assert!(failing().is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_lock_removed_on_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usb_monitor.lock");

        let result = std::panic::catch_unwind(|| {
            let _guard = LockGuard::acquire(&path).unwrap().unwrap();
            panic!("сбой");
        });

        assert!(result.is_err());
        assert!(!path.exists());
    }
}
