use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Рабочая конфигурация процесса: тайминги, внешняя утилита, логирование.
///
/// Четыре пользовательских поля (монитор, клавиатура, коды входов) живут
/// отдельно, в `settings.json`, см. [`crate::settings`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub tool: ToolConfig,
    pub timing: TimingConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Порог ротации лог-файла
    pub max_file_bytes: u64,
    pub backups: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolFlavor {
    Ddcutil,
    ControlMyMonitor,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolConfig {
    pub flavor: ToolFlavor,
    pub program: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingConfig {
    pub startup_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub debounce_ms: u64,
    pub debounce_sample_ms: u64,
    pub detect_attempts: u32,
    pub detect_retry_delay_ms: u64,
    pub switch_attempts: u32,
    pub switch_retry_delay_ms: u64,
    pub switch_timeout_ms: u64,
    pub dry_run_period_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PathsConfig {
    #[serde(default)]
    pub settings_file: Option<PathBuf>,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub lock_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                max_file_bytes: 1024 * 1024,
                backups: 3,
            },
            tool: ToolConfig {
                flavor: ToolFlavor::Ddcutil,
                program: PathBuf::from("ddcutil"),
            },
            timing: TimingConfig {
                startup_delay_ms: 10_000,
                poll_interval_ms: 2_000,
                debounce_ms: 1_000,
                debounce_sample_ms: 250,
                detect_attempts: 3,
                detect_retry_delay_ms: 250,
                switch_attempts: 3,
                switch_retry_delay_ms: 500,
                switch_timeout_ms: 10_000,
                dry_run_period_ms: 30_000,
            },
            paths: PathsConfig::default(),
        }
    }
}

pub const APP_DIR_NAME: &str = "usb-monitor";
const CONFIG_FILE_NAME: &str = "usb-monitor.toml";
const LOCK_FILE_NAME: &str = "usb_monitor.lock";

impl Config {
    /// Загрузка: встроенные значения по умолчанию, затем TOML-файл (если есть),
    /// затем переменные окружения `USB_MONITOR_*`.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("USB_MONITOR_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        if self.logging.max_file_bytes < 1024 {
            anyhow::bail!("logging.max_file_bytes должно быть минимум 1024");
        }

        if self.tool.program.as_os_str().is_empty() {
            anyhow::bail!("tool.program не может быть пустым");
        }

        // Валидация таймингов
        let t = &self.timing;
        if t.poll_interval_ms < 100 {
            anyhow::bail!("poll_interval_ms должно быть минимум 100");
        }
        if t.debounce_ms > 0 && t.debounce_sample_ms == 0 {
            anyhow::bail!("debounce_sample_ms должно быть больше 0");
        }
        if t.detect_attempts == 0 {
            anyhow::bail!("detect_attempts должно быть больше 0");
        }
        if t.switch_attempts == 0 {
            anyhow::bail!("switch_attempts должно быть больше 0");
        }
        if t.switch_timeout_ms == 0 {
            anyhow::bail!("switch_timeout_ms должно быть больше 0");
        }
        if t.dry_run_period_ms == 0 {
            anyhow::bail!("dry_run_period_ms должно быть больше 0");
        }

        Ok(())
    }

    pub fn app_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }

    fn default_config_path() -> PathBuf {
        Self::app_dir().join(CONFIG_FILE_NAME)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.paths
            .settings_file
            .clone()
            .unwrap_or_else(|| Self::app_dir().join("settings.json"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.paths
            .log_file
            .clone()
            .unwrap_or_else(|| Self::app_dir().join("logs").join("switch_log.txt"))
    }

    pub fn lock_path(&self) -> PathBuf {
        self.paths.lock_file.clone().unwrap_or_else(|| {
            dirs::runtime_dir()
                .unwrap_or_else(Self::app_dir)
                .join(LOCK_FILE_NAME)
        })
    }
}

impl TimingConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn debounce_sample(&self) -> Duration {
        Duration::from_millis(self.debounce_sample_ms)
    }

    pub fn detect_retry_delay(&self) -> Duration {
        Duration::from_millis(self.detect_retry_delay_ms)
    }

    pub fn switch_retry_delay(&self) -> Duration {
        Duration::from_millis(self.switch_retry_delay_ms)
    }

    pub fn switch_timeout(&self) -> Duration {
        Duration::from_millis(self.switch_timeout_ms)
    }

    pub fn dry_run_period(&self) -> Duration {
        Duration::from_millis(self.dry_run_period_ms)
    }
}
