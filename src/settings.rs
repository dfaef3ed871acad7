use crate::error::{MonitorError, Result};
use crate::services::settings_form::SettingsForm;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Пользовательские настройки: какой монитор переключать, какую клавиатуру
/// отслеживать и на какие входы переключаться.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Номер шины I2C для ddcutil или идентификатор монитора для ControlMyMonitor
    #[serde(alias = "monitor_id")]
    pub monitor_bus: String,
    /// `vvvv:pppp` либо строка из пути устройства (`VID_04D9&PID_A1DF`)
    pub keyboard_id: String,
    pub input_connected: String,
    pub input_disconnected: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            monitor_bus: "1".to_string(),
            keyboard_id: "046d:c31c".to_string(),
            input_connected: "15".to_string(),
            input_disconnected: "18".to_string(),
        }
    }
}

impl Settings {
    /// Код входа для данного состояния клавиатуры
    pub fn input_for(&self, connected: bool) -> &str {
        if connected {
            &self.input_connected
        } else {
            &self.input_disconnected
        }
    }

    /// Обрезает пробелы и подставляет значения по умолчанию вместо пустых полей.
    /// Для значений, введённых пользователем.
    pub fn normalized(self) -> Self {
        Self {
            monitor_bus: self.monitor_bus.trim().to_string(),
            keyboard_id: self.keyboard_id.trim().to_string(),
            input_connected: self.input_connected.trim().to_string(),
            input_disconnected: self.input_disconnected.trim().to_string(),
        }
        .with_defaults()
    }

    /// Подставляет значения по умолчанию только вместо пустых полей,
    /// остальные значения сохраняются как есть.
    pub fn with_defaults(self) -> Self {
        let defaults = Settings::default();
        let pick = |value: String, fallback: String| if value.is_empty() { fallback } else { value };

        Self {
            monitor_bus: pick(self.monitor_bus, defaults.monitor_bus),
            keyboard_id: pick(self.keyboard_id, defaults.keyboard_id),
            input_connected: pick(self.input_connected, defaults.input_connected),
            input_disconnected: pick(self.input_disconnected, defaults.input_disconnected),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("monitor_bus", &self.monitor_bus),
            ("keyboard_id", &self.keyboard_id),
            ("input_connected", &self.input_connected),
            ("input_disconnected", &self.input_disconnected),
        ];

        for (name, value) in fields {
            if value.is_empty() {
                return Err(crate::monitor_error!(invalid_settings, "поле {} пустое", name));
            }
        }

        Ok(())
    }
}

/// Хранилище настроек в JSON-файле. Писатель всегда один.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Читает настройки. Отсутствующий или повреждённый файл не является
    /// ошибкой: возвращаются значения по умолчанию. Непустые значения
    /// возвращаются в точности как записаны.
    pub fn load(&self) -> Settings {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(_) => return Settings::default(),
        };

        match serde_json::from_str::<Settings>(&data) {
            Ok(settings) => settings.with_defaults(),
            Err(e) => {
                warn!(
                    "Файл настроек {:?} повреждён ({}), используются значения по умолчанию",
                    self.path, e
                );
                Settings::default()
            }
        }
    }

    /// Первый запуск: если файла нет, значения собираются формой
    /// (интерактивный режим) или берутся по умолчанию, затем сохраняются.
    pub async fn load_or_init(&self, form: Option<&dyn SettingsForm>) -> Result<Settings> {
        if self.exists() {
            return Ok(self.load());
        }

        info!("Файл настроек {:?} не найден, первый запуск", self.path);

        let settings = match form {
            Some(form) => form
                .edit(&Settings::default())
                .await?
                .unwrap_or_default(),
            None => Settings::default(),
        };

        self.save(&settings)?;
        Ok(settings)
    }

    /// Запись через временный файл и rename.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        settings.validate()?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut data = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut data, formatter);
        settings.serialize(&mut serializer)?;
        data.push(b'\n');

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &data)?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            MonitorError::Io(e)
        })?;

        info!("Настройки сохранены в {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("nested").join("settings.json"))
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let settings = Settings {
            monitor_bus: "M3LMQS370483".to_string(),
            keyboard_id: "VID_04D9&PID_A1DF".to_string(),
            input_connected: "0x0f".to_string(),
            input_disconnected: "a \"quoted\" value".to_string(),
        };

        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn test_round_trip_keeps_surrounding_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let settings = Settings {
            monitor_bus: " 1".to_string(),
            keyboard_id: "046d:c31c ".to_string(),
            input_connected: "  ".to_string(),
            input_disconnected: "\t18\t".to_string(),
        };

        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn test_normalized_trims_user_input() {
        let settings = Settings {
            monitor_bus: " 2 ".to_string(),
            keyboard_id: "   ".to_string(),
            input_connected: "17".to_string(),
            input_disconnected: String::new(),
        }
        .normalized();

        assert_eq!(settings.monitor_bus, "2");
        assert_eq!(settings.keyboard_id, "046d:c31c");
        assert_eq!(settings.input_connected, "17");
        assert_eq!(settings.input_disconnected, "18");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(!store.exists());
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_malformed_json_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::new(&path);
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_missing_keys_and_alias() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{ "monitor_id": "ABC123", "keyboard_id": "  04d9:a1df  ", "input_connected": "" }"#,
        )
        .unwrap();

        let settings = SettingsStore::new(&path).load();
        assert_eq!(settings.monitor_bus, "ABC123");
        assert_eq!(settings.keyboard_id, "  04d9:a1df  ");
        assert_eq!(settings.input_connected, "15");
        assert_eq!(settings.input_disconnected, "18");
    }

    #[test]
    fn test_saved_file_uses_stable_indentation() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&Settings::default()).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\n    \"monitor_bus\": \"1\""));
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_save_rejects_empty_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut settings = Settings::default();
        settings.input_connected = String::new();
        assert!(store.save(&settings).is_err());
        assert!(!store.exists());
    }

    #[tokio::test]
    async fn test_first_run_headless_persists_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let settings = store.load_or_init(None).await.unwrap();
        assert_eq!(settings, Settings::default());
        assert!(store.exists());
    }

    #[test]
    fn test_input_for() {
        let settings = Settings::default();
        assert_eq!(settings.input_for(true), "15");
        assert_eq!(settings.input_for(false), "18");
    }
}
