use crate::settings::Settings;
use std::fmt;

/// Команды интерфейса для опрашивающей задачи. Состоянием владеет только она.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    /// Ручное переключение входа, не меняет отслеживаемое состояние клавиатуры
    ToggleManual,
    /// Применить новые настройки без перезапуска
    ReloadSettings(Settings),
    /// Проверочное переключение на указанный код входа
    TestSwitch(String),
    Shutdown,
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToggleManual => f.write_str("ToggleManual"),
            Self::ReloadSettings(settings) => write!(f, "ReloadSettings({})", settings.keyboard_id),
            Self::TestSwitch(code) => write!(f, "TestSwitch({})", code),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}
