use std::fmt;

/// Отслеживаемое состояние клавиатуры
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PresenceState {
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

impl PresenceState {
    pub fn from_reading(connected: bool) -> Self {
        if connected {
            Self::Connected
        } else {
            Self::Disconnected
        }
    }

    /// `None` пока не было ни одного опроса
    pub fn as_reading(&self) -> Option<bool> {
        match self {
            Self::Unknown => None,
            Self::Connected => Some(true),
            Self::Disconnected => Some(false),
        }
    }
}

impl fmt::Display for PresenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Unknown => "Unknown",
            Self::Connected => "Connected",
            Self::Disconnected => "Disconnected",
        };
        f.write_str(text)
    }
}

/// Снимок состояния, который опрашивающая задача публикует для интерфейса
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceStatus {
    pub presence: PresenceState,
    pub manual_override: bool,
    pub last_input: Option<String>,
}

impl PresenceStatus {
    pub fn title(&self) -> String {
        let mut title = format!("USB Monitor ({})", self.presence);
        if self.manual_override {
            title.push_str(" · manual");
        }
        title
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last_input {
            Some(input) => write!(f, "{}, вход {}", self.title(), input),
            None => f.write_str(&self.title()),
        }
    }
}
