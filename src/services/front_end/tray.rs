use crate::error::Result;
use crate::events::{ControlCommand, PresenceStatus};
use crate::services::presence_poller::PollerHandle;
use crate::settings::SettingsStore;
use async_trait::async_trait;
use ksni::menu::StandardItem;
use ksni::{MenuItem, ToolTip, Tray, TrayMethods};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::headless::HeadlessFrontEnd;
use super::r#trait::{FrontEnd, FrontEndContext};

const ICON_NAME: &str = "video-display";

/// Иконка StatusNotifierItem с меню управления
struct MonitorTray {
    status: PresenceStatus,
    poller: PollerHandle,
    settings_store: Arc<SettingsStore>,
    log_path: PathBuf,
}

impl MonitorTray {
    fn send(&self, command: ControlCommand) {
        if !self.poller.send(command) {
            warn!("PresencePoller уже остановлен, команда не доставлена");
        }
    }

    fn reload_settings(&self) {
        let settings = self.settings_store.load();
        info!("Перечитываем настройки из {:?}", self.settings_store.path());
        self.send(ControlCommand::ReloadSettings(settings));
    }

    fn test_switch(&self) {
        let settings = self.settings_store.load();
        self.send(ControlCommand::TestSwitch(settings.input_connected));
    }
}

fn open_file(path: &Path) {
    if !path.exists() {
        warn!("Файл {:?} не найден", path);
        return;
    }
    if let Err(e) = open::that_detached(path) {
        warn!("Не удалось открыть {:?}: {}", path, e);
    }
}

impl Tray for MonitorTray {
    fn id(&self) -> String {
        env!("CARGO_PKG_NAME").into()
    }

    fn title(&self) -> String {
        self.status.title()
    }

    fn icon_name(&self) -> String {
        ICON_NAME.into()
    }

    fn tool_tip(&self) -> ToolTip {
        let description = match &self.status.last_input {
            Some(input) => format!("Текущий вход: {}", input),
            None => "Вход ещё не переключался".to_string(),
        };
        ToolTip {
            icon_name: ICON_NAME.into(),
            title: self.status.title(),
            description,
            ..Default::default()
        }
    }

    fn menu(&self) -> Vec<MenuItem<Self>> {
        vec![
            StandardItem {
                label: "Switch monitor input".into(),
                activate: Box::new(|tray: &mut Self| tray.send(ControlCommand::ToggleManual)),
                ..Default::default()
            }
            .into(),
            MenuItem::Separator,
            StandardItem {
                label: "Edit settings".into(),
                activate: Box::new(|tray: &mut Self| open_file(tray.settings_store.path())),
                ..Default::default()
            }
            .into(),
            StandardItem {
                label: "Reload settings".into(),
                activate: Box::new(|tray: &mut Self| tray.reload_settings()),
                ..Default::default()
            }
            .into(),
            StandardItem {
                label: "Test connected input".into(),
                activate: Box::new(|tray: &mut Self| tray.test_switch()),
                ..Default::default()
            }
            .into(),
            StandardItem {
                label: "Show log".into(),
                activate: Box::new(|tray: &mut Self| open_file(&tray.log_path)),
                ..Default::default()
            }
            .into(),
            MenuItem::Separator,
            StandardItem {
                label: "Quit".into(),
                icon_name: "application-exit".into(),
                activate: Box::new(|tray: &mut Self| {
                    info!("Остановка по команде из меню");
                    tray.send(ControlCommand::Shutdown);
                }),
                ..Default::default()
            }
            .into(),
        ]
    }
}

pub struct StatusTray {
    context: FrontEndContext,
}

impl StatusTray {
    pub fn new(context: FrontEndContext) -> Self {
        Self { context }
    }

    async fn run_impl(self) -> Result<()> {
        let tray = MonitorTray {
            status: self.context.poller.status(),
            poller: self.context.poller.clone(),
            settings_store: self.context.settings_store.clone(),
            log_path: self.context.log_path.clone(),
        };

        let handle = match tray.spawn().await {
            Ok(handle) => handle,
            Err(e) => {
                let err = crate::monitor_error!(service_unavailable, "StatusNotifierItem: {}", e);
                warn!("{}. Переходим в фоновый режим", err);
                let fallback: Box<dyn FrontEnd> = Box::new(HeadlessFrontEnd::new(self.context));
                return fallback.run().await;
            }
        };
        info!("Иконка в трее зарегистрирована");

        let mut status = self.context.poller.subscribe();
        while status.changed().await.is_ok() {
            let current = status.borrow_and_update().clone();
            debug!("Обновляем иконку: {}", current);
            handle
                .update(move |tray: &mut MonitorTray| tray.status = current)
                .await;
        }

        handle.shutdown().await;
        debug!("StatusTray завершает работу");
        Ok(())
    }
}

#[async_trait]
impl FrontEnd for StatusTray {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
