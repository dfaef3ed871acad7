use crate::error::Result;
use crate::services::presence_poller::PollerHandle;
use crate::settings::SettingsStore;
use crate::utils::capability::FrontEndCapability;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Всё, что нужно интерфейсу: канал к опрашивающей задаче, хранилище
/// настроек и путь к логу
#[derive(Clone)]
pub struct FrontEndContext {
    pub poller: PollerHandle,
    pub settings_store: Arc<SettingsStore>,
    pub log_path: PathBuf,
}

/// Trait for front-ends that can run in different modes
#[async_trait]
pub trait FrontEnd: Send {
    /// Run until the poller stops publishing status
    async fn run(self: Box<Self>) -> Result<()>;
}

/// Factory function to create a front-end for the probed capability
pub fn create_front_end(capability: FrontEndCapability, context: FrontEndContext) -> Box<dyn FrontEnd> {
    match capability {
        FrontEndCapability::Tray => Box::new(super::tray::StatusTray::new(context)),
        FrontEndCapability::Headless => Box::new(super::headless::HeadlessFrontEnd::new(context)),
    }
}
