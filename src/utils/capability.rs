//! Front-end capability probe.
//!
//! Decides once at startup whether a tray icon can be shown. A tray needs a
//! graphical session (`WAYLAND_DISPLAY` or `DISPLAY`) and a StatusNotifierWatcher
//! on the D-Bus session bus. Anything else runs headless.

use crate::error::Result;
use std::env;
use std::time::Duration;
use tracing::debug;
use zbus::names::BusName;

const STATUS_NOTIFIER_WATCHER: &str = "org.kde.StatusNotifierWatcher";
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontEndCapability {
    /// Иконка в трее через StatusNotifierItem
    Tray,
    /// Только лог
    Headless,
}

/// Probes the environment. `force_headless` short-circuits the probe.
pub async fn probe(force_headless: bool) -> FrontEndCapability {
    if force_headless {
        return FrontEndCapability::Headless;
    }

    let has_display = has_var("WAYLAND_DISPLAY") || has_var("DISPLAY");
    let has_watcher = if has_display {
        match tokio::time::timeout(PROBE_TIMEOUT, status_notifier_watcher_available()).await {
            Ok(Ok(available)) => available,
            Ok(Err(e)) => {
                debug!("Сессионная шина D-Bus недоступна: {}", e);
                false
            }
            Err(_) => {
                debug!("Таймаут при проверке сессионной шины D-Bus");
                false
            }
        }
    } else {
        false
    };

    classify(has_display, has_watcher)
}

fn has_var(name: &str) -> bool {
    env::var_os(name).map(|v| !v.is_empty()).unwrap_or(false)
}

async fn status_notifier_watcher_available() -> Result<bool> {
    let connection = zbus::Connection::session().await?;
    let proxy = zbus::fdo::DBusProxy::new(&connection).await?;
    let name = BusName::try_from(STATUS_NOTIFIER_WATCHER).map_err(zbus::Error::from)?;
    let owned = proxy.name_has_owner(name).await.map_err(zbus::Error::from)?;
    Ok(owned)
}

/// Decision over the probed facts.
fn classify(has_display: bool, has_watcher: bool) -> FrontEndCapability {
    match (has_display, has_watcher) {
        (true, true) => FrontEndCapability::Tray,
        _ => FrontEndCapability::Headless,
    }
}
