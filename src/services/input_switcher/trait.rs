use crate::config::Config;
use async_trait::async_trait;
use std::fmt;

use super::command::DdcCommand;

/// Итог одного переключения
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchOutcome {
    pub attempts: u32,
    pub succeeded: bool,
}

impl fmt::Display for SwitchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.succeeded {
            write!(f, "успешно (попыток: {})", self.attempts)
        } else {
            write!(f, "неудачно (попыток: {})", self.attempts)
        }
    }
}

/// Trait for input switchers that can run in different modes
#[async_trait]
pub trait InputSwitcher: Send + Sync {
    /// Set the monitor's input source. Never fails; the outcome tells whether
    /// the external tool reported success.
    async fn switch_to(&self, monitor: &str, input_code: &str) -> SwitchOutcome;
}

/// Factory function to create an appropriate input switcher based on the dry_run flag
pub fn create_input_switcher(config: &Config, dry_run: bool) -> Box<dyn InputSwitcher> {
    let command = DdcCommand::from_config(&config.tool);
    if dry_run {
        Box::new(super::dry_run::DryRunSwitcher::new(command))
    } else {
        Box::new(super::switcher::RealInputSwitcher::new(
            command,
            config.timing.switch_attempts,
            config.timing.switch_retry_delay(),
            config.timing.switch_timeout(),
        ))
    }
}
