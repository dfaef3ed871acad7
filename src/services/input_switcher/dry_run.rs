use async_trait::async_trait;
use tracing::info;

use super::command::DdcCommand;
use super::r#trait::{InputSwitcher, SwitchOutcome};

pub struct DryRunSwitcher {
    command: DdcCommand,
}

impl DryRunSwitcher {
    pub fn new(command: DdcCommand) -> Self {
        info!("Dry-run режим - InputSwitcher не запускает внешнюю утилиту");
        Self { command }
    }
}

#[async_trait]
impl InputSwitcher for DryRunSwitcher {
    async fn switch_to(&self, monitor: &str, input_code: &str) -> SwitchOutcome {
        info!("[DRY RUN] {}", self.command.render(monitor, input_code));
        SwitchOutcome {
            attempts: 1,
            succeeded: true,
        }
    }
}
