use crate::error::{MonitorError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use super::command::DdcCommand;
use super::r#trait::{InputSwitcher, SwitchOutcome};

pub struct RealInputSwitcher {
    command: DdcCommand,
    attempts: u32,
    retry_delay: Duration,
    timeout: Duration,
}

impl RealInputSwitcher {
    pub fn new(command: DdcCommand, attempts: u32, retry_delay: Duration, timeout: Duration) -> Self {
        Self {
            command,
            attempts: attempts.max(1),
            retry_delay,
            timeout,
        }
    }

    fn create_command(&self, monitor: &str, input_code: &str) -> Command {
        let mut cmd = Command::new(self.command.program());
        cmd.args(self.command.args(monitor, input_code))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = self.command.working_dir() {
            cmd.current_dir(dir);
        }

        cmd
    }

    async fn run_once(&self, monitor: &str, input_code: &str) -> Result<()> {
        let output = tokio::time::timeout(self.timeout, self.create_command(monitor, input_code).output())
            .await
            .map_err(|_| {
                MonitorError::Internal(format!(
                    "{} не завершился за {} мс",
                    self.command.program().display(),
                    self.timeout.as_millis()
                ))
            })??;

        if output.status.success() {
            debug!("{}", String::from_utf8_lossy(&output.stdout).trim());
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(MonitorError::Internal(format!(
                "{} вернул {}: {}",
                self.command.program().display(),
                output.status,
                stderr.trim()
            )))
        }
    }

    /// retry_delay, 2*retry_delay, 4*retry_delay, ...
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.retry_delay.saturating_mul(factor)
    }
}

#[async_trait]
impl InputSwitcher for RealInputSwitcher {
    async fn switch_to(&self, monitor: &str, input_code: &str) -> SwitchOutcome {
        info!("Запуск DDC команды: {}", self.command.render(monitor, input_code));

        for attempt in 1..=self.attempts {
            match self.run_once(monitor, input_code).await {
                Ok(()) => {
                    info!("Вход монитора {} переключён на {}", monitor, input_code);
                    return SwitchOutcome {
                        attempts: attempt,
                        succeeded: true,
                    };
                }
                Err(e) => {
                    warn!("Попытка {}/{} переключения не удалась: {}", attempt, self.attempts, e);
                    if attempt < self.attempts {
                        tokio::time::sleep(self.backoff(attempt)).await;
                    }
                }
            }
        }

        error!(
            "Не удалось переключить вход монитора {} на {} после {} попыток",
            monitor, input_code, self.attempts
        );
        SwitchOutcome {
            attempts: self.attempts,
            succeeded: false,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::ToolFlavor;

    fn switcher(program: &str) -> RealInputSwitcher {
        RealInputSwitcher::new(
            DdcCommand::new(program, ToolFlavor::Ddcutil),
            3,
            Duration::from_millis(1),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_missing_tool_makes_exactly_three_attempts() {
        let outcome = switcher("/nonexistent/usb-monitor-test/ddcutil").switch_to("1", "15").await;
        assert_eq!(outcome, SwitchOutcome { attempts: 3, succeeded: false });
    }

    #[tokio::test]
    async fn test_failing_tool_makes_exactly_three_attempts() {
        let outcome = switcher("false").switch_to("1", "15").await;
        assert_eq!(outcome, SwitchOutcome { attempts: 3, succeeded: false });
    }

    #[tokio::test]
    async fn test_successful_tool_stops_after_first_attempt() {
        let outcome = switcher("true").switch_to("1", "15").await;
        assert_eq!(outcome, SwitchOutcome { attempts: 1, succeeded: true });
    }

    #[tokio::test]
    async fn test_relative_tool_path_with_directory() {
        let target = ["/usr/bin/true", "/bin/true"]
            .into_iter()
            .map(std::path::Path::new)
            .find(|path| path.exists())
            .unwrap();

        let dir = tempfile::tempdir_in(".").unwrap();
        std::os::unix::fs::symlink(target, dir.path().join("true")).unwrap();

        // Путь вида `.tmpXXXX/true` относительно текущего каталога
        let relative = std::path::Path::new(dir.path().file_name().unwrap()).join("true");
        let outcome = switcher(relative.to_str().unwrap()).switch_to("1", "15").await;
        assert_eq!(outcome, SwitchOutcome { attempts: 1, succeeded: true });
    }

    #[test]
    fn test_backoff_doubles() {
        let s = RealInputSwitcher::new(
            DdcCommand::new("ddcutil", ToolFlavor::Ddcutil),
            3,
            Duration::from_millis(500),
            Duration::from_secs(5),
        );
        assert_eq!(s.backoff(1), Duration::from_millis(500));
        assert_eq!(s.backoff(2), Duration::from_millis(1000));
    }
}
