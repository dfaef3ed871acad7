use crate::error::Result;
use crate::services::input_switcher::InputSwitcher;
use crate::settings::Settings;
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

/// Форма редактирования настроек. `None` - пользователь отказался сохранять.
#[async_trait]
pub trait SettingsForm: Send + Sync {
    async fn edit(&self, current: &Settings) -> Result<Option<Settings>>;
}

/// Форма в терминале: четыре поля, проверочное переключение, подтверждение.
pub struct PromptForm {
    switcher: Option<Box<dyn InputSwitcher>>,
}

impl PromptForm {
    pub fn new(switcher: Box<dyn InputSwitcher>) -> Self {
        Self {
            switcher: Some(switcher),
        }
    }

    #[cfg(test)]
    pub fn without_test_switch() -> Self {
        Self { switcher: None }
    }

    async fn run<R, W>(&self, reader: &mut R, writer: &mut W, current: &Settings) -> Result<Option<Settings>>
    where
        R: AsyncBufRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        writer
            .write_all("Настройки USB Monitor (Enter - оставить значение в скобках)\n".as_bytes())
            .await?;

        let candidate = Settings {
            monitor_bus: ask(reader, writer, "Monitor bus / ID", &current.monitor_bus).await?,
            keyboard_id: ask(reader, writer, "Keyboard USB ID (VID:PID)", &current.keyboard_id).await?,
            input_connected: ask(reader, writer, "Input code (connected)", &current.input_connected).await?,
            input_disconnected: ask(reader, writer, "Input code (disconnected)", &current.input_disconnected)
                .await?,
        }
        .normalized();

        if let Some(switcher) = &self.switcher {
            let question = format!("Проверить переключение на вход {}?", candidate.input_connected);
            if confirm(reader, writer, &question, false).await? {
                let outcome = switcher
                    .switch_to(&candidate.monitor_bus, &candidate.input_connected)
                    .await;
                writer
                    .write_all(format!("Результат проверки: {}\n", outcome).as_bytes())
                    .await?;
            }
        }

        if confirm(reader, writer, "Сохранить настройки?", true).await? {
            info!("Настройки введены в форме");
            Ok(Some(candidate))
        } else {
            info!("Ввод настроек отменён");
            Ok(None)
        }
    }
}

#[async_trait]
impl SettingsForm for PromptForm {
    async fn edit(&self, current: &Settings) -> Result<Option<Settings>> {
        let mut reader = BufReader::new(tokio::io::stdin());
        let mut writer = tokio::io::stdout();
        self.run(&mut reader, &mut writer, current).await
    }
}

/// Пустой ввод или конец потока - значение по умолчанию
async fn ask<R, W>(reader: &mut R, writer: &mut W, label: &str, default: &str) -> Result<String>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let answer = prompt(reader, writer, &format!("{} [{}]: ", label, default)).await?;
    if answer.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(answer)
    }
}

async fn confirm<R, W>(reader: &mut R, writer: &mut W, question: &str, default: bool) -> Result<bool>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    let answer = prompt(reader, writer, &format!("{} {} ", question, hint)).await?;

    Ok(match answer.to_lowercase().as_str() {
        "" => default,
        "y" | "yes" | "д" | "да" => true,
        _ => false,
    })
}

async fn prompt<R, W>(reader: &mut R, writer: &mut W, text: &str) -> Result<String>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    writer.write_all(text.as_bytes()).await?;
    writer.flush().await?;

    let mut line = String::new();
    reader.read_line(&mut line).await?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::input_switcher::SwitchOutcome;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingSwitcher {
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl InputSwitcher for CountingSwitcher {
        async fn switch_to(&self, _monitor: &str, input_code: &str) -> SwitchOutcome {
            self.calls.lock().push(input_code.to_string());
            SwitchOutcome {
                attempts: 1,
                succeeded: true,
            }
        }
    }

    async fn fill(form: &PromptForm, input: &str) -> (Option<Settings>, String) {
        let mut reader = input.as_bytes();
        let mut output = Vec::new();
        let result = form
            .run(&mut reader, &mut output, &Settings::default())
            .await
            .unwrap();
        (result, String::from_utf8(output).unwrap())
    }

    #[tokio::test]
    async fn test_empty_answers_keep_defaults() {
        let form = PromptForm::without_test_switch();
        let (result, output) = fill(&form, "\n\n\n\n\n").await;

        assert_eq!(result, Some(Settings::default()));
        assert!(output.contains("Keyboard USB ID (VID:PID) [046d:c31c]: "));
    }

    #[tokio::test]
    async fn test_answers_are_collected_and_trimmed() {
        let form = PromptForm::without_test_switch();
        let (result, _) = fill(&form, "3\n 04d9:a1df \n17\n\ny\n").await;

        let settings = result.unwrap();
        assert_eq!(settings.monitor_bus, "3");
        assert_eq!(settings.keyboard_id, "04d9:a1df");
        assert_eq!(settings.input_connected, "17");
        assert_eq!(settings.input_disconnected, "18");
    }

    #[tokio::test]
    async fn test_declined_save_returns_none() {
        let form = PromptForm::without_test_switch();
        let (result, _) = fill(&form, "\n\n\n\nn\n").await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_switch_runs_through_switcher() {
        let switcher = CountingSwitcher::default();
        let calls = switcher.calls.clone();
        let form = PromptForm::new(Box::new(switcher));

        let (result, output) = fill(&form, "\n\n21\n\ny\n\n").await;

        assert_eq!(*calls.lock(), vec!["21".to_string()]);
        assert!(output.contains("Результат проверки: успешно"));
        assert_eq!(result.unwrap().input_connected, "21");
    }
}
