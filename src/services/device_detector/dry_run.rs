use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

use super::identifier::KeyboardId;
use super::r#trait::PresenceDetector;

/// Эмуляция клавиатуры, которая подключается и отключается каждые `period`
pub struct DryRunDetector {
    period: Duration,
    started: Instant,
}

impl DryRunDetector {
    pub fn new(period: Duration) -> Self {
        info!("Dry-run режим - PresenceDetector работает в режиме эмуляции");
        Self {
            period,
            started: Instant::now(),
        }
    }

    fn reading_at(&self, now: Instant) -> bool {
        let period = self.period.as_millis().max(1);
        let elapsed = now.saturating_duration_since(self.started).as_millis();
        (elapsed / period) % 2 == 0
    }
}

#[async_trait]
impl PresenceDetector for DryRunDetector {
    async fn is_present(&self, keyboard: &KeyboardId) -> bool {
        let present = self.reading_at(Instant::now());
        info!("[DRY RUN] Клавиатура {} {}", keyboard, if present { "подключена" } else { "отключена" });
        present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_dry_run_alternates() {
        let detector = DryRunDetector::new(Duration::from_secs(30));
        let id = KeyboardId::parse("046d:c31c");

        assert!(detector.is_present(&id).await);
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(!detector.is_present(&id).await);
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(detector.is_present(&id).await);
    }
}
