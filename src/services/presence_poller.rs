use crate::config::TimingConfig;
use crate::error::Result;
use crate::events::{ControlCommand, PresenceState, PresenceStatus};
use crate::services::device_detector::{KeyboardId, PresenceDetector};
use crate::services::input_switcher::{InputSwitcher, SwitchOutcome};
use crate::settings::Settings;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Конечный автомат присутствия клавиатуры с окном антидребезга.
///
/// Первое наблюдение фиксируется сразу. Изменение фиксируется только если
/// новое значение держалось всё окно `debounce`; возврат к прежнему значению
/// сбрасывает таймер.
#[derive(Debug)]
pub struct PresenceTracker {
    state: PresenceState,
    pending_since: Option<Instant>,
    debounce: Duration,
}

impl PresenceTracker {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: PresenceState::Unknown,
            pending_since: None,
            debounce,
        }
    }

    pub fn state(&self) -> PresenceState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    pub fn reset(&mut self) {
        self.state = PresenceState::Unknown;
        self.pending_since = None;
    }

    /// Возвращает `Some(connected)`, когда нужно переключить вход
    pub fn observe(&mut self, connected: bool, now: Instant) -> Option<bool> {
        match self.state.as_reading() {
            None => {
                self.commit(connected);
                Some(connected)
            }
            Some(tracked) if tracked == connected => {
                if self.pending_since.take().is_some() {
                    debug!("Кратковременное изменение состояния отброшено");
                }
                None
            }
            Some(_) => {
                let since = *self.pending_since.get_or_insert(now);
                if now.saturating_duration_since(since) >= self.debounce {
                    self.commit(connected);
                    Some(connected)
                } else {
                    None
                }
            }
        }
    }

    fn commit(&mut self, connected: bool) {
        self.state = PresenceState::from_reading(connected);
        self.pending_since = None;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollerTiming {
    pub startup_delay: Duration,
    pub poll_interval: Duration,
    pub debounce: Duration,
    pub debounce_sample: Duration,
}

impl From<&TimingConfig> for PollerTiming {
    fn from(timing: &TimingConfig) -> Self {
        Self {
            startup_delay: timing.startup_delay(),
            poll_interval: timing.poll_interval(),
            debounce: timing.debounce(),
            debounce_sample: timing.debounce_sample(),
        }
    }
}

/// Канал управления опрашивающей задачей: команды туда, состояние обратно
#[derive(Clone)]
pub struct PollerHandle {
    commands: mpsc::UnboundedSender<ControlCommand>,
    status: watch::Receiver<PresenceStatus>,
}

impl PollerHandle {
    /// `false`, если задача уже завершилась
    pub fn send(&self, command: ControlCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn status(&self) -> PresenceStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PresenceStatus> {
        self.status.clone()
    }
}

/// Фоновый цикл опроса. Единственный владелец состояния присутствия и флага
/// ручного переключения.
pub struct PresencePoller {
    settings: Settings,
    keyboard: KeyboardId,
    detector: Box<dyn PresenceDetector>,
    switcher: Box<dyn InputSwitcher>,
    tracker: PresenceTracker,
    manual_override: bool,
    last_input: Option<String>,
    timing: PollerTiming,
    commands: mpsc::UnboundedReceiver<ControlCommand>,
    status: watch::Sender<PresenceStatus>,
}

impl PresencePoller {
    pub fn new(
        settings: Settings,
        detector: Box<dyn PresenceDetector>,
        switcher: Box<dyn InputSwitcher>,
        timing: PollerTiming,
    ) -> (Self, PollerHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(PresenceStatus::default());

        let poller = Self {
            keyboard: KeyboardId::parse(&settings.keyboard_id),
            settings,
            detector,
            switcher,
            tracker: PresenceTracker::new(timing.debounce),
            manual_override: false,
            last_input: None,
            timing,
            commands: command_rx,
            status: status_tx,
        };

        let handle = PollerHandle {
            commands: command_tx,
            status: status_rx,
        };

        (poller, handle)
    }

    pub async fn run(mut self) -> Result<()> {
        info!(
            "PresencePoller запущен для клавиатуры {}, первый опрос через {} мс",
            self.keyboard,
            self.timing.startup_delay.as_millis()
        );

        let mut next_poll = Instant::now() + self.timing.startup_delay;

        loop {
            tokio::select! {
                _ = sleep_until(next_poll) => {
                    self.poll_once().await;
                    next_poll = Instant::now() + self.next_delay();
                }
                command = self.commands.recv() => match command {
                    Some(ControlCommand::Shutdown) | None => {
                        info!("PresencePoller получил сигнал остановки");
                        break;
                    }
                    Some(command) => self.handle_command(command).await,
                },
            }
        }

        Ok(())
    }

    fn next_delay(&self) -> Duration {
        if self.tracker.is_pending() {
            self.timing.debounce_sample
        } else {
            self.timing.poll_interval
        }
    }

    async fn poll_once(&mut self) {
        let connected = self.detector.is_present(&self.keyboard).await;
        let previous = self.tracker.state();

        let Some(connected) = self.tracker.observe(connected, Instant::now()) else {
            if self.tracker.is_pending() {
                debug!("Изменение состояния клавиатуры ожидает подтверждения");
            }
            return;
        };

        let input_code = self.settings.input_for(connected).to_string();
        if previous == PresenceState::Unknown {
            info!(
                "Начальное состояние клавиатуры: {} -> вход {}",
                self.tracker.state(),
                input_code
            );
        } else {
            info!(
                "Клавиатура {} -> {}, переключаемся на вход {}",
                previous,
                self.tracker.state(),
                input_code
            );
        }

        self.switch(input_code).await;
        self.publish();
    }

    async fn handle_command(&mut self, command: ControlCommand) {
        debug!("Получена команда: {}", command);

        match command {
            ControlCommand::ToggleManual => {
                // Отслеживаемое состояние не трогаем: следующее реальное
                // изменение клавиатуры снова переключит вход
                self.manual_override = !self.manual_override;
                let input_code = self.settings.input_for(self.manual_override).to_string();
                info!("Ручное переключение на вход {}", input_code);
                self.switch(input_code).await;
                self.publish();
            }
            ControlCommand::ReloadSettings(settings) => self.apply_settings(settings.with_defaults()),
            ControlCommand::TestSwitch(input_code) => {
                info!("Проверочное переключение на вход {}", input_code);
                self.switch(input_code).await;
                self.publish();
            }
            ControlCommand::Shutdown => {}
        }
    }

    fn apply_settings(&mut self, settings: Settings) {
        if settings == self.settings {
            info!("Настройки не изменились");
            return;
        }

        if settings.keyboard_id != self.settings.keyboard_id {
            self.keyboard = KeyboardId::parse(&settings.keyboard_id);
            self.tracker.reset();
            info!("Отслеживаемая клавиатура изменена на {}", self.keyboard);
        }

        self.settings = settings;
        info!(
            "Новые настройки применены: монитор {}, входы {}/{}",
            self.settings.monitor_bus, self.settings.input_connected, self.settings.input_disconnected
        );
        self.publish();
    }

    async fn switch(&mut self, input_code: String) {
        let outcome = self
            .switcher
            .switch_to(&self.settings.monitor_bus, &input_code)
            .await;

        report(&input_code, outcome);
        self.last_input = Some(input_code);
    }

    fn publish(&self) {
        self.status.send_replace(PresenceStatus {
            presence: self.tracker.state(),
            manual_override: self.manual_override,
            last_input: self.last_input.clone(),
        });
    }
}

fn report(input_code: &str, outcome: SwitchOutcome) {
    if outcome.succeeded {
        info!("Переключение на вход {}: {}", input_code, outcome);
    } else {
        warn!("Переключение на вход {}: {}", input_code, outcome);
    }
}
