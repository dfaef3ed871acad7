use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod settings;
mod utils;

use config::Config;
use events::ControlCommand;
use services::settings_form::SettingsForm;
use services::front_end::FrontEnd;
use services::presence_poller::PollerHandle;
use services::{
    create_front_end,
    create_input_switcher,
    create_presence_detector,
    FrontEndContext,
    PollerTiming,
    PresencePoller,
    PromptForm,
};
use settings::SettingsStore;
use utils::{LineFormat, LockGuard, RotatingFile};

#[derive(Parser, Debug)]
#[command(name = "usb-monitor")]
#[command(about = "Переключает вход монитора при подключении и отключении USB-клавиатуры")]
struct Args {
    /// Путь к файлу конфигурации (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Путь к файлу пользовательских настроек (JSON)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Режим сухого запуска (без реальных переключений)
    #[arg(long)]
    dry_run: bool,

    /// Без иконки в трее, даже если она доступна
    #[arg(long)]
    headless: bool,

    /// Уровень логирования
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(path) = &args.settings {
        config.paths.settings_file = Some(path.clone());
    }
    config.validate()?;

    let log_file = match RotatingFile::open(
        config.log_path(),
        config.logging.max_file_bytes,
        config.logging.backups,
    ) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Не удалось открыть лог-файл {:?}: {}", config.log_path(), e);
            None
        }
    };

    // Инициализация системы логирования
    init_tracing(&config.logging.level, log_file)?;
    install_panic_hook();

    let Some(lock) = LockGuard::acquire(&config.lock_path())? else {
        println!("USB Monitor уже запущен, второй экземпляр не нужен");
        return Ok(());
    };

    // Обработчики сигналов - сразу после блокировки, чтобы файл блокировки
    // удалялся при прерывании на любом этапе
    let mut shutdown = utils::shutdown::listen()?;

    info!("Запуск USB Monitor v{}", env!("CARGO_PKG_VERSION"));
    debug!("Файл блокировки: {:?}", lock.path());

    let result = match utils::shutdown::until_requested(prepare(&args, &config), &mut shutdown).await {
        Some(Ok(services)) => serve(services, shutdown).await,
        Some(Err(e)) => Err(e),
        None => {
            info!("Завершение работы до запуска сервисов");
            drop(lock);
            // Незавершённое чтение stdin в форме не даст рантайму остановиться
            std::process::exit(0);
        }
    };

    match result {
        Ok(()) => {
            info!("USB Monitor завершил работу");
            Ok(())
        }
        Err(e) => {
            error!("Аварийное завершение: {:#}", e);
            Err(e)
        }
    }
}

/// Собранные, но ещё не запущенные сервисы
struct Services {
    poller: PresencePoller,
    handle: PollerHandle,
    front_end: Box<dyn FrontEnd>,
}

async fn prepare(args: &Args, config: &Config) -> Result<Services> {
    if args.dry_run {
        warn!("Режим сухого запуска - монитор переключаться не будет");
    }

    // Проверка прав доступа
    if let Err(e) = utils::permissions::check_permissions() {
        warn!("{}", e);
    }

    let capability = utils::capability::probe(args.headless).await;
    info!("Режим интерфейса: {:?}", capability);

    // Первый запуск: форма в терминале, если он есть
    let settings_store = Arc::new(SettingsStore::new(config.settings_path()));
    let form = (!settings_store.exists() && std::io::stdin().is_terminal())
        .then(|| PromptForm::new(create_input_switcher(config, args.dry_run)));
    let settings = settings_store
        .load_or_init(form.as_ref().map(|f| f as &dyn SettingsForm))
        .await?;
    info!(
        "Настройки: монитор {}, клавиатура {}, входы {}/{}",
        settings.monitor_bus, settings.keyboard_id, settings.input_connected, settings.input_disconnected
    );

    // Инициализация компонентов
    let detector = create_presence_detector(config, args.dry_run);
    let switcher = create_input_switcher(config, args.dry_run);
    let (poller, handle) = PresencePoller::new(
        settings,
        detector,
        switcher,
        PollerTiming::from(&config.timing),
    );
    let front_end = create_front_end(
        capability,
        FrontEndContext {
            poller: handle.clone(),
            settings_store,
            log_path: config.log_path(),
        },
    );

    info!("Все компоненты инициализированы");

    Ok(Services {
        poller,
        handle,
        front_end,
    })
}

async fn serve(services: Services, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let Services {
        poller,
        handle,
        front_end,
    } = services;

    // Запуск сервисов параллельно
    let mut poller_handle = tokio::spawn(poller.run());
    let front_end_handle = tokio::spawn(async move {
        if let Err(e) = front_end.run().await {
            error!("Ошибка в интерфейсе: {}", e);
        }
    });

    let poller_result = tokio::select! {
        result = &mut poller_handle => result,
        _ = utils::shutdown::requested(&mut shutdown) => {
            info!("Завершение работы...");
            handle.send(ControlCommand::Shutdown);
            poller_handle.await
        }
    };

    // Ожидаем завершения интерфейса (с таймаутом)
    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    match tokio::time::timeout(shutdown_timeout, front_end_handle).await {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении интерфейса"),
    }

    poller_result??;
    Ok(())
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        error!("Аварийное завершение: {}", panic_info);
        default_hook(panic_info);
    }));
}

fn init_tracing(level: &str, log_file: Option<RotatingFile>) -> Result<()> {
    use tracing_subscriber::util::SubscriberInitExt;

    build_subscriber(level, log_file)?.init();
    Ok(())
}

fn build_subscriber(
    level: &str,
    log_file: Option<RotatingFile>,
) -> Result<impl tracing::Subscriber + Send + Sync + 'static> {
    use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, EnvFilter, Layer};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    // В файл - только строки для человека, уровнем не ниже INFO
    let file_layer = log_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .event_format(LineFormat)
            .with_writer(file)
            .with_filter(LevelFilter::INFO)
    });

    // Фильтр уровня - только для консоли
    let console_layer = tracing_subscriber::fmt::layer().compact().with_filter(filter);

    Ok(tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_level_does_not_filter_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("switch_log.txt");
        let file = RotatingFile::open(&path, 1024 * 1024, 3).unwrap();

        let subscriber = build_subscriber("error", Some(file)).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            info!("Запуск DDC команды: ddcutil --bus 1 setvcp 60 15");
            debug!("не попадает в файл");
        });

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains(" - Запуск DDC команды: ddcutil --bus 1 setvcp 60 15"));
        assert!(!text.contains("не попадает в файл"));
    }
}
