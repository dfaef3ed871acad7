//! Process shutdown signals.
//!
//! Handlers are registered once, right after the single-instance lock is
//! taken, so SIGINT/SIGTERM never fall back to the default action while the
//! lock file exists.

use std::future::Future;
use std::io;
use tokio::sync::watch;
use tracing::{error, info};

/// Регистрирует обработчики SIGINT/SIGTERM (Ctrl+C на других платформах).
/// Значение в канале становится `true` при получении сигнала.
pub fn listen() -> io::Result<watch::Receiver<bool>> {
    let (tx, rx) = watch::channel(false);

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;

        tokio::spawn(async move {
            tokio::select! {
                _ = interrupt.recv() => info!("Получен сигнал завершения (Ctrl+C)"),
                _ = terminate.recv() => info!("Получен сигнал завершения (SIGTERM)"),
            }
            tx.send_replace(true);
        });
    }

    #[cfg(not(unix))]
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Получен сигнал завершения (Ctrl+C)");
                tx.send_replace(true);
            }
            Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
        }
    });

    Ok(rx)
}

/// Ждёт сигнала завершения. Закрытый канал без сигнала - ждём бесконечно.
pub async fn requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        error!("Обработчик сигналов завершения остановлен");
        std::future::pending::<()>().await;
    }
}

/// `None`, если сигнал пришёл раньше, чем завершилась `work`
pub async fn until_requested<F: Future>(work: F, shutdown: &mut watch::Receiver<bool>) -> Option<F::Output> {
    tokio::select! {
        output = work => Some(output),
        _ = requested(shutdown) => None,
    }
}
