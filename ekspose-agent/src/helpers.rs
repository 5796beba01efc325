use log::{info, warn};
use tokio::sync::watch;

/// Resolves on SIGINT, or SIGTERM on unix.
pub async fn termination_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!("Couldn't listen for SIGINT! {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!("Couldn't listen for SIGTERM! {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT!"),
        _ = terminate => info!("Received SIGTERM!"),
    }
}

/// Flips the shutdown flag once the process is asked to terminate.
pub async fn shutdown_on_signal(shutdown: watch::Sender<bool>) {
    termination_signal().await;

    info!("Shutting down...");
    shutdown.send_replace(true);
}
