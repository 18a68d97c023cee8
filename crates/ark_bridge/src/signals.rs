//! Signal handling for graceful bridge shutdown.
//!
//! The first SIGINT/SIGTERM (Ctrl+C on Windows) initiates the shared
//! [`ShutdownState`]; any signal after that exits the process immediately.

use bridge_event_system::ShutdownState;
use tokio::signal;
use tracing::{error, info, warn};

/// Resolves on the next termination signal.
///
/// * **Unix platforms**: SIGINT or SIGTERM
/// * **Windows**: Ctrl+C
pub async fn wait_for_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => (),
            _ = sigterm.recv() => ()
        }
    }

    #[cfg(windows)]
    signal::ctrl_c().await?;

    Ok(())
}

/// Waits for a termination signal and initiates `shutdown_state`.
///
/// Once the first signal is handled a background listener is installed that
/// terminates the process on the next one.
pub async fn handle_shutdown_signals(
    shutdown_state: &ShutdownState,
) -> Result<(), Box<dyn std::error::Error>> {
    wait_for_signal().await?;
    info!("📡 Received shutdown signal - initiating graceful shutdown");
    shutdown_state.initiate_shutdown();

    tokio::spawn(async {
        if let Err(e) = wait_for_signal().await {
            error!("Failed to set up forced shutdown signal handler: {e}");
            return;
        }
        warn!("Shutdown signal received again, exiting immediately");
        std::process::exit(1);
    });

    Ok(())
}
