//! OS termination signal listener.
//!
//! SIGINT and SIGTERM are conflated into one "terminate" event; the listener
//! task is the only writer of the shutdown flag. Signal registration happens
//! before the task is spawned so a failure surfaces at startup rather than
//! leaving a loop that can never be stopped.

use lattice_core::Shutdown;
use tokio::task::JoinHandle;

/// Spawn the task that requests shutdown on SIGINT or SIGTERM.
#[cfg(unix)]
pub fn spawn_signal_listener(shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        tokio::select! {
            _ = interrupt.recv() => tracing::info!("Received SIGINT"),
            _ = terminate.recv() => tracing::info!("Received SIGTERM"),
        }
        shutdown.request();
    }))
}

/// Spawn the task that requests shutdown on Ctrl-C.
#[cfg(not(unix))]
pub fn spawn_signal_listener(shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        tracing::info!("Received Ctrl-C");
        shutdown.request();
    }))
}
