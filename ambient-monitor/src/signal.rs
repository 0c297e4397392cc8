//! Turns interrupt signals into cancellation

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Exit status of a run that ended on a signal
pub const INTERRUPTED: u8 = 130;

/// Cancel `cancel` on the first SIGINT/SIGTERM
///
/// The control loop notices the cancellation at its next await point and
/// shuts the strip down. A second signal while that is happening exits the
/// process immediately.
pub fn spawn_listener(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("interrupt received, shutting down");
        cancel.cancel();

        wait_for_signal().await;
        tracing::warn!("second interrupt, exiting without cleanup");
        std::process::exit(i32::from(INTERRUPTED));
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("cannot listen for SIGTERM: {e}");
            return ctrl_c().await;
        }
    };

    tokio::select! {
        _ = ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c().await
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("cannot listen for interrupts: {e}");
        // without a handler the loop runs until killed
        std::future::pending::<()>().await;
    }
}
