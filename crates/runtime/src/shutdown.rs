// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Graceful shutdown: signal -> stop accepting -> drain.

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Wait for SIGINT or SIGTERM, then cancel the worker's token.
///
/// The dispatch loop stops admitting new messages and drains in-flight
/// handlers within the configured grace period; whatever exceeds it is left
/// unacked for the bus to redeliver.
pub async fn wait_for_shutdown(cancel: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut term = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            Ok(term) => term,
            Err(err) => {
                tracing::warn!(error = %err, "SIGTERM hook unavailable, falling back to ctrl-c only");
                let _ = ctrl_c.await;
                info!("interrupt received, shutting down");
                cancel.cancel();
                return;
            }
        };
        tokio::select! {
            _ = ctrl_c => info!("interrupt received, shutting down"),
            _ = term.recv() => info!("terminate received, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        info!("interrupt received, shutting down");
    }

    cancel.cancel();
}
