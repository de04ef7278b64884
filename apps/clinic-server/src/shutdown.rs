use anyhow::Result;

/// Resolve when the process is asked to stop (SIGTERM / Ctrl+C).
pub async fn wait_for_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv()  => {},
            _ = tokio::signal::ctrl_c() => {},
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}

/// Future handed to `axum::serve(..).with_graceful_shutdown`.
pub async fn graceful() {
    if let Err(e) = wait_for_signal().await {
        tracing::warn!("shutdown: signal listener failed ({e}); falling back to ctrl_c()");
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("shutdown: signal received, draining connections");
}
