//! Admin HTTP server runner.

use axum::Router;
use ephemeral_error::HttpError;
use std::future::IntoFuture;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

/// Resolves once shutdown has been requested or the sender is gone.
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    // A dropped sender means nobody can ask to keep running.
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Serves `router` on `listener` until shutdown is requested.
///
/// Once shutdown is requested the listener stops accepting and in-flight requests
/// get `grace` to finish; connections still open after that are dropped.
pub async fn serve_admin(
    listener: TcpListener,
    router: Router,
    shutdown: watch::Receiver<bool>,
    grace: Duration,
) -> Result<(), HttpError> {
    let addr = listener
        .local_addr()
        .map_err(|e| HttpError::new(format!("Admin listener has no address: {e}")))?;
    info!(%addr, "Admin server listening");

    let mut graceful = shutdown.clone();
    let mut server = axum::serve(listener, router)
        .with_graceful_shutdown(async move { wait_for_shutdown(&mut graceful).await })
        .into_future();

    let mut shutdown = shutdown;
    let result = tokio::select! {
        result = &mut server => result,
        _ = wait_for_shutdown(&mut shutdown) => {
            match tokio::time::timeout(grace, server).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(grace_secs = grace.as_secs(), "Admin server drain deadline elapsed");
                    Ok(())
                }
            }
        }
    };

    result.map_err(|e| HttpError::new(format!("Admin server failed: {e}")))?;
    info!("Admin server stopped");
    Ok(())
}
