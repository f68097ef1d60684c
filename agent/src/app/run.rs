//! Server run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinError;
use tracing::{error, info};

use crate::app::options::ServerOptions;
use crate::app::pipeline::Deployer;
use crate::errors::PagesmithError;
use crate::server::serve::serve;
use crate::server::state::ServerState;

/// Serve deployment requests until `shutdown_signal` resolves or the server
/// stops on its own
pub async fn run(
    options: ServerOptions,
    deployer: Arc<dyn Deployer>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), PagesmithError> {
    info!("Initializing pagesmith server...");

    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
    let state = Arc::new(ServerState::new(deployer));

    let mut server_handle = serve(&options, state, async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    tokio::select! {
        _ = shutdown_signal => {
            info!("Shutdown signal received, shutting down...");
            let _ = shutdown_tx.send(());
        }
        result = &mut server_handle => {
            let result = flatten(result);
            match &result {
                Ok(()) => info!("HTTP server stopped"),
                Err(e) => error!("HTTP server stopped unexpectedly: {}", e),
            }
            return result;
        }
    }

    flatten(server_handle.await)
}

fn flatten(result: Result<Result<(), PagesmithError>, JoinError>) -> Result<(), PagesmithError> {
    match result {
        Ok(inner) => inner,
        Err(e) => Err(PagesmithError::ServerError(e.to_string())),
    }
}
