use std::sync::Arc;
use std::time::Duration;

use time::UtcOffset;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::configs::{Settings, StateStore};
use crate::entities::NodeContext;
use crate::errors::{ControlError, TransportError};
use crate::models::Registry;
use crate::services::transport::{Inbound, MqttTransport};
use crate::services::{SnapshotService, SyncService};

pub mod configs;
pub mod entities;
pub mod errors;
pub mod models;
pub mod services;

const PUMP_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Runs the controller until a shutdown signal or a fatal transport error.
///
/// `offset` stamps the snapshots; it has to be read before the runtime spawns
/// its workers.
pub async fn run(settings: &Arc<Settings>, offset: UtcOffset) -> Result<(), ControlError> {
    let store = StateStore::load(&settings.state.path).with_offset(offset);
    let ctx = NodeContext::new(&settings.node);

    let (transport, event_loop) = MqttTransport::new(&settings.gateway, &ctx.availability_topic);
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let mut pump = tokio::spawn(MqttTransport::pump(event_loop, sender));

    let registry = Registry::new(ctx, &settings.windows);
    let mut sync = SyncService::new(registry, store.clone(), Arc::new(transport.clone()), settings.timing.clone());

    let snapshot = SnapshotService::new(store.clone(), Duration::from_secs(settings.state.flush_interval_secs)).spawn();

    let result = serve(&mut sync, &mut receiver, &mut pump).await;

    snapshot.abort();

    if result.is_err() {
        if let Err(e) = store.flush() {
            tracing::error!("Failed to flush states: {}", e);
        }
        return result;
    }

    sync.shutdown().await?;
    transport.disconnect().await?;

    if tokio::time::timeout(PUMP_SHUTDOWN_TIMEOUT, pump).await.is_err() {
        tracing::warn!("MQTT event loop did not finish in time");
    }

    Ok(())
}

/// Handles inbound messages one at a time until a shutdown signal arrives.
async fn serve(
    sync: &mut SyncService,
    receiver: &mut mpsc::UnboundedReceiver<Inbound>,
    pump: &mut JoinHandle<Result<(), TransportError>>,
) -> Result<(), ControlError> {
    sync.start().await?;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            inbound = receiver.recv() => match inbound {
                Some(inbound) => sync.handle(&inbound).await?,
                None => {
                    // The pump only drops its sender when it stops.
                    pump.await.unwrap_or(Err(TransportError::ChannelClosed))?;
                    return Err(TransportError::ChannelClosed.into());
                }
            },
            _ = &mut shutdown => {
                tracing::info!("shutting down");
                return Ok(());
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
